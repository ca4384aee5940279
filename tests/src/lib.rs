//! # Wallet Background Test Suite
//!
//! Cross-crate flows driven over the in-memory transport.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Services wired with stub signer and RPC probe
//! └── integration/
//!     ├── dispatch.rs   # Routing, permission gate, registry startup
//!     ├── approvals.rs  # Deferred requests and the approval lifecycle
//!     └── runtime.rs    # The runtime container, forwarding and file storage
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wb-tests
//! cargo test -p wb-tests integration::approvals::
//! ```

pub mod harness;
pub mod integration;
