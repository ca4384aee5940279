//! # Shared Types Crate
//!
//! Types that cross every boundary of the wallet background process: the
//! JSON-RPC envelope exchanged with the extension UI and with dApp pages,
//! the entities persisted by the services, and the storage port.
//!
//! ## Design Principles
//!
//! - **Wire compatibility**: `Request` preserves unknown top-level fields and
//!   `Response` echoes them back, so callers can correlate on anything they sent.
//! - **One terminal answer**: `ResponseBody` separates the deferred
//!   acknowledgement from the final `Result`, and only the latter can carry an
//!   error.
//! - **Storage behind a port**: services persist through `StorageService`,
//!   never through a concrete backend.

pub mod entities;
pub mod errors;
pub mod rpc;
pub mod storage;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use rpc::*;
pub use storage::{keys, InMemoryStore, KeyValueStore, StorageService};
pub use time::{SystemTimeSource, TimeSource};
