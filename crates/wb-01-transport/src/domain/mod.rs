pub mod inflight;
pub mod message;
