pub mod message;
pub mod tx;
pub mod typed_data;
