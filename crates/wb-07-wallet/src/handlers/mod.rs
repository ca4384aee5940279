mod sign;

pub use sign::SignMessageHandler;
