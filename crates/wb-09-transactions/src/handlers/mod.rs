mod update;

pub use update::UpdateTransactionHandler;
