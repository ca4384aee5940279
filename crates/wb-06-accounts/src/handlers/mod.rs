mod get_accounts;
mod select;

pub use get_accounts::GetAccountsHandler;
pub use select::SelectAccountHandler;
