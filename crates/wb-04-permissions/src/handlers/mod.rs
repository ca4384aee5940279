mod accounts;
mod admin;
mod metadata;
mod request_accounts;

pub use accounts::AccountsHandler;
pub use admin::{GetAllPermissionsHandler, RevokeDomainAccessHandler};
pub use metadata::SendDomainMetadataHandler;
pub use request_accounts::RequestAccountsHandler;
