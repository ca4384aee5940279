use crate::error::AccountsResult;
use async_trait::async_trait;
use shared_types::{Account, AccountKind};

/// Inbound port of the account store, as used by the handlers.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn get_accounts(&self) -> AccountsResult<Vec<Account>>;

    async fn active_account(&self) -> AccountsResult<Option<Account>>;

    async fn activate_account(&self, id: &str) -> AccountsResult<Account>;

    async fn add_account(
        &self,
        name: &str,
        address_c: &str,
        kind: AccountKind,
    ) -> AccountsResult<Account>;
}
