use crate::ports::AccountsApi;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `account_getAccounts`: the account list and the active account.
pub struct GetAccountsHandler {
    accounts: Arc<dyn AccountsApi>,
}

impl GetAccountsHandler {
    pub fn new(accounts: Arc<dyn AccountsApi>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl RequestHandler for GetAccountsHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["account_getAccounts"]
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let accounts = self.accounts.get_accounts().await?;
        let active = self.accounts.active_account().await?;
        Ok(HandlerOutcome::Result(json!({
            "accounts": accounts,
            "active": active,
        })))
    }
}
