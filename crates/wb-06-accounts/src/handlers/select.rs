use crate::ports::AccountsApi;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::RpcError;
use std::sync::Arc;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `account_select`, params `[accountId]`.
pub struct SelectAccountHandler {
    accounts: Arc<dyn AccountsApi>,
}

impl SelectAccountHandler {
    pub fn new(accounts: Arc<dyn AccountsApi>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl RequestHandler for SelectAccountHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["account_select"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let id = ctx
            .param(0)
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("Missing account id"))?;
        self.accounts.activate_account(id).await?;
        Ok(HandlerOutcome::Result(json!("success")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccountsError, AccountsResult};
    use shared_types::{Account, AccountKind, ConnectionId, Request};
    use std::sync::Mutex;
    use wb_01_transport::ConnectionKind;

    /// Records activations; fails them when `fail` is set.
    #[derive(Default)]
    struct MockAccounts {
        activated: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AccountsApi for MockAccounts {
        async fn get_accounts(&self) -> AccountsResult<Vec<Account>> {
            Ok(Vec::new())
        }

        async fn active_account(&self) -> AccountsResult<Option<Account>> {
            Ok(None)
        }

        async fn activate_account(&self, id: &str) -> AccountsResult<Account> {
            if self.fail {
                return Err(AccountsError::NotFound(id.to_string()));
            }
            self.activated.lock().unwrap().push(id.to_string());
            Ok(Account {
                id: id.to_string(),
                name: "Main".into(),
                address_c: "0xabc".into(),
                kind: AccountKind::Primary,
            })
        }

        async fn add_account(&self, _: &str, _: &str, _: AccountKind) -> AccountsResult<Account> {
            unimplemented!("not used by account_select")
        }
    }

    fn ctx() -> RequestContext {
        let request = Request::new("123", "account_select").with_params(json!(["uuid"]));
        RequestContext::new(request, ConnectionId(1), ConnectionKind::Extension)
    }

    #[tokio::test]
    async fn test_select_success() {
        let accounts = Arc::new(MockAccounts::default());
        let handler = SelectAccountHandler::new(accounts.clone());

        let outcome = handler.handle_authenticated(&ctx()).await.unwrap();
        assert_eq!(outcome, HandlerOutcome::Result(json!("success")));
        assert_eq!(*accounts.activated.lock().unwrap(), ["uuid"]);
    }

    #[tokio::test]
    async fn test_select_failure_is_stringified() {
        let handler = SelectAccountHandler::new(Arc::new(MockAccounts {
            fail: true,
            ..Default::default()
        }));

        let err = handler.handle_authenticated(&ctx()).await.unwrap_err();
        assert_eq!(serde_json::to_value(&err).unwrap(), json!("Error: account not found: uuid"));
    }
}
