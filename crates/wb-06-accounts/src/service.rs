//! Account store.

use crate::error::{AccountsError, AccountsResult};
use crate::ports::AccountsApi;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{EventPublisher, WalletEvent};
use shared_types::{keys, Account, AccountKind, StorageService};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wb_04_permissions::ActiveAccountProvider;

/// Persisted form of the account list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsState {
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Id of the active account.
    #[serde(default)]
    pub active: Option<String>,
}

impl AccountsState {
    pub fn active_account(&self) -> Option<&Account> {
        let id = self.active.as_deref()?;
        self.accounts.iter().find(|account| account.id == id)
    }
}

pub struct AccountsService {
    storage: StorageService,
    events: Arc<dyn EventPublisher>,
    cache: RwLock<Option<AccountsState>>,
    write_gate: tokio::sync::Mutex<()>,
}

impl AccountsService {
    pub fn new(storage: StorageService, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            storage,
            events,
            cache: RwLock::new(None),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn state(&self) -> AccountsResult<AccountsState> {
        if let Some(state) = self.cache.read().as_ref() {
            return Ok(state.clone());
        }
        let stored: AccountsState = self
            .storage
            .load(keys::ACCOUNTS)
            .await?
            .unwrap_or_default();
        debug!(accounts = stored.accounts.len(), "Loaded accounts");
        let mut cache = self.cache.write();
        Ok(cache.get_or_insert(stored).clone())
    }

    async fn update<R, F>(&self, f: F) -> AccountsResult<R>
    where
        R: Send,
        F: FnOnce(&mut AccountsState) -> AccountsResult<R> + Send,
    {
        let _gate = self.write_gate.lock().await;
        let mut state = self.state().await?;
        let out = f(&mut state)?;
        self.storage.save(keys::ACCOUNTS, &state).await?;
        *self.cache.write() = Some(state.clone());

        let active = state.active_account().cloned();
        self.events
            .publish(WalletEvent::AccountsUpdated {
                accounts: state.accounts,
                active,
            })
            .await;
        Ok(out)
    }
}

#[async_trait]
impl AccountsApi for AccountsService {
    async fn get_accounts(&self) -> AccountsResult<Vec<Account>> {
        Ok(self.state().await?.accounts)
    }

    async fn active_account(&self) -> AccountsResult<Option<Account>> {
        Ok(self.state().await?.active_account().cloned())
    }

    async fn activate_account(&self, id: &str) -> AccountsResult<Account> {
        let account = self
            .update(|state| {
                let account = state
                    .accounts
                    .iter()
                    .find(|account| account.id == id)
                    .cloned()
                    .ok_or_else(|| AccountsError::NotFound(id.to_string()))?;
                state.active = Some(account.id.clone());
                Ok(account)
            })
            .await?;
        info!(account_id = %account.id, address = %account.address_c, "Active account changed");
        Ok(account)
    }

    /// The first account added becomes active.
    async fn add_account(
        &self,
        name: &str,
        address_c: &str,
        kind: AccountKind,
    ) -> AccountsResult<Account> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address_c: address_c.to_string(),
            kind,
        };
        let added = account.clone();
        self.update(move |state| {
            if state
                .accounts
                .iter()
                .any(|a| a.address_c.eq_ignore_ascii_case(&account.address_c))
            {
                return Err(AccountsError::Duplicate(account.address_c));
            }
            if state.active.is_none() {
                state.active = Some(account.id.clone());
            }
            state.accounts.push(account);
            Ok(())
        })
        .await?;
        info!(account_id = %added.id, kind = ?added.kind, "Account added");
        Ok(added)
    }
}

#[async_trait]
impl ActiveAccountProvider for AccountsService {
    async fn active_address(&self) -> Option<String> {
        match self.active_account().await {
            Ok(account) => account.map(|account| account.address_c),
            Err(e) => {
                warn!(error = %e, "Active account lookup failed");
                None
            }
        }
    }
}
