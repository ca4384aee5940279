//! The runtime container: real adapters, background forwarding and restarts.

#[cfg(test)]
mod tests {
    use crate::harness::{call, DAPP_DOMAIN, DAPP_URL};
    use serde_json::json;
    use shared_types::{AccountKind, InMemoryStore, Request, DEFERRED_RESPONSE};
    use std::sync::Arc;
    use std::time::Duration;
    use wb_01_transport::{ConnectionEvent, InMemoryPort, SenderInfo};
    use wb_06_accounts::AccountsApi;
    use wb_runtime::adapters::JsonFileStore;
    use wb_runtime::{RuntimeConfig, ServiceContainer};

    const ADDRESS: &str = "0x4444444444444444444444444444444444444444";

    fn port(container: &ServiceContainer, name: &str, sender: SenderInfo) -> InMemoryPort {
        InMemoryPort::connect(
            container.connections.clone(),
            name,
            sender,
            container.pipeline.clone(),
            container.transport_config(),
        )
        .unwrap()
    }

    async fn event_named(port: &mut InMemoryPort, name: &str) -> ConnectionEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = port.next_event().await.expect("connection open");
                if event.name == name {
                    return event;
                }
            }
        })
        .await
        .expect("event within 5s")
    }

    fn fuji_switch() -> Request {
        Request::new(1, "wallet_addEthereumChain").with_params(json!([{
            "chainId": "0xa869",
            "chainName": "Avalanche Fuji",
            "nativeCurrency": { "name": "Avalanche", "symbol": "AVAX", "decimals": 18 },
            "rpcUrls": ["https://api.avax-test.network/ext/bc/C/rpc"],
        }]))
    }

    #[tokio::test]
    async fn test_approval_request_reaches_the_extension() {
        let container =
            ServiceContainer::with_store(RuntimeConfig::default(), Arc::new(InMemoryStore::new())).unwrap();
        let tasks = container.start().await.unwrap();
        container
            .accounts
            .add_account("Account 1", ADDRESS, AccountKind::Primary)
            .await
            .unwrap();
        container.permissions.grant(DAPP_DOMAIN, ADDRESS).await.unwrap();

        let mut extension = port(&container, "extension", SenderInfo::default());
        let mut dapp = port(&container, "provider", SenderInfo::new(Some(3), Some(DAPP_URL.into())));

        let ack = call(&mut dapp, fuji_switch()).await;
        assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));

        let requested = event_named(&mut extension, "approval_requested").await;
        assert_eq!(requested.value["view"], json!("network/switch"));
        assert_eq!(requested.value["windowId"], json!(1));
        let pending = container.actions.pending_actions().await.unwrap();
        assert_eq!(pending.len(), 1);

        // The approval window goes away without a decision.
        assert!(container.windows.closed(shared_types::WindowId(1)));
        assert!(container
            .actions
            .on_window_closed(shared_types::WindowId(1))
            .await
            .unwrap());
        let answer = crate::harness::next(&mut dapp).await;
        assert_eq!(answer["error"]["code"], json!(shared_types::codes::USER_REJECTED));

        for task in tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_approval_without_host_fails_cleanly() {
        // Nothing started, so no one receives approval requests.
        let container =
            ServiceContainer::with_store(RuntimeConfig::default(), Arc::new(InMemoryStore::new())).unwrap();
        container
            .accounts
            .add_account("Account 1", ADDRESS, AccountKind::Primary)
            .await
            .unwrap();
        container.permissions.grant(DAPP_DOMAIN, ADDRESS).await.unwrap();
        container.networks.init().await.unwrap();
        let mut dapp = port(&container, "provider", SenderInfo::new(Some(3), Some(DAPP_URL.into())));

        let answer = call(&mut dapp, fuji_switch()).await;
        assert!(answer.get("error").is_some(), "{answer}");
        assert_ne!(answer["result"], json!(DEFERRED_RESPONSE));
        assert!(container.actions.pending_actions().await.unwrap().is_empty());
        assert!(!container.windows.is_open(shared_types::WindowId(1)));
    }

    #[tokio::test]
    async fn test_dapp_sees_chain_change() {
        let container =
            ServiceContainer::with_store(RuntimeConfig::default(), Arc::new(InMemoryStore::new())).unwrap();
        let tasks = container.start().await.unwrap();
        container
            .accounts
            .add_account("Account 1", ADDRESS, AccountKind::Primary)
            .await
            .unwrap();
        container.permissions.grant(DAPP_DOMAIN, ADDRESS).await.unwrap();
        let mut dapp = port(&container, "provider", SenderInfo::new(Some(3), Some(DAPP_URL.into())));

        container.networks.set_network(43113).await.unwrap();
        let changed = event_named(&mut dapp, "chainChanged").await;
        assert_eq!(changed.value["chainId"], json!("0xa869"));

        for task in tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RuntimeConfig::default();
        config.storage.data_file = dir.path().join("wallet.json");

        {
            let container = ServiceContainer::new(config.clone()).unwrap();
            let tasks = container.start().await.unwrap();
            container
                .accounts
                .add_account("Account 1", ADDRESS, AccountKind::Primary)
                .await
                .unwrap();
            container.permissions.grant(DAPP_DOMAIN, ADDRESS).await.unwrap();
            container.networks.set_network(43113).await.unwrap();

            let mut dapp = port(&container, "provider", SenderInfo::new(Some(3), Some(DAPP_URL.into())));
            let ack = call(&mut dapp, fuji_switch()).await;
            // Fuji is already active, nothing to approve.
            assert!(ack["result"].is_null());
            let back = Request::new(3, "wallet_addEthereumChain").with_params(json!([{
                "chainId": "0xa86a",
                "chainName": "Avalanche C-Chain",
                "nativeCurrency": { "name": "Avalanche", "symbol": "AVAX", "decimals": 18 },
                "rpcUrls": ["https://api.avax.network/ext/bc/C/rpc"],
            }]));
            let ack = call(&mut dapp, back).await;
            assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));
            assert_eq!(container.actions.pending_actions().await.unwrap().len(), 1);
            let ack = call(
                &mut dapp,
                Request::new(2, "personal_sign").with_params(json!(["0x00", ADDRESS])),
            )
            .await;
            // No signer configured.
            assert_eq!(ack["error"], json!("wallet undefined"));
            tasks.into_iter().for_each(|task| task.abort());
        }

        let restarted = ServiceContainer::with_store(
            config.clone(),
            Arc::new(JsonFileStore::new(config.storage.data_file.clone())),
        )
        .unwrap();
        restarted.start().await.unwrap().into_iter().for_each(|task| task.abort());

        let accounts = restarted.accounts.get_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address_c, ADDRESS);
        assert!(restarted
            .permissions
            .has_domain_permission_for_account(DAPP_DOMAIN, ADDRESS)
            .await
            .unwrap());
        assert_eq!(restarted.networks.active_network().await.unwrap().unwrap().chain_id, 43113);
        assert!(restarted.actions.pending_actions().await.unwrap().is_empty());
    }
}
