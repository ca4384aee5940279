//! Deferred requests resolved through the approval surface.
//!
//! ```text
//! dApp ──request──▶ handler ──add_action──▶ window opened
//!  ◀── DEFERRED_RESPONSE
//! extension ──action_updateStatus──▶ on_action_approved ──▶ dApp gets the answer
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{call, next, Harness, DAPP_DOMAIN, DAPP_URL, FUJI};
    use serde_json::{json, Value};
    use shared_types::{codes, keys, ActionId, ActionStatus, Network, Request, DEFERRED_RESPONSE};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::collections::BTreeMap;
    use wb_03_actions::ActionStats;
    use wb_07_wallet::{MessageType, WalletType};

    const ADDRESS: &str = "0x1111111111111111111111111111111111111111";

    fn pending_action(h: &Harness) -> (ActionId, String, shared_types::WindowId) {
        h.windows.last_opened().expect("approval window opened")
    }

    fn decide(id: ActionId, status: &str) -> Request {
        Request::new(100, "action_updateStatus").with_params(json!([{ "id": id, "status": status }]))
    }

    fn add_chain(chain_id: &str, rpc: &str) -> Request {
        Request::new(1, "wallet_addEthereumChain").with_params(json!([{
            "chainId": chain_id,
            "chainName": "Ethereum",
            "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
            "rpcUrls": [rpc],
        }]))
    }

    #[tokio::test]
    async fn test_add_chain_approved_end_to_end() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);
        let mut extension = h.extension();

        let ack = call(&mut dapp, add_chain("0x1", "https://rpc.example/1")).await;
        assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));
        let (id, view, _) = pending_action(&h);
        assert_eq!(view, "networks/add-popup");

        let decided = call(&mut extension, decide(id, "submitting")).await;
        assert_eq!(decided["result"], json!(true));

        let answer = next(&mut dapp).await;
        assert_eq!(answer["id"], json!(1));
        assert_eq!(answer["result"], Value::Null);
        assert!(answer.get("error").is_none());

        let active = h.networks.active_network().await.unwrap().unwrap();
        assert_eq!(active.chain_id, 1);
        let persisted: BTreeMap<String, Network> =
            serde_json::from_value(h.store.snapshot(keys::CUSTOM_NETWORKS).expect("custom networks saved")).unwrap();
        assert!(persisted.contains_key("1"));
        assert!(h.actions.get_action(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_window_close_rejects_with_user_rejected() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);

        let ack = call(&mut dapp, add_chain("0xa869", "https://rpc.example/43113")).await;
        assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));
        let (id, view, window) = pending_action(&h);
        assert_eq!(view, "network/switch");

        assert!(h.windows.close(window));
        assert!(h.actions.on_window_closed(window).await.unwrap());

        let answer = next(&mut dapp).await;
        assert_eq!(answer["error"]["code"], json!(codes::USER_REJECTED));
        assert_ne!(h.networks.active_network().await.unwrap().unwrap().chain_id, FUJI);
        assert!(h.actions.get_action(&id).await.unwrap().is_none());
        assert_eq!(ActionStats::get(&h.actions.stats().rejected), 1);

        // A second close finds nothing to reject.
        assert!(!h.actions.on_window_closed(window).await.unwrap());
    }

    #[tokio::test]
    async fn test_decision_outlives_the_approval_connection() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        h.wallet.set_type(Some(WalletType::Mnemonic));
        let mut dapp = h.dapp(DAPP_URL);
        let extension = h.extension();

        call(&mut dapp, Request::new(9, "personal_sign").with_params(json!(["0x00", ADDRESS]))).await;
        let (id, _, _) = pending_action(&h);

        // The popup submits and disappears while the signature is in flight.
        h.wallet.hold_signing.store(true, Ordering::SeqCst);
        extension.send(&decide(id, "submitting")).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let action = h.actions.get_action(&id).await.unwrap();
                if action.map(|action| action.status) == Some(ActionStatus::Approved) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("decision recorded");
        extension.close().await;
        h.wallet.release.notify_one();

        let answer = next(&mut dapp).await;
        assert_eq!(answer["id"], json!(9));
        assert_eq!(answer["result"], json!("0xsigned"));
        assert!(h.actions.pending_actions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_decision_is_refused() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);
        let mut extension = h.extension();

        call(&mut dapp, add_chain("0xa869", "https://rpc.example/43113")).await;
        let (id, _, _) = pending_action(&h);

        let first = call(&mut extension, decide(id, "error")).await;
        assert_eq!(first["result"], json!(true));
        let rejected = next(&mut dapp).await;
        assert_eq!(rejected["error"]["code"], json!(codes::USER_REJECTED));

        let second = call(&mut extension, decide(id, "submitting")).await;
        assert_eq!(second["error"]["code"], json!(codes::INVALID_REQUEST));
        assert_eq!(ActionStats::get(&h.actions.stats().approved), 0);
    }

    #[tokio::test]
    async fn test_connect_request_grants_on_approval() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);
        let mut extension = h.extension();

        let ack = call(&mut dapp, Request::new(5, "eth_requestAccounts")).await;
        assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));
        let (id, view, _) = pending_action(&h);
        assert_eq!(view, "permissions");

        call(&mut extension, decide(id, "submitting")).await;
        let answer = next(&mut dapp).await;
        assert_eq!(answer["result"], json!([ADDRESS]));
        assert!(h
            .permissions
            .has_domain_permission_for_account(DAPP_DOMAIN, ADDRESS)
            .await
            .unwrap());

        // Connected now: answered directly.
        let again = call(&mut dapp, Request::new(6, "eth_requestAccounts")).await;
        assert_eq!(again["result"], json!([ADDRESS]));
    }

    #[tokio::test]
    async fn test_sign_approved_returns_signature() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        h.wallet.set_type(Some(WalletType::Mnemonic));
        let mut dapp = h.dapp(DAPP_URL);
        let mut extension = h.extension();

        let sign = Request::new(9, "personal_sign").with_params(json!(["0x68656c6c6f", ADDRESS]));
        let ack = call(&mut dapp, sign).await;
        assert_eq!(ack["result"], json!(DEFERRED_RESPONSE));
        let (id, view, _) = pending_action(&h);
        assert_eq!(view, "sign");

        call(&mut extension, decide(id, "submitting")).await;
        let answer = next(&mut dapp).await;
        assert_eq!(answer["result"], json!("0xsigned"));

        let signed = h.wallet.signed.lock().clone();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].0, MessageType::PersonalSign);
        assert_eq!(signed[0].1["messageParams"]["from"], json!(ADDRESS));
    }
}
