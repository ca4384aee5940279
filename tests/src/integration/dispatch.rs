//! Routing, the permission gate and immediate answers.

#[cfg(test)]
mod tests {
    use crate::harness::{call, network, registries, Harness, DAPP_DOMAIN, DAPP_URL, FUJI};
    use serde_json::json;
    use shared_types::{codes, AccountKind, Request};
    use std::sync::Arc;
    use wb_02_dispatch::{HandlerRegistry, RegistryError};
    use wb_05_network::ChainIdHandler;
    use wb_06_accounts::AccountsApi;

    const ADDRESS: &str = "0x2222222222222222222222222222222222222222";

    #[tokio::test]
    async fn test_sign_without_wallet_is_refused_before_any_window() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant(DAPP_DOMAIN, ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);

        let sign = Request::new(1, "personal_sign").with_params(json!(["0x68656c6c6f", ADDRESS]));
        let answer = call(&mut dapp, sign).await;
        assert_eq!(answer["error"], json!("wallet undefined"));
        assert!(h.windows.opened().is_empty());
        assert!(h.actions.pending_actions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_from_unconnected_site() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);

        let sign = Request::new(1, "personal_sign").with_params(json!(["0x68656c6c6f", ADDRESS]));
        let answer = call(&mut dapp, sign).await;
        assert_eq!(answer["error"], json!("account not available"));
    }

    #[tokio::test]
    async fn test_account_select() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        let second = h
            .accounts
            .add_account("Imported", "0x3333333333333333333333333333333333333333", AccountKind::Imported)
            .await
            .unwrap();
        let mut extension = h.extension();

        let selected = call(
            &mut extension,
            Request::new(1, "account_select").with_params(json!([second.id])),
        )
        .await;
        assert_eq!(selected["result"], json!("success"));
        assert_eq!(h.accounts.active_account().await.unwrap().unwrap().id, second.id);

        let missing = call(
            &mut extension,
            Request::new(2, "account_select").with_params(json!(["missing"])),
        )
        .await;
        assert_eq!(missing["error"], json!("Error: account not found: missing"));
    }

    #[tokio::test]
    async fn test_gate_follows_permissions() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);

        let before = call(&mut dapp, Request::new(1, "eth_accounts")).await;
        assert_eq!(before["result"], json!([]));

        h.grant(DAPP_DOMAIN, ADDRESS).await;
        let after = call(&mut dapp, Request::new(2, "eth_accounts")).await;
        assert_eq!(after["result"], json!([ADDRESS]));

        // Revoking from the extension closes the gate again.
        let mut extension = h.extension();
        let revoked = call(
            &mut extension,
            Request::new(3, "permissions_revokeDomainAccess").with_params(json!([DAPP_DOMAIN])),
        )
        .await;
        assert!(revoked.get("error").is_none(), "{revoked}");
        let closed = call(&mut dapp, Request::new(4, "eth_accounts")).await;
        assert_eq!(closed["result"], json!([]));

        // Signing needs a connected site.
        let refused = call(&mut dapp, Request::new(5, "personal_sign").with_params(json!(["0x00", ADDRESS]))).await;
        assert_eq!(refused["error"], json!("account not available"));
    }

    #[tokio::test]
    async fn test_page_claimed_site_is_replaced() {
        let h = Harness::new();
        h.add_account(ADDRESS).await;
        h.grant("bank.example", ADDRESS).await;
        let mut dapp = h.dapp(DAPP_URL);

        let spoofed = Request::new(1, "eth_accounts").with_site(shared_types::Site {
            domain: "bank.example".into(),
            ..Default::default()
        });
        let answer = call(&mut dapp, spoofed).await;
        assert_eq!(answer["result"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let h = Harness::new();
        let mut extension = h.extension();
        let answer = call(&mut extension, Request::new(1, "eth_mine")).await;
        assert_eq!(answer["error"]["code"], json!(codes::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_chain_id_is_answered_on_both_paths() {
        let h = Harness::new();
        let mut dapp = h.dapp(DAPP_URL);
        let mut extension = h.extension();

        let from_dapp = call(&mut dapp, Request::new(1, "eth_chainId")).await;
        let from_extension = call(&mut extension, Request::new(2, "eth_chainId")).await;
        assert_eq!(from_dapp["result"], json!("0xa86a"));
        assert_eq!(from_dapp["result"], from_extension["result"]);
    }

    #[tokio::test]
    async fn test_networks_state_lists_supported_chains() {
        let h = Harness::new();
        let mut extension = h.extension();
        let answer = call(&mut extension, Request::new(1, "networks_getNetworksState")).await;
        assert!(answer.get("error").is_none(), "{answer}");
        let rendered = answer["result"].to_string();
        assert!(rendered.contains(&network(FUJI, "Avalanche Fuji", true).chain_name));
    }

    #[tokio::test]
    async fn test_duplicate_method_is_rejected_at_build() {
        let h = Harness::new();
        let duplicate = HandlerRegistry::builder()
            .register(Arc::new(ChainIdHandler::new(h.networks.clone())))
            .and_then(|builder| builder.register(Arc::new(ChainIdHandler::new(h.networks.clone()))));
        assert_eq!(
            duplicate.err(),
            Some(RegistryError::DuplicateMethod("eth_chainId".into()))
        );

        // The wiring shared with the runtime has no collisions.
        assert!(registries(&h.actions, &h.accounts, &h.permissions, &h.networks, &h.wallet, &h.transactions).is_ok());
    }
}
