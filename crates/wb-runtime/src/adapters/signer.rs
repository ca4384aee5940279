//! # Remote Signer Adapter
//!
//! [`WalletService`] backed by a signer process that holds the keys.
//!
//! ## Endpoints
//!
//! - `GET  {url}/wallet` → `{ walletType, addressC }` (`walletType` null when locked)
//! - `POST {url}/sign` with `{ type, action }` → `{ signature }`
//! - `POST {url}/transactions` with a `CustomTx` → `{ txHash }`
//!
//! Failures come back as `{ error }` with a non-2xx status.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::Action;
use tracing::{debug, warn};
use url::Url;
use wb_07_wallet::{CustomTx, MessageType, WalletError, WalletResult, WalletService, WalletType};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletInfo {
    wallet_type: Option<WalletType>,
    #[serde(rename = "addressC")]
    address_c: Option<String>,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    #[serde(rename = "type")]
    kind: MessageType,
    action: &'a Action,
}

#[derive(Deserialize)]
struct SignReply {
    signature: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendReply {
    tx_hash: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

pub struct RemoteSigner {
    http: reqwest::Client,
    base: Option<Url>,
}

impl RemoteSigner {
    /// `None` behaves as a wallet that is not loaded.
    pub fn new(http: reqwest::Client, base: Option<Url>) -> Self {
        Self { http, base }
    }

    fn endpoint(&self, path: &str) -> WalletResult<Url> {
        let base = self.base.as_ref().ok_or(WalletError::Undefined)?;
        base.join(path)
            .map_err(|e| WalletError::Signer(format!("invalid signer url: {e}")))
    }

    async fn info(&self) -> WalletInfo {
        let Ok(url) = self.endpoint("wallet") else {
            return WalletInfo::default();
        };
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Signer unreachable");
                return WalletInfo::default();
            }
        };
        match read_reply::<WalletInfo>(response).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Signer returned no wallet info");
                WalletInfo::default()
            }
        }
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = self.endpoint(path).map_err(|e| e.to_string())?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        read_reply(response).await
    }
}

async fn read_reply<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, String> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|e| e.to_string());
    }
    match response.json::<ErrorReply>().await {
        Ok(reply) => Err(reply.error),
        Err(_) => Err(format!("signer responded with {status}")),
    }
}

#[async_trait]
impl WalletService for RemoteSigner {
    async fn wallet_type(&self) -> Option<WalletType> {
        self.info().await.wallet_type
    }

    async fn c_address(&self) -> Option<String> {
        self.info().await.address_c
    }

    async fn sign_message(&self, kind: MessageType, action: &Action) -> WalletResult<String> {
        if self.base.is_none() {
            return Err(WalletError::Undefined);
        }
        debug!(action_id = %action.action_id, kind = %kind, "Forwarding message to signer");
        let reply: SignReply = self
            .post("sign", &SignRequest { kind, action })
            .await
            .map_err(WalletError::Signer)?;
        Ok(reply.signature)
    }

    async fn send_custom_tx(&self, tx: CustomTx) -> WalletResult<String> {
        if self.base.is_none() {
            return Err(WalletError::Undefined);
        }
        debug!(to = %tx.to, "Forwarding transaction to signer");
        let reply: SendReply = self
            .post("transactions", &tx)
            .await
            .map_err(WalletError::Broadcast)?;
        Ok(reply.tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[tokio::test]
    async fn test_without_url_no_wallet_is_loaded() {
        let signer = RemoteSigner::new(reqwest::Client::new(), None);
        assert_eq!(signer.wallet_type().await, None);
        assert_eq!(signer.c_address().await, None);
        let tx = CustomTx {
            to: "0x1".into(),
            gas_price: U256::one(),
            gas_limit: 21_000,
            data: None,
            value: None,
        };
        assert!(matches!(signer.send_custom_tx(tx).await, Err(WalletError::Undefined)));
    }

    #[tokio::test]
    async fn test_unreachable_signer_reports_no_wallet() {
        let base = Url::parse("http://127.0.0.1:9/signer/").unwrap();
        let signer = RemoteSigner::new(reqwest::Client::new(), Some(base));
        assert_eq!(signer.wallet_type().await, None);
    }

    #[test]
    fn test_endpoints_join_under_base() {
        let base = Url::parse("http://127.0.0.1:7000/signer/").unwrap();
        let signer = RemoteSigner::new(reqwest::Client::new(), Some(base));
        assert_eq!(
            signer.endpoint("sign").unwrap().as_str(),
            "http://127.0.0.1:7000/signer/sign"
        );
    }
}
