//! EIP-3085 request parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Network, NetworkToken, NetworkVm};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    18
}

/// `wallet_addEthereumChain` parameter object. Every field is optional on the
/// wire; the handler decides which absences are errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    #[serde(default)]
    pub chain_id: Option<Value>,
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default)]
    pub rpc_urls: Option<Vec<String>>,
    #[serde(default)]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(default)]
    pub icon_urls: Option<Vec<String>>,
    #[serde(default)]
    pub is_testnet: Option<bool>,
    #[serde(default)]
    pub requires_glacier_api_key: Option<bool>,
    #[serde(default)]
    pub custom_rpc_headers: Option<BTreeMap<String, String>>,
}

impl AddEthereumChainParameter {
    /// Chain id as a number. Accepts `0x` hex strings, decimal strings and
    /// JSON numbers.
    pub fn chain_id(&self) -> Option<u64> {
        match self.chain_id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => parse_chain_id(s),
            _ => None,
        }
    }

    pub fn rpc_url(&self) -> Option<&str> {
        first(&self.rpc_urls).filter(|url| !url.is_empty())
    }

    pub fn requires_glacier_api_key(&self) -> bool {
        self.requires_glacier_api_key.unwrap_or(false)
    }

    /// Network record described by this request.
    pub fn to_network(&self, chain_id: u64, rpc_url: &str, currency: &NativeCurrency) -> Network {
        let icon = first(&self.icon_urls).unwrap_or_default().to_string();
        Network {
            chain_id,
            chain_name: self.chain_name.clone().unwrap_or_default(),
            vm_name: NetworkVm::Evm,
            rpc_url: rpc_url.to_string(),
            network_token: NetworkToken {
                symbol: currency.symbol.clone().unwrap_or_default(),
                decimals: currency.decimals,
                name: currency.name.clone().unwrap_or_default(),
                description: String::new(),
                logo_uri: icon.clone(),
            },
            logo_uri: icon,
            explorer_url: first(&self.block_explorer_urls)
                .unwrap_or_default()
                .to_string(),
            primary_color: "black".to_string(),
            is_testnet: self.is_testnet.unwrap_or(false),
            custom_rpc_headers: self.custom_rpc_headers.clone(),
        }
    }
}

fn first(list: &Option<Vec<String>>) -> Option<&str> {
    list.as_ref()?.first().map(String::as_str)
}

pub(crate) fn parse_chain_id(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
