//! JSON-RPC chain client.

use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U64};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

use crate::{ChainClient, ClientError, DeploymentReceipt};

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default URL of a local development node.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, ClientError> {
    create_client_with_timeout(DEFAULT_TIMEOUT)
}

pub fn create_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Vec<Value>,
) -> Result<T, ClientError> {
    let response: Value = client
        .post(url.clone())
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    decode_response(method, response)
}

fn decode_response<T: DeserializeOwned>(method: &str, response: Value) -> Result<T, ClientError> {
    if let Some(error) = response.get("error") {
        return Err(ClientError::Rpc {
            code: error.get("code").and_then(|c| c.as_i64()).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_string(),
        });
    }

    let decode_error = |reason: String| ClientError::Decode {
        method: method.to_string(),
        reason,
    };

    let result = response
        .get("result")
        .cloned()
        .ok_or_else(|| decode_error("no result in response".to_string()))?;

    serde_json::from_value(result).map_err(|e| decode_error(e.to_string()))
}

/// `eth_getTransactionReceipt` fields needed to confirm a deployment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    contract_address: Option<Address>,
    /// Absent on pre-Byzantium chains, where a mined receipt means success.
    status: Option<U64>,
}

impl RpcReceipt {
    /// Some nodes return a receipt without a block number for pending transactions.
    fn into_confirmed(self) -> Option<DeploymentReceipt> {
        let block_number = self.block_number?;
        Some(DeploymentReceipt {
            tx_hash: self.transaction_hash,
            block_number: block_number.to::<u64>(),
            contract_address: self.contract_address,
            status: self.status.is_none_or(|s| s == U64::from(1)),
        })
    }
}

/// A [`ChainClient`] speaking Ethereum JSON-RPC over HTTP.
///
/// Transactions are sent with `eth_sendTransaction`, so the sender must be an
/// account unlocked on the node (a development node, or a node fronted by a
/// signing proxy). When no sender is configured, the node's first account is used.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    client: reqwest::Client,
    url: Url,
    sender: OnceCell<Address>,
}

impl JsonRpcChainClient {
    pub fn new(url: Url, sender: Option<Address>) -> Result<Self, ClientError> {
        Ok(Self::with_client(create_client()?, url, sender))
    }

    pub fn with_client(client: reqwest::Client, url: Url, sender: Option<Address>) -> Self {
        Self {
            client,
            url,
            sender: OnceCell::new_with(sender),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The account deployments are sent from.
    pub async fn sender(&self) -> Result<Address, ClientError> {
        self.sender
            .get_or_try_init(|| async {
                let accounts: Vec<Address> =
                    json_rpc_call(&self.client, &self.url, "eth_accounts", vec![])
                        .await
                        .map_err(|e| ClientError::Sender {
                            reason: e.to_string(),
                        })?;
                let sender = accounts.first().copied().ok_or_else(|| ClientError::Sender {
                    reason: "node has no unlocked accounts, configure a sender".to_string(),
                })?;
                tracing::debug!(%sender, "Using the node's first account as sender");
                Ok::<_, ClientError>(sender)
            })
            .await
            .copied()
    }
}

impl ChainClient for JsonRpcChainClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        let chain_id: U64 = json_rpc_call(&self.client, &self.url, "eth_chainId", vec![]).await?;
        Ok(chain_id.to::<u64>())
    }

    async fn submit_deployment(&self, init_code: Bytes) -> Result<B256, ClientError> {
        let from = self.sender().await?;
        json_rpc_call(
            &self.client,
            &self.url,
            "eth_sendTransaction",
            vec![serde_json::json!({
                "from": from,
                "data": init_code,
            })],
        )
        .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<DeploymentReceipt>, ClientError> {
        let receipt: Option<RpcReceipt> = json_rpc_call(
            &self.client,
            &self.url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;

        Ok(receipt.and_then(RpcReceipt::into_confirmed))
    }
}
