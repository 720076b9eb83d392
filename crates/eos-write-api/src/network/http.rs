//! HTTP chain API client.

use super::{Network, PushReceipt};
use crate::config::WriteApiConfig;
use crate::error::{WriteApiError, WriteApiResult};
use crate::retry::{RetryConfig, retry_idempotent};
use crate::transaction::types::{SignedTransaction, TransactionHeaders};
use crate::types::TimePointSec;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";
const GET_INFO_PATH: &str = "v1/chain/get_info";
const GET_BLOCK_PATH: &str = "v1/chain/get_block";
const PUSH_TRANSACTION_PATH: &str = "v1/chain/push_transaction";

/// Chain state returned by `get_info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Current head block number.
    pub head_block_num: u64,
    /// Last irreversible block number.
    pub last_irreversible_block_num: u64,
    /// Head block time, `YYYY-MM-DDTHH:MM:SS` in UTC.
    pub head_block_time: String,
}

/// The block fields `get_block` returns that transaction headers need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block id, hex.
    pub id: String,
    /// Block number.
    pub block_num: u64,
    /// Prefix of the block id, when the node reports it.
    #[serde(default)]
    pub ref_block_prefix: Option<u32>,
}

impl BlockInfo {
    /// The reference block prefix: bytes 8..12 of the block id, little endian.
    pub fn ref_block_prefix(&self) -> WriteApiResult<u32> {
        if let Some(prefix) = self.ref_block_prefix {
            return Ok(prefix);
        }
        let id = hex::decode(&self.id)?;
        let bytes: [u8; 4] = id
            .get(8..12)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| WriteApiError::Internal(format!("block id too short: {}", self.id)))?;
        Ok(u32::from_le_bytes(bytes))
    }
}

/// [`Network`] backed by a node's HTTP chain API.
///
/// Context fetches are retried on transient failures according to the
/// configured [`RetryConfig`]. Pushes are sent once.
///
/// # Example
///
/// ```rust,no_run
/// use eos_write_api::network::{HttpNetwork, Network};
/// use eos_write_api::WriteApiConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let network = HttpNetwork::new(&WriteApiConfig::local())?;
///     let headers = network.create_transaction(60).await?;
///     println!("expires at {}", headers.expiration);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    base_url: Url,
    client: Client,
    retry_config: Arc<RetryConfig>,
}

impl HttpNetwork {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &WriteApiConfig) -> WriteApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(WriteApiError::Http)?;
        Ok(Self::from_client(
            client,
            config.http_endpoint().clone(),
            config.retry_config().clone(),
        ))
    }

    /// Wraps an existing `reqwest` client.
    pub fn from_client(client: Client, base_url: Url, retry_config: RetryConfig) -> Self {
        Self {
            base_url,
            client,
            retry_config: Arc::new(retry_config),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the current chain state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries or the response
    /// does not parse.
    pub async fn get_info(&self) -> WriteApiResult<ChainInfo> {
        self.post_json(self.build_url(GET_INFO_PATH), serde_json::json!({}))
            .await
    }

    /// Fetches a block by number or id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries or the response
    /// does not parse.
    pub async fn get_block(&self, block_num_or_id: &str) -> WriteApiResult<BlockInfo> {
        self.post_json(
            self.build_url(GET_BLOCK_PATH),
            serde_json::json!({ "block_num_or_id": block_num_or_id }),
        )
        .await
    }

    fn build_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        url.set_path(&format!("{}{}", url.path(), path));
        url
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: serde_json::Value,
    ) -> WriteApiResult<T> {
        retry_idempotent(&self.retry_config, || {
            let client = self.client.clone();
            let url = url.clone();
            let body = body.clone();
            async move {
                debug!(url = %url, "chain api request");
                let response = client
                    .post(url)
                    .header(ACCEPT, JSON_CONTENT_TYPE)
                    .json(&body)
                    .send()
                    .await?;
                Self::handle_response(response).await
            }
        })
        .await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> WriteApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .pointer("/error/what")
            .or_else(|| body.get("message"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        Err(WriteApiError::api(status.as_u16(), message))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn create_transaction(
        &self,
        expire_in_seconds: u64,
    ) -> WriteApiResult<TransactionHeaders> {
        let info = self.get_info().await?;
        let block = self
            .get_block(&info.last_irreversible_block_num.to_string())
            .await?;
        let head_block_time = TimePointSec::parse(&info.head_block_time)?;

        let headers = TransactionHeaders {
            // truncation to the low 16 bits is the wire format
            ref_block_num: (info.last_irreversible_block_num & 0xFFFF) as u16,
            ref_block_prefix: block.ref_block_prefix()?,
            expiration: head_block_time.plus_seconds(expire_in_seconds),
        };
        debug!(
            head_block_num = info.head_block_num,
            ref_block_num = headers.ref_block_num,
            ref_block_prefix = headers.ref_block_prefix,
            expiration = %headers.expiration,
            "fetched transaction context"
        );
        Ok(headers)
    }

    async fn push_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> WriteApiResult<PushReceipt> {
        let response = self
            .client
            .post(self.build_url(PUSH_TRANSACTION_PATH))
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(transaction)
            .send()
            .await?;
        let receipt: PushReceipt = Self::handle_response(response).await?;
        info!(
            transaction_id = receipt.transaction_id.as_deref().unwrap_or("unknown"),
            "transaction pushed"
        );
        Ok(receipt)
    }
}
