mod rollup_node;

use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_transport_http::Http;
pub use rollup_node::{RollupNodeClient, RollupNodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error building the underlying HTTP client
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create a provider whose HTTP transport optionally skips TLS certificate checks.
///
/// Some operator endpoints sit behind self-signed certificates; `ignore_certificate`
/// turns verification off for this provider only.
pub fn create_provider_with_tls(
    rpc_url: &str,
    ignore_certificate: bool,
) -> Result<impl Provider + Clone, ClientError> {
    let url: reqwest::Url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;

    let http_client = http_client(ignore_certificate)?;
    let transport = Http::with_client(http_client, url);
    let rpc_client = RpcClient::new(transport, false);

    Ok(ProviderBuilder::new().connect_client(rpc_client))
}

/// Build the reqwest client shared by the providers and the rollup node adapter.
pub(crate) fn http_client(ignore_certificate: bool) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(ignore_certificate)
        .build()
        .map_err(|e| ClientError::Http(format!("{}", e)))
}
