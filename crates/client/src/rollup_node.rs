//! Rollup node (op-node) JSON-RPC adapter.
//!
//! Only `optimism_outputAtBlock` is needed: it returns the output root the rollup
//! node computed for a given L2 block. The adapter is strict; any failure is
//! returned to the caller, which decides whether it is fatal.

use crate::ClientError;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OUTPUT_AT_BLOCK_METHOD: &str = "optimism_outputAtBlock";

#[derive(Error, Debug)]
pub enum RollupNodeError {
    /// Transport failure or undecodable response body
    #[error("rollup node request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Node reachable, but the HTTP status was not 2xx
    #[error("rollup node returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// JSON-RPC level error object
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Neither `result` nor `error` present
    #[error("rollup node response has no result")]
    MissingResult,
}

/// Client for the rollup node's `optimism_*` RPC namespace.
///
/// # Example
///
/// ```ignore
/// let node = RollupNodeClient::new("http://localhost:9545");
/// let output_root = node.output_at_block(777).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RollupNodeClient {
    client: reqwest::Client,
    url: String,
}

impl RollupNodeClient {
    /// Creates a client with certificate verification enabled.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Creates a client, optionally skipping TLS certificate verification.
    pub fn with_tls(url: impl Into<String>, ignore_certificate: bool) -> Result<Self, ClientError> {
        Ok(Self {
            client: crate::http_client(ignore_certificate)?,
            url: url.into(),
        })
    }

    /// Returns the node endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the output root the rollup node reports for `block_number`.
    pub async fn output_at_block(&self, block_number: u64) -> Result<B256, RollupNodeError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: OUTPUT_AT_BLOCK_METHOD,
            params: [format!("{block_number:#x}")],
            id: 1,
        };

        debug!(block_number, url = %self.url, "Requesting output root from rollup node");

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(RollupNodeError::Status { status, body });
        }

        let rpc_response: JsonRpcResponse<OutputResponse> = response.json().await?;

        match rpc_response.result {
            Some(result) => Ok(result.output_root),
            None => match rpc_response.error {
                Some(error) => Err(RollupNodeError::Rpc {
                    code: error.code,
                    message: error.message,
                }),
                None => Err(RollupNodeError::MissingResult),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Subset of the `optimism_outputAtBlock` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputResponse {
    output_root: B256,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Serve exactly one HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_output_at_block_success() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"version":"0x0000000000000000000000000000000000000000000000000000000000000000","outputRoot":"0x2222222222222222222222222222222222222222222222222222222222222222","blockRef":{"number":777}}}"#;
        let (url, server) = serve_once("200 OK", body.to_string()).await;

        let node = RollupNodeClient::new(url);
        let output_root = node.output_at_block(777).await.unwrap();

        assert_eq!(
            output_root,
            b256!("2222222222222222222222222222222222222222222222222222222222222222")
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST "));
        assert!(request.contains(r#""method":"optimism_outputAtBlock""#));
        assert!(request.contains(r#""params":["0x309"]"#));
    }

    #[tokio::test]
    async fn test_output_at_block_http_500() {
        let (url, server) = serve_once("500 Internal Server Error", "boom".to_string()).await;

        let node = RollupNodeClient::new(url);
        let err = node.output_at_block(1).await.unwrap_err();

        match err {
            RollupNodeError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_output_at_block_rpc_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"not found"}}"#;
        let (url, server) = serve_once("200 OK", body.to_string()).await;

        let node = RollupNodeClient::new(url);
        let err = node.output_at_block(5).await.unwrap_err();

        assert!(matches!(
            err,
            RollupNodeError::Rpc { code: -32000, ref message } if message == "not found"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_output_at_block_missing_result() {
        let (url, server) = serve_once("200 OK", r#"{"jsonrpc":"2.0","id":1}"#.to_string()).await;

        let node = RollupNodeClient::new(url);
        let err = node.output_at_block(5).await.unwrap_err();

        assert!(matches!(err, RollupNodeError::MissingResult));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_output_at_block_unreachable() {
        // Bind and drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let node = RollupNodeClient::new(url);
        let err = node.output_at_block(5).await.unwrap_err();
        assert!(matches!(err, RollupNodeError::Http(_)));
    }

    #[test]
    fn test_with_tls_keeps_url() {
        let node = RollupNodeClient::with_tls("https://node.example:9545", true).unwrap();
        assert_eq!(node.url(), "https://node.example:9545");
    }
}
