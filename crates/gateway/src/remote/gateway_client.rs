use std::time::Duration;

use async_trait::async_trait;
use common::models::{Direction, TraderSummary};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::{ClientSetupError, TransportError};
use crate::remote::ack_response::ErrorBody;
use crate::remote::{
    CreatedTrader, HealthStatus, ManualTradeAck, RebalanceAck, SignalHistory, StatusAck,
    TradeHistory, TraderListing,
};
use crate::traits::TraderGateway;

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientSetupError> {
        let parsed = Url::parse(base_url).map_err(|e| ClientSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }

        let client = Client::builder()
            .user_agent("trader_dashboard/0.1.0")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<T, TransportError> {
        let method_name = method_name(&method);
        let path = format!("/{}", segments.join("/"));
        let url = self.endpoint(segments);

        let mut request: RequestBuilder = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("{} {}", method_name, path);

        let resp = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method: method_name,
                path: path.clone(),
                source,
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|source| TransportError::Request {
                method: method_name,
                path: path.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(ErrorBody::into_message)
                .unwrap_or_else(|_| text.trim().to_string());
            warn!("{} {} failed with HTTP {}: {}", method_name, path, status, message);
            return Err(TransportError::Status {
                method: method_name,
                path,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<T>(&text).map_err(|source| TransportError::Decode {
            method: method_name,
            path,
            source,
        })
    }
}

fn method_name(method: &Method) -> &'static str {
    if method == Method::GET {
        "GET"
    } else if method == Method::POST {
        "POST"
    } else if method == Method::DELETE {
        "DELETE"
    } else {
        "HTTP"
    }
}

#[async_trait]
impl TraderGateway for GatewayClient {
    async fn list_traders(&self) -> Result<TraderListing, TransportError> {
        self.call(Method::GET, &["traders"], None).await
    }

    async fn create_trader(&self) -> Result<CreatedTrader, TransportError> {
        self.call(Method::POST, &["trader", "create"], Some(json!({})))
            .await
    }

    async fn delete_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.call(Method::DELETE, &["trader", trader_id, "delete"], None)
            .await
    }

    async fn start_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.call(Method::POST, &["trader", trader_id, "start"], None)
            .await
    }

    async fn stop_trader(&self, trader_id: &str) -> Result<StatusAck, TransportError> {
        self.call(Method::POST, &["trader", trader_id, "stop"], None)
            .await
    }

    async fn get_summary(&self, trader_id: &str) -> Result<TraderSummary, TransportError> {
        self.call(Method::GET, &["trader", trader_id, "summary"], None)
            .await
    }

    async fn get_trades(&self, trader_id: &str) -> Result<TradeHistory, TransportError> {
        self.call(Method::GET, &["trader", trader_id, "trades"], None)
            .await
    }

    async fn get_signals(&self, trader_id: &str) -> Result<SignalHistory, TransportError> {
        self.call(Method::GET, &["trader", trader_id, "signals"], None)
            .await
    }

    async fn manual_trade(
        &self,
        trader_id: &str,
        direction: Direction,
    ) -> Result<ManualTradeAck, TransportError> {
        self.call(
            Method::POST,
            &["trader", trader_id, "manual-trade"],
            Some(json!({ "direction": direction })),
        )
        .await
    }

    async fn force_rebalance(&self, trader_id: &str) -> Result<RebalanceAck, TransportError> {
        self.call(Method::POST, &["trader", trader_id, "force-balance"], None)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.call(Method::GET, &["health"], None).await
    }
}
