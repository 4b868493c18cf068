//! # SideShift Client Service
//!
//! HTTP client for the external swap API, used to convert vault funds on
//! unlock. When no API key is configured (or demo mode is forced) the
//! client serves every call from a deterministic local mock instead of the
//! network, so the whole unlock flow works offline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::store::ShiftStatus;
use crate::utils;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed per-asset USD quotes backing the mock provider.
///
/// Rates derived from this table are stable across calls, which keeps the
/// demo flow reproducible.
const MOCK_USD_PRICES: &[(&str, f64)] = &[
    ("BTC", 65_000.0),
    ("ETH", 3_300.0),
    ("SOL", 150.0),
    ("XMR", 160.0),
    ("LTC", 85.0),
    ("BNB", 580.0),
    ("AVAX", 35.0),
    ("DOGE", 0.12),
    ("USDT", 1.0),
    ("USDC", 1.0),
];

/// Errors that can occur when talking to the swap provider.
#[derive(Debug, thiserror::Error)]
pub enum ShiftClientError {
    /// Network-level failure.
    #[error("Swap provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status.
    #[error("Swap provider error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Asset pair not quotable (mock provider only knows a fixed set).
    #[error("Unsupported asset pair: {0}/{1}")]
    UnsupportedPair(String, String),

    /// Provider response didn't parse into the expected shape.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// A conversion quote for an asset pair.
#[derive(Debug, Clone)]
pub struct PairQuote {
    /// Units of the settle asset per unit of the deposit asset.
    pub rate: f64,
}

/// A placed swap order.
#[derive(Debug, Clone)]
pub struct ShiftOrder {
    /// Provider order id; webhook callbacks key on this.
    pub id: String,

    /// Address the provider expects the deposit on.
    pub deposit_address: String,

    /// Quoted conversion rate.
    pub rate: f64,

    /// Initial order state.
    pub status: ShiftStatus,
}

/// Wire format of `GET /pair/{from}/{to}`.
#[derive(Debug, Deserialize)]
struct PairResponse {
    rate: String,
}

/// Wire format of a created shift order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShiftResponse {
    id: String,
    deposit_address: String,
    rate: String,
    status: String,
}

/// Request body for `POST /shifts/fixed`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateShiftBody<'a> {
    deposit_coin: &'a str,
    settle_coin: &'a str,
    settle_address: &'a str,
    deposit_amount: String,
    affiliate_id: &'a str,
}

/// Client for the SideShift-compatible swap API.
///
/// ## Usage
///
/// ```rust,ignore
/// let client = ShiftClient::new(&config);
/// let quote = client.quote("BTC", "ETH").await?;
/// let order = client.create_shift("BTC", "ETH", "0xabc...", 0.5).await?;
/// ```
#[derive(Clone)]
pub struct ShiftClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    affiliate_id: String,
    mock: bool,
}

impl ShiftClient {
    /// Create a new client from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        let mock = config.use_mock_shifts();
        if mock {
            info!("Swap provider running in mock mode (no API key or demo mode forced)");
        }

        Self {
            client,
            base_url: config.sideshift_api_url.clone(),
            api_key: config.sideshift_api_key.clone(),
            affiliate_id: config.sideshift_affiliate_id.clone(),
            mock,
        }
    }

    /// Whether calls are served by the local mock.
    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Get the current conversion rate for an asset pair.
    pub async fn quote(&self, from: &str, to: &str) -> Result<PairQuote, ShiftClientError> {
        if self.mock {
            return Ok(PairQuote {
                rate: mock_rate(from, to)?,
            });
        }

        let url = format!("{}/pair/{}/{}", self.base_url, from, to);
        debug!("Fetching pair quote: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ShiftClientError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let pair: PairResponse = response.json().await?;
        let rate = pair
            .rate
            .parse::<f64>()
            .map_err(|_| ShiftClientError::InvalidResponse(format!("bad rate: {}", pair.rate)))?;

        Ok(PairQuote { rate })
    }

    /// Place a fixed-rate shift order paying `settle_address` in `to`,
    /// funded by `amount` of `from`.
    pub async fn create_shift(
        &self,
        from: &str,
        to: &str,
        settle_address: &str,
        amount: f64,
    ) -> Result<ShiftOrder, ShiftClientError> {
        if self.mock {
            return self.mock_shift(from, to, amount);
        }

        let url = format!("{}/shifts/fixed", self.base_url);
        let body = CreateShiftBody {
            deposit_coin: from,
            settle_coin: to,
            settle_address,
            deposit_amount: format!("{}", amount),
            affiliate_id: &self.affiliate_id,
        };

        debug!("Creating shift {} -> {} for {}", from, to, settle_address);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-sideshift-secret", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ShiftClientError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let shift: ShiftResponse = response.json().await?;
        let rate = shift
            .rate
            .parse::<f64>()
            .map_err(|_| ShiftClientError::InvalidResponse(format!("bad rate: {}", shift.rate)))?;

        Ok(ShiftOrder {
            id: shift.id,
            deposit_address: shift.deposit_address,
            rate,
            status: ShiftStatus::from_provider(&shift.status),
        })
    }

    /// Build a mock order locally with a deterministic rate.
    fn mock_shift(
        &self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<ShiftOrder, ShiftClientError> {
        let rate = mock_rate(from, to)?;
        let order = ShiftOrder {
            id: utils::mock_order_id(),
            deposit_address: utils::mock_deposit_address(from),
            rate,
            status: ShiftStatus::Waiting,
        };

        info!(
            "Mock shift {}: {} -> {:.6} {}",
            order.id,
            utils::format_amount(amount, from),
            amount * rate,
            to.to_uppercase()
        );

        Ok(order)
    }
}

/// Deterministic mock conversion rate for an asset pair.
fn mock_rate(from: &str, to: &str) -> Result<f64, ShiftClientError> {
    let usd = |asset: &str| {
        let upper = asset.to_uppercase();
        MOCK_USD_PRICES
            .iter()
            .find(|(sym, _)| *sym == upper)
            .map(|(_, price)| *price)
    };

    match (usd(from), usd(to)) {
        (Some(f), Some(t)) => Ok(f / t),
        _ => Err(ShiftClientError::UnsupportedPair(
            from.to_string(),
            to.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_rate_is_deterministic() {
        let a = mock_rate("BTC", "ETH").unwrap();
        let b = mock_rate("BTC", "ETH").unwrap();
        assert_eq!(a, b);
        assert!((a - 65_000.0 / 3_300.0).abs() < 1e-9);
    }

    #[test]
    fn test_mock_rate_case_insensitive() {
        assert_eq!(
            mock_rate("btc", "usdt").unwrap(),
            mock_rate("BTC", "USDT").unwrap()
        );
    }

    #[test]
    fn test_mock_rate_unsupported_pair() {
        assert!(matches!(
            mock_rate("BTC", "SHITCOIN"),
            Err(ShiftClientError::UnsupportedPair(_, _))
        ));
    }

    #[tokio::test]
    async fn test_mock_client_never_hits_network() {
        // Base URL is unroutable; mock mode must not touch it
        let client = ShiftClient::new(&AppConfig::for_tests());
        assert!(client.is_mock());

        let quote = client.quote("BTC", "ETH").await.unwrap();
        assert!(quote.rate > 0.0);

        let order = client.create_shift("BTC", "ETH", "0xabc", 0.5).await.unwrap();
        assert!(order.id.starts_with("cv-"));
        assert_eq!(order.status, ShiftStatus::Waiting);
        assert_eq!(order.rate, quote.rate);
    }
}
