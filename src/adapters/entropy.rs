use crate::config::toml_config::EntropyConfig;
use crate::domain::ports::EntropySource;
use crate::utils::error::{EntropyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// ANU-style quantum random number endpoint: `GET ?length=<n>&type=<value_type>`.
#[derive(Debug, Clone)]
pub struct QrngSource {
    client: Client,
    endpoint: String,
    value_type: String,
}

#[derive(Debug, Deserialize)]
struct QrngPayload {
    data: Option<Vec<u32>>,
    success: Option<bool>,
}

impl QrngSource {
    pub fn new(
        endpoint: impl Into<String>,
        value_type: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // 超時視同傳輸失敗，交給洗牌邏輯退回本地亂數
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            value_type: value_type.into(),
        })
    }

    pub fn from_config(config: &EntropyConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            config.value_type.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl EntropySource for QrngSource {
    async fn fetch_entropy(&self, n: usize) -> std::result::Result<Vec<u32>, EntropyError> {
        tracing::debug!("Requesting {} {} values from {}", n, self.value_type, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("length", n.to_string()), ("type", self.value_type.clone())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EntropyError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: QrngPayload =
            serde_json::from_str(&body).map_err(|e| EntropyError::Malformed(e.to_string()))?;

        if payload.success == Some(false) {
            return Err(EntropyError::Malformed(
                "provider reported success=false".to_string(),
            ));
        }

        let mut data = payload
            .data
            .ok_or_else(|| EntropyError::Malformed("missing data field".to_string()))?;

        if data.len() < n {
            return Err(EntropyError::Insufficient {
                requested: n,
                received: data.len(),
            });
        }

        data.truncate(n);
        Ok(data)
    }
}
