use crate::error::{StageFailure, StageResult};
use serde::Deserialize;
use std::time::Duration;

/// Public Nominatim instance used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Fixed request identity sent with every lookup, as required by the
/// Nominatim usage policy.
const USER_AGENT: &str = concat!("image-recon/", env!("CARGO_PKG_VERSION"));

/// Reverse-geocoding client.
///
/// One instance is built per analyzer and reused across invocations; the
/// underlying `reqwest::Client` pools connections. Every failure mode
/// (network error, non-success status, empty result) degrades to a
/// [`StageFailure`] so the caller can record a null location and move on.
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            language: language.into(),
        })
    }

    /// Resolves decimal coordinates to a formatted address string.
    pub async fn reverse(&self, lat: f64, lon: f64) -> StageResult<String> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2"),
                ("lat", &lat.to_string()),
                ("lon", &lon.to_string()),
                ("accept-language", &self.language),
            ])
            .send()
            .await
            .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;
        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| StageFailure::ServiceUnavailable(e.to_string()))?;

        match body.display_name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(StageFailure::DataQuality(format!(
                "no address found for ({lat}, {lon})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_service_unavailable() {
        // Port 9 (discard) is never running a geocoder.
        let client = NominatimClient::new(
            "http://127.0.0.1:9",
            "en",
            Duration::from_millis(500),
        )
        .unwrap();

        let result = client.reverse(40.446, -79.982).await;
        assert!(matches!(
            result,
            Err(StageFailure::ServiceUnavailable(_))
        ));
    }
}
