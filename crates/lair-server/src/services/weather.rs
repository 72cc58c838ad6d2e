//! Weather lookup via wttr.in.

use async_trait::async_trait;
use tracing::debug;

use super::{ServiceError, WeatherClient};

const BASE_URL: &str = "https://wttr.in";

/// Weather from wttr.in's one-line format (`location: condition temperature`).
pub struct WttrWeather {
    client: reqwest::Client,
    url: String,
}

impl WttrWeather {
    /// Client for `location` (for example `pretoria`).
    pub fn new(client: reqwest::Client, location: impl AsRef<str>) -> Self {
        Self::with_base_url(client, BASE_URL, location)
    }

    /// Client against a different wttr.in-compatible host.
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl AsRef<str>,
        location: impl AsRef<str>,
    ) -> Self {
        let url = format!(
            "{}/{}?format=%l:+%c+%t",
            base_url.as_ref().trim_end_matches('/'),
            location.as_ref()
        );
        Self { client, url }
    }

    /// Request URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WeatherClient for WttrWeather {
    async fn current(&self) -> Result<String, ServiceError> {
        debug!(url = %self.url, "fetching weather");
        let body = self.client.get(&self.url).send().await?.error_for_status()?.text().await?;
        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_one_line_format() {
        let weather = WttrWeather::new(reqwest::Client::new(), "pretoria");
        assert_eq!(weather.url(), "https://wttr.in/pretoria?format=%l:+%c+%t");

        let local = WttrWeather::with_base_url(reqwest::Client::new(), "http://127.0.0.1:9/", "x");
        assert_eq!(local.url(), "http://127.0.0.1:9/x?format=%l:+%c+%t");
    }
}
