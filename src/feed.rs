// SPDX-License-Identifier: MPL-2.0

//! Wallpaper list sources.

use async_trait::async_trait;
use backdrop_config::Config;
use serde::Deserialize;
use url::Url;

use crate::error::{BackdropError, Result};

/// Body of `GET /api/wallpaper`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct WallpaperResponse {
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl WallpaperResponse {
    /// Image URLs in server order; absent and `null` both read as empty.
    pub fn into_images(self) -> Vec<String> {
        self.images.unwrap_or_default()
    }
}

/// Something that can produce the current wallpaper list.
#[async_trait]
pub trait WallpaperFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// HTTP client shared by the feed and the preloader.
pub fn create_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("backdrop/", env!("CARGO_PKG_VERSION")));

    // zero disables the timeout
    if config.request_timeout_secs > 0 {
        builder = builder.timeout(config.request_timeout());
    }
    if config.connect_timeout_secs > 0 {
        builder = builder.connect_timeout(config.connect_timeout());
    }

    builder.build().map_err(BackdropError::Client)
}

/// Fetches the list from a backend endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: Url,
}

impl HttpFeed {
    pub fn new(client: reqwest::Client, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|source| BackdropError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        Ok(Self { client, url })
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Result<Self> {
        Self::new(client, &config.wallpaper_url())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl WallpaperFeed for HttpFeed {
    async fn fetch(&self) -> Result<Vec<String>> {
        let url = self.url.as_str();
        tracing::debug!(url, "Fetching wallpaper list");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| BackdropError::Http {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackdropError::Status {
                url: url.to_owned(),
                status,
            });
        }

        let body: WallpaperResponse =
            response.json().await.map_err(|source| BackdropError::Decode {
                url: url.to_owned(),
                source,
            })?;

        Ok(body.into_images())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve, unreachable_addr};

    fn feed_for(addr: std::net::SocketAddr) -> HttpFeed {
        HttpFeed::new(local_client(), &format!("http://{addr}/api/wallpaper")).unwrap()
    }

    #[test]
    fn test_response_shapes() {
        let full: WallpaperResponse =
            serde_json::from_str(r#"{"images":["a.png","b.png"]}"#).unwrap();
        assert_eq!(full.into_images(), ["a.png", "b.png"]);

        let absent: WallpaperResponse = serde_json::from_str("{}").unwrap();
        assert!(absent.into_images().is_empty());

        let null: WallpaperResponse = serde_json::from_str(r#"{"images":null}"#).unwrap();
        assert!(null.into_images().is_empty());

        assert!(serde_json::from_str::<WallpaperResponse>(r#"{"images":[1,2]}"#).is_err());
    }

    #[test]
    fn test_from_config_builds_url() {
        let config = Config::default().with_endpoint("http://example.org:8080/");
        let client = create_client(&config).unwrap();
        let feed = HttpFeed::from_config(client, &config).unwrap();
        assert_eq!(feed.url().as_str(), "http://example.org:8080/api/wallpaper");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let client = create_client(&Config::default()).unwrap();
        assert!(matches!(
            HttpFeed::new(client, "not a url"),
            Err(BackdropError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = serve(
            200,
            "application/json",
            br#"{"images":["https://img/a.jpg","https://img/b.jpg"]}"#.to_vec(),
        )
        .await;

        let images = feed_for(server.addr).fetch().await.unwrap();
        assert_eq!(images, ["https://img/a.jpg", "https://img/b.jpg"]);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = serve(500, "application/json", br#"{"images":[]}"#.to_vec()).await;

        let result = feed_for(server.addr).fetch().await;
        assert!(matches!(result, Err(BackdropError::Status { status, .. }) if status == 500));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = serve(200, "application/json", b"<html>oops</html>".to_vec()).await;

        let result = feed_for(server.addr).fetch().await;
        assert!(matches!(result, Err(BackdropError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let addr = unreachable_addr().await;

        let result = feed_for(addr).fetch().await;
        assert!(matches!(result, Err(BackdropError::Http { .. })));
    }
}
