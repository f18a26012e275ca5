// SPDX-License-Identifier: MPL-2.0

//! Background warming of the image cache.
//!
//! Preloading is a caching hint only. Each URL is downloaded and decoded in
//! its own task; nobody awaits the result and failures are logged at debug
//! level and dropped.

use std::sync::Arc;

use image::DynamicImage;
use tokio::{runtime::Handle, sync::Semaphore};
use url::Url;

use crate::{
    cache::ImageCache,
    error::{BackdropError, Result},
};

/// Fire-and-forget warming of wallpaper URLs.
pub trait ImagePreloader: Send + Sync {
    /// Start warming `urls` in the background. Returns immediately.
    fn preload(&self, urls: &[String]);

    /// Decoded image for `url` if an earlier preload finished.
    fn cached(&self, _url: &str) -> Option<Arc<DynamicImage>> {
        None
    }
}

/// Preloader that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreloader;

impl ImagePreloader for NoopPreloader {
    fn preload(&self, _urls: &[String]) {}
}

/// Downloads wallpapers over HTTP and decodes them into an [`ImageCache`].
#[derive(Debug, Clone)]
pub struct HttpPreloader {
    client: reqwest::Client,
    cache: Arc<ImageCache>,
    permits: Arc<Semaphore>,
    base: Option<Url>,
}

impl HttpPreloader {
    /// `max_in_flight` bounds concurrent downloads; it is clamped to at least 1.
    pub fn new(client: reqwest::Client, cache: Arc<ImageCache>, max_in_flight: usize) -> Self {
        Self {
            client,
            cache,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            base: None,
        }
    }

    /// Resolve relative wallpaper URLs against `base`.
    #[must_use]
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let parsed = match &self.base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|source| BackdropError::InvalidUrl {
            url: url.to_owned(),
            source,
        })
    }
}

impl ImagePreloader for HttpPreloader {
    fn preload(&self, urls: &[String]) {
        let Ok(runtime) = Handle::try_current() else {
            let why = BackdropError::NoRuntime { what: "image preloading" };
            tracing::warn!(%why, "Skipping preload");
            return;
        };

        let mut spawned = 0usize;
        for url in urls {
            if self.cache.contains(url) {
                continue;
            }

            let target = match self.resolve(url) {
                Ok(target) => target,
                Err(why) => {
                    tracing::debug!(?why, "Not preloading");
                    continue;
                }
            };

            let client = self.client.clone();
            let cache = Arc::clone(&self.cache);
            let permits = Arc::clone(&self.permits);
            let key = url.clone();

            runtime.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                match download(&client, target).await {
                    Ok(image) => {
                        cache.insert(key, image);
                    }
                    Err(why) => tracing::debug!(url = %key, ?why, "Preload failed"),
                }
            });
            spawned += 1;
        }

        tracing::debug!(requested = urls.len(), spawned, "Wallpaper preload started");
    }

    fn cached(&self, url: &str) -> Option<Arc<DynamicImage>> {
        self.cache.get(url)
    }
}

async fn download(client: &reqwest::Client, url: Url) -> Result<DynamicImage> {
    let name = url.to_string();
    let http_err = |source| BackdropError::Http {
        url: name.clone(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackdropError::Status {
            url: name.clone(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(http_err)?;

    image::load_from_memory(&bytes).map_err(|source| BackdropError::ImageDecode { url: name, source })
}
