// SPDX-License-Identifier: MPL-2.0

//! Theme and wallpaper rotation state.
//!
//! [`PreferenceStore`] is the single owner of the persisted theme, the fetched
//! wallpaper list and the rotation timer. Consumers read snapshots or
//! subscribe to changes; all mutation goes through the store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use backdrop_config::{Config, Theme};
use image::DynamicImage;
use tokio::sync::watch;

use crate::{
    cache::{CacheConfig, ImageCache},
    error::Result,
    feed::{self, HttpFeed, WallpaperFeed},
    preload::{HttpPreloader, ImagePreloader, NoopPreloader},
    scheduler::{RotationState, RotationTimer},
    storage::{FileStorage, PreferenceStorage, THEME_KEY},
    theme::{THEME_ATTRIBUTE, ThemeTarget},
    wallpaper::WallpaperSet,
};

/// Point-in-time copy of the store state handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub theme: Theme,
    pub wallpapers: Vec<String>,
    pub cursor: usize,
    pub current_wallpaper: String,
}

/// Result of a wallpaper fetch. Failures are logged, never returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The list was replaced with `count` wallpapers.
    Updated { count: usize },
    /// The endpoint answered with no wallpapers; state unchanged.
    Empty,
    /// Transport or decode failure; state unchanged.
    Failed,
}

#[derive(Debug)]
struct State {
    theme: Theme,
    wallpapers: WallpaperSet,
}

impl State {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            theme: self.theme,
            wallpapers: self.wallpapers.images().to_vec(),
            cursor: self.wallpapers.cursor(),
            current_wallpaper: self.wallpapers.current().to_owned(),
        }
    }
}

/// State reachable from the rotation task.
#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    changes: watch::Sender<Snapshot>,
}

impl Shared {
    fn publish(&self, state: &State) {
        self.changes.send_replace(state.snapshot());
    }

    fn rotate(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.wallpapers.advance() {
            return false;
        }

        tracing::debug!(
            cursor = state.wallpapers.cursor(),
            wallpaper = state.wallpapers.current(),
            "Wallpaper rotated"
        );
        self.publish(&state);
        true
    }
}

/// Owner of theme and wallpaper rotation state.
pub struct PreferenceStore {
    shared: Arc<Shared>,
    rotation: Mutex<RotationTimer>,
    storage: Arc<dyn PreferenceStorage>,
    target: Arc<dyn ThemeTarget>,
    feed: Arc<dyn WallpaperFeed>,
    preloader: Arc<dyn ImagePreloader>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("state", &self.shared.state)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

impl PreferenceStore {
    /// Load the persisted theme and apply it before returning.
    pub fn new(
        storage: Arc<dyn PreferenceStorage>,
        target: Arc<dyn ThemeTarget>,
        feed: Arc<dyn WallpaperFeed>,
        preloader: Arc<dyn ImagePreloader>,
    ) -> Self {
        let theme = load_theme(storage.as_ref());
        let state = State {
            theme,
            wallpapers: WallpaperSet::default(),
        };
        let (changes, _) = watch::channel(state.snapshot());

        let store = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                changes,
            }),
            rotation: Mutex::new(RotationTimer::new()),
            storage,
            target,
            feed,
            preloader,
        };

        store.apply_theme();
        store
    }

    /// Wire up file storage, the HTTP feed and (if enabled) the preloader
    /// from `config`.
    pub fn from_config(config: &Config, target: Arc<dyn ThemeTarget>) -> Result<Self> {
        let storage = FileStorage::open(config.preferences_file()?)?;
        let client = feed::create_client(config)?;
        let feed = HttpFeed::from_config(client.clone(), config)?;

        let preloader: Arc<dyn ImagePreloader> = if config.preload {
            let cache = Arc::new(ImageCache::with_config(CacheConfig::from(config)));
            Arc::new(
                HttpPreloader::new(client, cache, config.preload_concurrency)
                    .with_base(feed.url().clone()),
            )
        } else {
            Arc::new(NoopPreloader)
        };

        Ok(Self::new(
            Arc::new(storage),
            target,
            Arc::new(feed),
            preloader,
        ))
    }

    /// Write the current theme onto the root `data-theme` attribute.
    pub fn apply_theme(&self) {
        let theme = self.theme();
        self.target.set_attribute(THEME_ATTRIBUTE, theme.as_str());
    }

    /// Flip between dark and light. Returns the new theme.
    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.shared.state.lock().unwrap();
            state.theme = state.theme.toggled();
            self.persist_theme(state.theme);
            self.shared.publish(&state);
            state.theme
        };

        self.apply_theme();
        theme
    }

    pub fn set_theme(&self, theme: Theme) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.theme = theme;
            self.persist_theme(theme);
            self.shared.publish(&state);
        }

        self.apply_theme();
    }

    /// Replace the wallpaper list from the feed.
    ///
    /// A non-empty answer rewinds to the first wallpaper and starts preloading
    /// every URL. Empty answers and failures leave the state untouched.
    pub async fn fetch_wallpapers(&self) -> FetchOutcome {
        let images = match self.feed.fetch().await {
            Ok(images) => images,
            Err(why) => {
                tracing::error!(?why, "Failed to fetch wallpapers");
                return FetchOutcome::Failed;
            }
        };

        if images.is_empty() {
            tracing::warn!("Wallpaper endpoint returned no images, keeping current list");
            return FetchOutcome::Empty;
        }

        let count = images.len();
        {
            let mut state = self.shared.state.lock().unwrap();
            state.wallpapers.replace(images);
            tracing::info!(
                count,
                wallpaper = state.wallpapers.current(),
                "Wallpapers updated"
            );
            self.shared.publish(&state);
        }

        self.preloader.preload(&self.wallpapers());
        FetchOutcome::Updated { count }
    }

    /// Advance to the next wallpaper. Does nothing with fewer than two.
    pub fn rotate_wallpaper(&self) -> bool {
        self.shared.rotate()
    }

    /// Rotate every `interval`, replacing any running rotation.
    ///
    /// Must be called from within a tokio runtime. A zero interval is an
    /// error and leaves the current rotation as it was.
    pub fn start_rotation(&self, interval: Duration) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        self.rotation.lock().unwrap().start(interval, move || {
            shared.rotate();
        })?;

        tracing::info!(interval_ms = interval.as_millis(), "Wallpaper rotation started");
        Ok(())
    }

    pub fn stop_rotation(&self) {
        if self.rotation.lock().unwrap().stop() {
            tracing::info!("Wallpaper rotation stopped");
        }
    }

    pub fn rotation_state(&self) -> RotationState {
        self.rotation.lock().unwrap().state()
    }

    pub fn theme(&self) -> Theme {
        self.shared.state.lock().unwrap().theme
    }

    pub fn wallpapers(&self) -> Vec<String> {
        self.shared.state.lock().unwrap().wallpapers.images().to_vec()
    }

    pub fn cursor(&self) -> usize {
        self.shared.state.lock().unwrap().wallpapers.cursor()
    }

    pub fn current_wallpaper(&self) -> String {
        self.shared
            .state
            .lock()
            .unwrap()
            .wallpapers
            .current()
            .to_owned()
    }

    /// Decoded image for the current wallpaper, once preloading has finished
    /// for it. `None` before the first fetch or while the download is pending.
    pub fn cached_wallpaper(&self) -> Option<Arc<DynamicImage>> {
        let current = self.current_wallpaper();
        if current.is_empty() {
            return None;
        }
        self.preloader.cached(&current)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.state.lock().unwrap().snapshot()
    }

    /// Receiver that observes every published change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.changes.subscribe()
    }

    fn persist_theme(&self, theme: Theme) {
        if let Err(why) = self.storage.set(THEME_KEY, theme.as_str()) {
            tracing::error!(?why, %theme, "Failed to persist theme");
        }
    }
}

impl Drop for PreferenceStore {
    fn drop(&mut self) {
        self.stop_rotation();
    }
}

/// Read the stored theme, replacing anything unrecognized with the default.
fn load_theme(storage: &dyn PreferenceStorage) -> Theme {
    match storage.get(THEME_KEY) {
        Ok(Some(raw)) => match raw.parse::<Theme>() {
            Ok(theme) => theme,
            Err(why) => {
                let theme = Theme::default();
                tracing::warn!(%why, %theme, "Resetting stored theme");
                if let Err(why) = storage.set(THEME_KEY, theme.as_str()) {
                    tracing::error!(?why, "Failed to persist theme");
                }
                theme
            }
        },
        Ok(None) => Theme::default(),
        Err(why) => {
            tracing::error!(?why, "Failed to read stored theme");
            Theme::default()
        }
    }
}
