// SPDX-License-Identifier: MPL-2.0

//! backdrop - keeps the front end's wallpaper rotating
//!
//! Loads the persisted theme, fetches the wallpaper list from the backend and
//! rotates through it until interrupted.

use std::sync::Arc;
use std::time::Duration;

use backdrop::{Config, FetchOutcome, PreferenceStore, fl, i18n, theme::RootAttributes};
use eyre::WrapErr;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // catalogs are compiled in; a broken one aborts startup
    let localization = i18n::build_localization().wrap_err("failed to load locale catalogs")?;
    tracing::debug!(?localization, "Localization ready");

    let config = Config::load().wrap_err("failed to load configuration")?;
    let root = Arc::new(RootAttributes::new());
    let store = PreferenceStore::from_config(&config, root.clone())
        .wrap_err("failed to initialize preferences")?;

    tracing::info!("{}", fl!("theme-current", theme = store.theme().as_str()));

    let mut changes = store.subscribe();

    match store.fetch_wallpapers().await {
        FetchOutcome::Updated { count } => {
            tracing::info!("{}", fl!("wallpapers-updated", count = count.to_string()));
        }
        FetchOutcome::Empty => tracing::warn!("{}", fl!("wallpapers-empty")),
        FetchOutcome::Failed => tracing::warn!("{}", fl!("wallpapers-failed")),
    }

    store
        .start_rotation(config.rotation_interval())
        .wrap_err("failed to start wallpaper rotation")?;
    tracing::info!(
        "{}",
        fl!(
            "rotation-started",
            seconds = seconds(config.rotation_interval())
        )
    );

    let mut shown = store.current_wallpaper();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }

                let current = changes.borrow_and_update().current_wallpaper.clone();
                if current != shown {
                    tracing::info!("{}", fl!("wallpaper-changed", url = current.as_str()));
                    match store.cached_wallpaper() {
                        Some(image) => tracing::debug!(
                            width = image.width(),
                            height = image.height(),
                            "Showing preloaded wallpaper"
                        ),
                        None => tracing::debug!("Wallpaper not preloaded yet"),
                    }
                    shown = current;
                }
            }
        }
    }

    store.stop_rotation();
    tracing::info!(theme = ?root.theme(), "{}", fl!("rotation-stopped"));

    Ok(())
}

/// Interval in seconds for display, keeping sub-second precision.
fn seconds(interval: Duration) -> String {
    interval.as_secs_f64().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_keeps_fractions() {
        assert_eq!(seconds(Duration::from_millis(30_000)), "30");
        assert_eq!(seconds(Duration::from_millis(500)), "0.5");
        assert_eq!(seconds(Duration::from_millis(1_250)), "1.25");
    }
}
