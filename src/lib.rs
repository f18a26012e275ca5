// SPDX-License-Identifier: MPL-2.0

//! Theme and wallpaper preferences for the backdrop front end.
//!
//! [`PreferenceStore`] owns the persisted light/dark theme and a rotating list
//! of wallpapers fetched from the backend. [`i18n`] builds the translation
//! context used by the rendering layer. The two do not interact.

pub mod cache;
pub mod error;
pub mod feed;
pub mod i18n;
pub mod preload;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod theme;
pub mod wallpaper;

#[cfg(test)]
mod test_support;

pub use backdrop_config::{Config, Theme};
pub use error::{BackdropError, Result};
pub use i18n::{Localization, build_localization};
pub use scheduler::{DEFAULT_ROTATION_INTERVAL, RotationState};
pub use store::{FetchOutcome, PreferenceStore, Snapshot};
