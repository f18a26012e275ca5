// SPDX-License-Identifier: MPL-2.0

//! Localization bootstrap.
//!
//! Two Fluent catalogs are embedded at build time: `zh` is the active locale
//! and `en` the fallback consulted for keys `zh` does not define.

use std::collections::HashMap;

use i18n_embed::{
    DefaultLocalizer, LanguageLoader, Localizer,
    fluent::{FluentLanguageLoader, fluent_language_loader},
    unic_langid::LanguageIdentifier,
};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;

use crate::error::{BackdropError, Result};

#[derive(RustEmbed)]
#[folder = "i18n"]
struct Localizations;

pub const ACTIVE_LOCALE: &str = "zh";
pub const FALLBACK_LOCALE: &str = "en";

/// Process-wide loader backing the [`fl!`](crate::fl) macro.
///
/// Binaries call [`build_localization`] first so a broken catalog is reported
/// as an error rather than a panic here.
pub static LANGUAGE_LOADER: Lazy<FluentLanguageLoader> =
    Lazy::new(|| load_catalogs().expect("Error loading locale catalogs"));

fn load_catalogs() -> Result<FluentLanguageLoader> {
    let active: LanguageIdentifier =
        ACTIVE_LOCALE
            .parse()
            .map_err(|source| BackdropError::InvalidLocale {
                locale: ACTIVE_LOCALE,
                source,
            })?;

    let loader = fluent_language_loader!();
    loader.set_use_isolating(false);

    let selected = DefaultLocalizer::new(&loader, &Localizations).select(&[active.clone()])?;
    if !selected.contains(&active) {
        return Err(BackdropError::MissingCatalog {
            locale: ACTIVE_LOCALE,
        });
    }

    tracing::debug!(
        languages = ?selected,
        fallback = %loader.fallback_language(),
        "Locale catalogs loaded"
    );

    Ok(loader)
}

/// Read-only translation context.
pub struct Localization {
    loader: FluentLanguageLoader,
}

impl std::fmt::Debug for Localization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localization")
            .field("languages", &self.loader.current_languages())
            .field("fallback", self.loader.fallback_language())
            .finish()
    }
}

impl Localization {
    pub fn build() -> Result<Self> {
        Ok(Self {
            loader: load_catalogs()?,
        })
    }

    /// Translate `key`, falling back to `en` when `zh` lacks it.
    pub fn t(&self, key: &str) -> String {
        self.loader.get(key)
    }

    pub fn t_args(&self, key: &str, args: &[(&str, String)]) -> String {
        let args: HashMap<&str, String> = args.iter().cloned().collect();
        self.loader.get_args(key, args)
    }

    /// Whether any loaded catalog defines `key`.
    pub fn has(&self, key: &str) -> bool {
        self.loader.has(key)
    }

    pub fn active_locale(&self) -> Option<LanguageIdentifier> {
        self.loader.current_languages().into_iter().next()
    }

    pub fn fallback_locale(&self) -> &LanguageIdentifier {
        self.loader.fallback_language()
    }

    pub fn loader(&self) -> &FluentLanguageLoader {
        &self.loader
    }
}

/// Build the translation context with `zh` active and `en` as fallback.
pub fn build_localization() -> Result<Localization> {
    Localization::build()
}

/// Get a localized string
#[macro_export]
macro_rules! fl {
    ($message_id:literal) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id)
    }};
    ($message_id:literal, $($args:expr),*) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id, $($args),*)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locales() {
        let localization = build_localization().unwrap();
        assert_eq!(
            localization.active_locale().map(|l| l.to_string()).as_deref(),
            Some(ACTIVE_LOCALE)
        );
        assert_eq!(localization.fallback_locale().to_string(), FALLBACK_LOCALE);
    }

    #[test]
    fn test_active_locale_wins() {
        let localization = build_localization().unwrap();
        assert_eq!(localization.t("theme-dark"), "深色");
        assert_eq!(localization.t("theme-toggle"), "切换主题");
    }

    #[test]
    fn test_missing_key_falls_back_to_english() {
        let localization = build_localization().unwrap();
        assert!(localization.has("preload-hint"));
        assert_eq!(
            localization.t("preload-hint"),
            "Wallpapers are downloaded in the background for faster switching"
        );
    }

    #[test]
    fn test_unknown_key() {
        let localization = build_localization().unwrap();
        assert!(!localization.has("no-such-key"));
    }

    #[test]
    fn test_arguments() {
        let localization = build_localization().unwrap();
        assert_eq!(
            localization.t_args("wallpapers-updated", &[("count", "3".to_owned())]),
            "已加载 3 张壁纸"
        );
    }

    #[test]
    fn test_global_loader_macro() {
        assert_eq!(crate::fl!("theme-light"), "浅色");
        assert_eq!(
            crate::fl!("wallpaper-changed", url = "a.png"),
            "壁纸已切换为 a.png"
        );
    }
}
