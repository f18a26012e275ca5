// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

/// Errors raised by the preference store and its collaborators.
///
/// Most of these never reach a store caller: fetch and preload failures are
/// logged where they happen. They surface from the collaborators themselves
/// and from startup paths (storage, localization, configuration).
#[derive(Debug, thiserror::Error)]
pub enum BackdropError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The HTTP request could not be completed.
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body was not a wallpaper list.
    #[error("failed to decode wallpaper list from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Downloaded bytes were not a decodable image.
    #[error("failed to decode image {url}")]
    ImageDecode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading or writing the preferences file failed.
    #[error("preference storage error at {path}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences at {path}")]
    StorageParse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize preferences: {0}")]
    StorageSerialize(#[from] ron::Error),

    /// Rotation was requested with a zero interval.
    #[error("rotation interval must be greater than zero")]
    InvalidInterval,

    /// A background task was requested outside of a tokio runtime.
    #[error("no tokio runtime available to run {what}")]
    NoRuntime { what: &'static str },

    /// Locale catalogs could not be loaded.
    #[error("localization error: {0}")]
    Localization(#[from] i18n_embed::I18nEmbedError),

    #[error("invalid locale identifier {locale:?}")]
    InvalidLocale {
        locale: &'static str,
        #[source]
        source: i18n_embed::unic_langid::LanguageIdentifierError,
    },

    /// The embedded catalogs do not include a required locale.
    #[error("no catalog embedded for locale {locale:?}")]
    MissingCatalog { locale: &'static str },

    #[error("configuration error: {0}")]
    Config(#[from] backdrop_config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackdropError>;
