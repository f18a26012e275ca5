// SPDX-License-Identifier: MPL-2.0

//! Presentation boundary for the active theme.
//!
//! The rendering layer styles itself off a single `data-theme` attribute on
//! its root. The store only ever writes that attribute through
//! [`ThemeTarget`].

use std::{collections::BTreeMap, sync::RwLock};

/// Root attribute carrying the theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Receiver of root presentation attributes.
pub trait ThemeTarget: Send + Sync {
    fn set_attribute(&self, name: &str, value: &str);
}

/// In-process root attribute map read by the rendering layer.
#[derive(Debug, Default)]
pub struct RootAttributes {
    attributes: RwLock<BTreeMap<String, String>>,
}

impl RootAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.attributes.read().unwrap().get(name).cloned()
    }

    /// Shorthand for the `data-theme` value.
    pub fn theme(&self) -> Option<String> {
        self.get(THEME_ATTRIBUTE)
    }
}

impl ThemeTarget for RootAttributes {
    fn set_attribute(&self, name: &str, value: &str) {
        let previous = self
            .attributes
            .write()
            .unwrap()
            .insert(name.to_owned(), value.to_owned());

        if previous.as_deref() != Some(value) {
            tracing::debug!(name, value, "Root attribute changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_overwrite() {
        let root = RootAttributes::new();
        assert_eq!(root.theme(), None);

        root.set_attribute(THEME_ATTRIBUTE, "dark");
        root.set_attribute(THEME_ATTRIBUTE, "light");
        root.set_attribute("lang", "zh");

        assert_eq!(root.theme().as_deref(), Some("light"));
        assert_eq!(root.get("lang").as_deref(), Some("zh"));
    }
}
