// SPDX-License-Identifier: MPL-2.0

//! The ordered wallpaper list and its rotation cursor.

/// Wallpaper URLs in server order plus the index of the one on display.
///
/// The cursor is always a valid index while the set is non-empty and is `0`
/// when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WallpaperSet {
    images: Vec<String>,
    cursor: usize,
}

impl WallpaperSet {
    pub fn new(images: Vec<String>) -> Self {
        Self { images, cursor: 0 }
    }

    /// Replace the whole set and rewind to the first image.
    ///
    /// An empty list leaves the current set untouched and returns `false`.
    pub fn replace(&mut self, images: Vec<String>) -> bool {
        if images.is_empty() {
            return false;
        }

        self.images = images;
        self.cursor = 0;
        true
    }

    /// Step to the next image, wrapping at the end.
    ///
    /// Returns `false` without moving when there is nothing to rotate to.
    pub fn advance(&mut self) -> bool {
        if self.images.len() <= 1 {
            return false;
        }

        self.cursor = (self.cursor + 1) % self.images.len();
        true
    }

    /// URL at the cursor, or `""` when empty.
    pub fn current(&self) -> &str {
        self.images
            .get(self.cursor)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
