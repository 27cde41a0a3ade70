use bridge::{FontError, FontLoader};
use node::FontName;
use smol::future::{self, BoxedLocal};
use std::collections::HashSet;

/// The fonts this host has installed. Loading one that isn't installed fails.
pub struct FontRegistry {
    installed: HashSet<FontName>,
}

impl FontRegistry {
    pub fn new(fonts: impl IntoIterator<Item = FontName>) -> Self {
        Self {
            installed: fonts.into_iter().collect(),
        }
    }

    pub fn contains(&self, font: &FontName) -> bool {
        self.installed.contains(font)
    }
}

impl FontLoader for FontRegistry {
    fn load_font(&self, font: FontName) -> BoxedLocal<Result<(), FontError>> {
        let result = if self.contains(&font) {
            log::debug!("Loaded font {font}");
            Ok(())
        } else {
            Err(FontError {
                font,
                reason: "font is not installed".to_string(),
            })
        };
        Box::pin(future::ready(result))
    }
}
