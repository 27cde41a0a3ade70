//! Narrow contracts with the host's collaborators.
//!
//! The bridge never loads fonts, renders pixels or moves bytes itself. It
//! asks the host through these traits. Futures are `!Send` because
//! everything runs on the host's single event-loop thread.

use crate::OutboundMessage;
use node::FontName;
use scene_graph::Snapshot;
use serde::{Deserialize, Serialize};
use smol::future::BoxedLocal;
use strum_macros::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Failed to load font {font}: {reason}")]
pub struct FontError {
    pub font: FontName,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct RenderError(pub String);

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// Loads font resources. Text content can only be assigned once the
/// node's font has loaded.
pub trait FontLoader {
    fn load_font(&self, font: FontName) -> BoxedLocal<Result<(), FontError>>;
}

/// Renders a detached subtree to encoded image bytes.
pub trait Renderer {
    fn export(
        &self,
        snapshot: Snapshot,
        settings: ExportSettings,
    ) -> BoxedLocal<Result<Vec<u8>, RenderError>>;
}

/// Carries outbound envelopes to the transport adapter.
pub trait Transport {
    fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    Pdf,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub scale: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_settings_defaults() {
        let settings: ExportSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, ExportSettings::default());

        let settings: ExportSettings =
            serde_json::from_value(json!({"format": "SVG", "scale": 2})).unwrap();
        assert_eq!(settings.format, ExportFormat::Svg);
        assert_eq!(settings.scale, 2.0);
        assert_eq!(settings.format.to_string(), "SVG");
    }

    #[test]
    fn test_font_error_message() {
        let err = FontError {
            font: FontName::new("Inter", "Black"),
            reason: "not installed".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load font Inter Black: not installed");
    }
}
