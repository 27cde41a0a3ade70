use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// A font family and style, e.g. `Inter` / `Regular`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontName {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignHorizontal {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignVertical {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterSpacing {
    Pixels { value: f32 },
    Percent { value: f32 },
}

impl Default for LetterSpacing {
    fn default() -> Self {
        Self::Percent { value: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineHeight {
    Pixels {
        value: f32,
    },
    Percent {
        value: f32,
    },
    #[default]
    Auto,
}

/// Text content and character styling for `TEXT` nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub characters: String,
    pub font_name: FontName,
    pub font_size: f32,
    pub font_weight: u16,
    pub text_align_horizontal: TextAlignHorizontal,
    pub text_align_vertical: TextAlignVertical,
    pub letter_spacing: LetterSpacing,
    pub line_height: LineHeight,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            characters: String::new(),
            font_name: FontName::default(),
            font_size: 12.0,
            font_weight: 400,
            text_align_horizontal: TextAlignHorizontal::Left,
            text_align_vertical: TextAlignVertical::Top,
            letter_spacing: LetterSpacing::default(),
            line_height: LineHeight::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_font_is_inter_regular() {
        assert_eq!(FontName::default().to_string(), "Inter Regular");
    }

    #[test]
    fn test_line_height_wire_shape() {
        assert_eq!(
            serde_json::to_value(LineHeight::Auto).unwrap(),
            json!({"unit": "AUTO"})
        );
        assert_eq!(
            serde_json::to_value(LineHeight::Pixels { value: 20.0 }).unwrap(),
            json!({"unit": "PIXELS", "value": 20.0})
        );
    }
}
