use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    #[error("Invalid value for property {property}: expected {expected}")]
    InvalidValue {
        property: String,
        expected: &'static str,
    },
}

/// A typed assignment to one of a node's scalar properties.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyPatch {
    Name(String),
    X(f32),
    Y(f32),
    Width(f32),
    Height(f32),
    Rotation(f32),
    Opacity(f32),
    Visible(bool),
    Locked(bool),
    CornerRadius(f32),
    StrokeWeight(f32),
    Characters(String),
    FontSize(f32),
}

impl PropertyPatch {
    /// Parse a wire `(key, value)` pair.
    ///
    /// Returns `Ok(None)` for keys that aren't scalar properties. Style
    /// properties (`fills`, `strokes`, `effects`) are not handled here.
    pub fn parse(key: &str, value: &Value) -> Result<Option<Self>, PropertyError> {
        let patch = match key {
            "name" => Self::Name(string(key, value)?),
            "x" => Self::X(number(key, value)?),
            "y" => Self::Y(number(key, value)?),
            "width" => Self::Width(number(key, value)?),
            "height" => Self::Height(number(key, value)?),
            "rotation" => Self::Rotation(number(key, value)?),
            "opacity" => Self::Opacity(number(key, value)?),
            "visible" => Self::Visible(boolean(key, value)?),
            "locked" => Self::Locked(boolean(key, value)?),
            "cornerRadius" => Self::CornerRadius(number(key, value)?),
            "strokeWeight" => Self::StrokeWeight(number(key, value)?),
            "characters" => Self::Characters(string(key, value)?),
            "fontSize" => Self::FontSize(number(key, value)?),
            _ => return Ok(None),
        };
        Ok(Some(patch))
    }
}

fn number(key: &str, value: &Value) -> Result<f32, PropertyError> {
    value
        .as_f64()
        .map(|n| n as f32)
        .ok_or_else(|| invalid(key, "number"))
}

fn string(key: &str, value: &Value) -> Result<String, PropertyError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(key, "string"))
}

fn boolean(key: &str, value: &Value) -> Result<bool, PropertyError> {
    value.as_bool().ok_or_else(|| invalid(key, "boolean"))
}

fn invalid(key: &str, expected: &'static str) -> PropertyError {
    PropertyError::InvalidValue {
        property: key.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_properties() {
        assert_eq!(
            PropertyPatch::parse("x", &json!(12)).unwrap(),
            Some(PropertyPatch::X(12.0))
        );
        assert_eq!(
            PropertyPatch::parse("visible", &json!(false)).unwrap(),
            Some(PropertyPatch::Visible(false))
        );
        assert_eq!(
            PropertyPatch::parse("name", &json!("Card")).unwrap(),
            Some(PropertyPatch::Name("Card".to_string()))
        );
    }

    #[test]
    fn test_unknown_keys_are_not_patches() {
        assert_eq!(PropertyPatch::parse("frobnicate", &json!(1)).unwrap(), None);
        assert_eq!(PropertyPatch::parse("fills", &json!([])).unwrap(), None);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let err = PropertyPatch::parse("x", &json!("left")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for property x: expected number"
        );
    }
}
