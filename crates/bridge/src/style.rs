//! Style normalizer.
//!
//! Converts loosely typed paint, stroke and effect descriptors sent by
//! remote callers into the strict forms stored on nodes. Nothing here ever
//! fails: an unusable fill turns into opaque white, and every missing
//! stroke or effect field falls back to its default.

use node::{BlendMode, ColorStop, Effect, EffectType, Paint, Rgb, Rgba, Vector};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// A `{r, g, b, a?}` color as sent on the wire.
#[derive(Deserialize)]
struct ColorInput {
    r: f32,
    g: f32,
    b: f32,
    #[serde(default)]
    a: Option<f32>,
}

impl ColorInput {
    fn in_range(&self) -> bool {
        [self.r, self.g, self.b, self.a.unwrap_or(1.0)]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }

    fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    fn rgba(&self) -> Rgba {
        self.rgb().with_alpha(self.a.unwrap_or(1.0))
    }
}

#[derive(Deserialize)]
struct StopInput {
    position: f32,
    color: ColorInput,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum FillInput {
    Solid {
        color: ColorInput,
    },
    #[serde(rename_all = "camelCase")]
    GradientLinear { gradient_stops: Vec<StopInput> },
}

/// A descriptor that can't be turned into a paint.
struct Malformed;

fn fill_from_value(value: &Value) -> Result<Paint, Malformed> {
    let input: FillInput = serde_json::from_value(value.clone()).map_err(|_| Malformed)?;
    match input {
        FillInput::Solid { color } if color.in_range() => {
            Ok(Paint::solid(color.rgb(), color.a.unwrap_or(1.0)))
        }
        FillInput::GradientLinear { gradient_stops }
            if !gradient_stops.is_empty() && gradient_stops.iter().all(|s| s.color.in_range()) =>
        {
            let stops = gradient_stops
                .into_iter()
                .map(|stop| ColorStop {
                    position: stop.position.clamp(0.0, 1.0),
                    color: stop.color.rgba(),
                })
                .collect();
            Ok(Paint::linear_gradient(stops))
        }
        _ => Err(Malformed),
    }
}

/// Normalizes a fill descriptor, or a sequence of them.
///
/// If any descriptor is unrecognized or malformed the whole result is a
/// single opaque white solid fill.
pub fn normalize_fill(input: &Value) -> Vec<Paint> {
    let descriptors = match input {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };

    let paints: Result<Vec<Paint>, Malformed> =
        descriptors.into_iter().map(fill_from_value).collect();
    match paints {
        Ok(paints) if !paints.is_empty() => paints,
        _ => {
            log::warn!("Unrecognized fill {input}, falling back to white");
            vec![Paint::white()]
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct StrokeInput {
    #[serde(rename = "type")]
    kind: Option<String>,
    color: Option<ColorInput>,
    gradient_stops: Option<Vec<StopInput>>,
}

/// Normalizes a stroke descriptor, or a sequence of them.
///
/// `type` defaults to `SOLID` and `color` to black.
pub fn normalize_stroke(input: &Value) -> Vec<Paint> {
    match input {
        Value::Array(items) => items.iter().map(stroke_from_value).collect(),
        other => vec![stroke_from_value(other)],
    }
}

fn stroke_from_value(value: &Value) -> Paint {
    let input: StrokeInput = serde_json::from_value(value.clone()).unwrap_or_else(|_| {
        log::warn!("Malformed stroke {value}, using defaults");
        StrokeInput::default()
    });

    if input.kind.as_deref() == Some("GRADIENT_LINEAR") {
        if let Some(stops) = input.gradient_stops.filter(|stops| !stops.is_empty()) {
            return Paint::linear_gradient(
                stops
                    .into_iter()
                    .map(|stop| ColorStop {
                        position: stop.position.clamp(0.0, 1.0),
                        color: stop.color.rgba(),
                    })
                    .collect(),
            );
        }
    }

    match input.color {
        Some(color) => Paint::solid(color.rgb(), color.a.unwrap_or(1.0)),
        None => Paint::black(),
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct EffectInput {
    #[serde(rename = "type")]
    kind: Option<String>,
    color: Option<ColorInput>,
    offset: Option<Vector>,
    radius: Option<f32>,
    visible: Option<bool>,
    blend_mode: Option<String>,
}

/// Normalizes a list of effect descriptors. Each missing field takes its
/// default independently.
pub fn normalize_effects(input: &Value) -> Vec<Effect> {
    match input {
        Value::Array(items) => items.iter().map(effect_from_value).collect(),
        Value::Null => Vec::new(),
        other => vec![effect_from_value(other)],
    }
}

fn effect_from_value(value: &Value) -> Effect {
    let input: EffectInput = serde_json::from_value(value.clone()).unwrap_or_else(|_| {
        log::warn!("Malformed effect {value}, using defaults");
        EffectInput::default()
    });
    let defaults = Effect::default();

    let effect_type = input
        .kind
        .as_deref()
        .map(|kind| {
            EffectType::from_str(kind).unwrap_or_else(|_| {
                log::warn!("Unknown effect type {kind}, using DROP_SHADOW");
                EffectType::default()
            })
        })
        .unwrap_or_default();
    let blend_mode = input
        .blend_mode
        .as_deref()
        .and_then(|mode| BlendMode::from_str(mode).ok())
        .unwrap_or_default();

    Effect {
        effect_type,
        color: input.color.map(|c| c.rgba()).unwrap_or(defaults.color),
        offset: input.offset.unwrap_or(defaults.offset),
        radius: input.radius.unwrap_or(defaults.radius),
        visible: input.visible.unwrap_or(defaults.visible),
        blend_mode,
    }
}
