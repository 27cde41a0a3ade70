//! Internal paint and effect representation.
//!
//! These are the strict forms stored on nodes. Loosely typed descriptors
//! from remote callers are converted into them by the bridge's style
//! normalizer.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// RGB color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A stop along a gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f32,
    pub color: Rgba,
}

/// Identity transform for linear gradients (left to right).
pub const IDENTITY_GRADIENT_TRANSFORM: [[f32; 3]; 2] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// A paint used for fills and strokes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        color: Rgb,
        opacity: f32,
        #[serde(default = "default_visible")]
        visible: bool,
    },
    #[serde(rename_all = "camelCase")]
    GradientLinear {
        gradient_transform: [[f32; 3]; 2],
        gradient_stops: Vec<ColorStop>,
        #[serde(default = "default_visible")]
        visible: bool,
    },
}

fn default_visible() -> bool {
    true
}

impl Paint {
    pub fn solid(color: Rgb, opacity: f32) -> Self {
        Self::Solid {
            color,
            opacity,
            visible: true,
        }
    }

    /// Opaque white, the fallback for anything that can't be understood.
    pub fn white() -> Self {
        Self::solid(Rgb::WHITE, 1.0)
    }

    pub fn black() -> Self {
        Self::solid(Rgb::BLACK, 1.0)
    }

    pub fn linear_gradient(stops: Vec<ColorStop>) -> Self {
        Self::GradientLinear {
            gradient_transform: IDENTITY_GRADIENT_TRANSFORM,
            gradient_stops: stops,
            visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Self::Solid { visible, .. } | Self::GradientLinear { visible, .. } => *visible,
        }
    }
}

/// A 2D offset as it appears on the wire (`{x, y}`).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    #[default]
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    PassThrough,
    #[default]
    Normal,
    Darken,
    Multiply,
    ColorBurn,
    Lighten,
    Screen,
    ColorDodge,
    Overlay,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// A visual effect (shadow or blur).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub color: Rgba,
    pub offset: Vector,
    pub radius: f32,
    pub visible: bool,
    pub blend_mode: BlendMode,
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            effect_type: EffectType::DropShadow,
            color: Rgba::BLACK,
            offset: Vector::default(),
            radius: 4.0,
            visible: true,
            blend_mode: BlendMode::Normal,
        }
    }
}
