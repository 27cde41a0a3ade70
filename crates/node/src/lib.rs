//! Document-model types for the bridge.
//!
//! Nodes are plain data. The tree they form is owned by
//! `scene_graph::SceneGraph`; a node only records its parent's id and the
//! ordered ids of its children.

mod node;
mod node_id;
mod node_type;
mod paint;
mod property;
mod text;

pub use node::Node;
pub use node_id::NodeId;
pub use node_type::NodeType;
pub use paint::{BlendMode, ColorStop, Effect, EffectType, Paint, Rgb, Rgba, Vector};
pub use property::{PropertyError, PropertyPatch};
pub use text::{FontName, LetterSpacing, LineHeight, TextAlignHorizontal, TextAlignVertical, TextProps};
