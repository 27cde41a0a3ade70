use crate::{Effect, NodeId, NodeType, Paint, PropertyPatch, TextProps};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest width/height a scene node may be resized to.
const MIN_SIZE: f32 = 0.01;

/// A node in the document.
///
/// Style capabilities are modelled as `Option`s: a `None` field means the
/// node type does not expose that property at all, which is different from
/// an empty paint list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,

    // Hierarchy
    /// Parent id. Recorded for lookup only, never followed during traversal.
    pub parent: Option<NodeId>,
    /// Ordered child ids, owned by this node.
    pub children: Vec<NodeId>,

    // Geometry, relative to the parent
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub opacity: f32,
    pub visible: bool,
    pub locked: bool,

    // Style
    pub fills: Option<Vec<Paint>>,
    pub strokes: Option<Vec<Paint>>,
    pub stroke_weight: Option<f32>,
    pub effects: Option<Vec<Effect>>,
    pub corner_radius: Option<f32>,

    // Components
    /// Content-addressed key, set on `COMPONENT` nodes.
    pub key: Option<String>,
    /// The master component of an `INSTANCE`.
    pub main_component: Option<NodeId>,

    pub text: Option<TextProps>,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, name: impl Into<String>) -> Self {
        let default_fill = match node_type {
            NodeType::Text => Paint::black(),
            _ => Paint::white(),
        };

        Self {
            id,
            name: name.into(),
            node_type,
            parent: None,
            children: Vec::new(),
            position: Vec2::ZERO,
            size: Vec2::splat(100.0),
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            fills: node_type.has_fills().then(|| vec![default_fill]),
            strokes: node_type.has_strokes().then(Vec::new),
            stroke_weight: node_type.has_strokes().then_some(1.0),
            effects: node_type.has_effects().then(Vec::new),
            corner_radius: node_type.has_corner_radius().then_some(0.0),
            key: None,
            main_component: None,
            text: (node_type == NodeType::Text).then(TextProps::default),
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.resize(width, height);
        self
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width.max(MIN_SIZE), height.max(MIN_SIZE));
    }

    /// Whether the node exposes the named wire property.
    pub fn exposes(&self, property: &str) -> bool {
        let scene = self.node_type.is_scene_node();
        match property {
            "name" => true,
            "x" | "y" | "width" | "height" | "rotation" | "opacity" | "visible" | "locked" => {
                scene
            }
            "fills" => self.fills.is_some(),
            "strokes" => self.strokes.is_some(),
            "strokeWeight" => self.stroke_weight.is_some(),
            "effects" => self.effects.is_some(),
            "cornerRadius" => self.corner_radius.is_some(),
            "characters" | "fontSize" => self.text.is_some(),
            _ => false,
        }
    }

    /// Apply a validated property patch.
    ///
    /// Patches for properties this node doesn't expose are ignored.
    pub fn apply(&mut self, patch: PropertyPatch) {
        match patch {
            PropertyPatch::Name(name) => self.name = name,
            PropertyPatch::X(x) => self.position.x = x,
            PropertyPatch::Y(y) => self.position.y = y,
            PropertyPatch::Width(width) => self.resize(width, self.size.y),
            PropertyPatch::Height(height) => self.resize(self.size.x, height),
            PropertyPatch::Rotation(rotation) => self.rotation = rotation,
            PropertyPatch::Opacity(opacity) => self.opacity = opacity.clamp(0.0, 1.0),
            PropertyPatch::Visible(visible) => self.visible = visible,
            PropertyPatch::Locked(locked) => self.locked = locked,
            PropertyPatch::CornerRadius(radius) => {
                if let Some(corner_radius) = &mut self.corner_radius {
                    *corner_radius = radius.max(0.0);
                }
            }
            PropertyPatch::StrokeWeight(weight) => {
                if let Some(stroke_weight) = &mut self.stroke_weight {
                    *stroke_weight = weight.max(0.0);
                }
            }
            PropertyPatch::Characters(characters) => {
                if let Some(text) = &mut self.text {
                    text.characters = characters;
                }
            }
            PropertyPatch::FontSize(size) => {
                if let Some(text) = &mut self.text {
                    text.font_size = size.max(1.0);
                }
            }
        }
    }

    /// Scale the node's size by a (possibly non-uniform) factor.
    ///
    /// Children are handled by the scene graph.
    pub fn rescale(&mut self, factor: Vec2) {
        let size = self.size * factor;
        self.resize(size.x, size.y);
        if let Some(radius) = &mut self.corner_radius {
            *radius *= factor.min_element();
        }
        if let Some(text) = &mut self.text {
            text.font_size *= factor.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgb;

    fn node(node_type: NodeType) -> Node {
        Node::new(NodeId::default(), node_type, "Test")
    }

    #[test]
    fn test_capabilities_follow_type() {
        let rect = node(NodeType::Rectangle);
        assert_eq!(rect.fills, Some(vec![Paint::white()]));
        assert!(rect.corner_radius.is_some());
        assert!(rect.text.is_none());

        let page = node(NodeType::Page);
        assert!(page.fills.is_none());
        assert!(page.strokes.is_none());
        assert!(page.effects.is_none());

        let text = node(NodeType::Text);
        assert_eq!(text.fills, Some(vec![Paint::solid(Rgb::BLACK, 1.0)]));
        assert!(text.corner_radius.is_none());
    }

    #[test]
    fn test_exposes() {
        let rect = node(NodeType::Rectangle);
        assert!(rect.exposes("x"));
        assert!(rect.exposes("cornerRadius"));
        assert!(!rect.exposes("characters"));
        assert!(!rect.exposes("somethingElse"));

        let page = node(NodeType::Page);
        assert!(page.exposes("name"));
        assert!(!page.exposes("x"));
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut rect = node(NodeType::Rectangle);
        rect.resize(0.0, -5.0);
        assert_eq!(rect.size, Vec2::splat(MIN_SIZE));
    }

    #[test]
    fn test_rescale_is_non_uniform() {
        let mut rect = node(NodeType::Rectangle).with_size(100.0, 50.0);
        rect.corner_radius = Some(10.0);
        rect.rescale(Vec2::new(2.0, 0.5));
        assert_eq!(rect.size, Vec2::new(200.0, 25.0));
        assert_eq!(rect.corner_radius, Some(5.0));
    }

    #[test]
    fn test_apply_ignores_unexposed_patch() {
        let mut rect = node(NodeType::Rectangle);
        rect.apply(PropertyPatch::Characters("Hi".to_string()));
        assert!(rect.text.is_none());

        rect.apply(PropertyPatch::Width(40.0));
        assert_eq!(rect.size.x, 40.0);
    }
}
