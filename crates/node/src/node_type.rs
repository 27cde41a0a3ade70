use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The type of a document node.
///
/// Wire form is SCREAMING_SNAKE_CASE (`"RECTANGLE"`, `"PAGE"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Document,
    Page,
    Frame,
    Group,
    Component,
    Instance,
    Text,
    Rectangle,
    Ellipse,
    Vector,
}

impl NodeType {
    /// Whether nodes of this type own an ordered list of children.
    pub fn has_children(self) -> bool {
        matches!(
            self,
            Self::Document | Self::Page | Self::Frame | Self::Group | Self::Component | Self::Instance
        )
    }

    /// Whether newly created nodes may be appended to a node of this type.
    pub fn accepts_appended_children(self) -> bool {
        matches!(self, Self::Page | Self::Frame | Self::Group)
    }

    /// Whether the node sits on the canvas (has x/y/size, opacity, visibility).
    pub fn is_scene_node(self) -> bool {
        !matches!(self, Self::Document | Self::Page)
    }

    pub fn has_fills(self) -> bool {
        matches!(
            self,
            Self::Frame
                | Self::Component
                | Self::Instance
                | Self::Text
                | Self::Rectangle
                | Self::Ellipse
                | Self::Vector
        )
    }

    pub fn has_strokes(self) -> bool {
        self.has_fills()
    }

    pub fn has_effects(self) -> bool {
        self.has_fills() || self == Self::Group
    }

    pub fn has_corner_radius(self) -> bool {
        matches!(
            self,
            Self::Frame | Self::Component | Self::Instance | Self::Rectangle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_names() {
        assert_eq!(NodeType::Rectangle.to_string(), "RECTANGLE");
        assert_eq!(NodeType::from_str("PAGE").unwrap(), NodeType::Page);
        assert_eq!(
            serde_json::to_value(NodeType::Component).unwrap(),
            serde_json::json!("COMPONENT")
        );
    }

    #[test]
    fn test_only_page_frame_group_accept_children() {
        let accepting: Vec<_> = [
            NodeType::Document,
            NodeType::Page,
            NodeType::Frame,
            NodeType::Group,
            NodeType::Component,
            NodeType::Instance,
            NodeType::Text,
            NodeType::Rectangle,
        ]
        .into_iter()
        .filter(|t| t.accepts_appended_children())
        .collect();
        assert_eq!(accepting, vec![NodeType::Page, NodeType::Frame, NodeType::Group]);
    }

    #[test]
    fn test_group_has_effects_but_no_fills() {
        assert!(NodeType::Group.has_effects());
        assert!(!NodeType::Group.has_fills());
        assert!(!NodeType::Page.has_fills());
    }
}
