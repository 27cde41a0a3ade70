//! Create, style, update and delete handlers.
//!
//! Every handler validates its whole input before touching the graph, so
//! a failed command leaves the document as it was.

use super::{HandlerResult, Params, Reply};
use crate::{normalize_effects, normalize_fill, normalize_stroke, BridgeError};
use glam::Vec2;
use node::{Node, NodeId, NodeType, PropertyPatch};
use scene_graph::SceneGraph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters shared by the shape-like create commands.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ShapeParams {
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub fill: Option<Value>,
    pub stroke: Option<Value>,
    pub stroke_weight: Option<f32>,
    pub corner_radius: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeParams {
    node_id: String,
}

#[derive(Serialize)]
struct Created {
    id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl Created {
    fn reply(id: NodeId) -> HandlerResult {
        Reply::text(&Self { id, key: None })
    }
}

/// Resolves `parentId`, or the current page when it's absent.
pub(crate) fn resolve_parent(
    graph: &SceneGraph,
    parent_id: Option<&str>,
) -> Result<NodeId, BridgeError> {
    match parent_id {
        Some(id) => graph
            .resolve(id)
            .ok_or_else(|| BridgeError::ParentNotFound(id.to_string())),
        None => Ok(graph.current_page()),
    }
}

pub(crate) fn resolve_node(graph: &SceneGraph, id: &str) -> Result<NodeId, BridgeError> {
    graph
        .resolve(id)
        .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))
}

fn require(node: &Node, property: &'static str) -> Result<(), BridgeError> {
    if node.exposes(property) {
        Ok(())
    } else {
        Err(BridgeError::UnsupportedProperty {
            node_type: node.node_type,
            property,
        })
    }
}

/// Creates a node under the resolved parent and applies geometry and style.
pub(crate) fn create_shape(
    graph: &mut SceneGraph,
    node_type: NodeType,
    default_size: Vec2,
    default_name: &str,
    params: ShapeParams,
) -> Result<NodeId, BridgeError> {
    let parent = resolve_parent(graph, params.parent_id.as_deref())?;
    let name = params.name.unwrap_or_else(|| default_name.to_string());
    let id = graph.create(parent, node_type, name)?;

    let node = graph
        .get_mut(id)
        .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))?;
    node.position = Vec2::new(params.x, params.y);
    node.resize(
        params.width.unwrap_or(default_size.x),
        params.height.unwrap_or(default_size.y),
    );

    if let (Some(fill), Some(fills)) = (&params.fill, &mut node.fills) {
        *fills = normalize_fill(fill);
    }
    if let (Some(stroke), Some(strokes)) = (&params.stroke, &mut node.strokes) {
        *strokes = normalize_stroke(stroke);
    }
    if let Some(weight) = params.stroke_weight {
        node.apply(PropertyPatch::StrokeWeight(weight));
    }
    if let Some(radius) = params.corner_radius {
        node.apply(PropertyPatch::CornerRadius(radius));
    }

    Ok(id)
}

pub fn create_rectangle(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let id = create_shape(
        graph,
        NodeType::Rectangle,
        Vec2::splat(100.0),
        "Rectangle",
        params.parse()?,
    )?;
    Created::reply(id)
}

pub fn create_frame(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let id = create_shape(
        graph,
        NodeType::Frame,
        Vec2::new(400.0, 300.0),
        "Frame",
        params.parse()?,
    )?;
    Created::reply(id)
}

pub fn create_component(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let id = create_shape(
        graph,
        NodeType::Component,
        Vec2::splat(100.0),
        "Component",
        params.parse()?,
    )?;
    let key = graph.get(id).and_then(|node| node.key.clone());
    Reply::text(&Created { id, key })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceParams {
    component_key: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    name: Option<String>,
    parent_id: Option<String>,
    scale_x: Option<f32>,
    scale_y: Option<f32>,
}

pub fn create_instance(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: InstanceParams = params.parse()?;

    let component = graph
        .component_by_key(&params.component_key)
        .ok_or_else(|| BridgeError::ComponentNotFound(params.component_key.clone()))?;
    let parent = resolve_parent(graph, params.parent_id.as_deref())?;
    graph.check_attachable(parent)?;

    let instance = graph.instantiate(component)?;
    if let Some(node) = graph.get_mut(instance) {
        node.position = Vec2::new(params.x, params.y);
        node.name = params.name.unwrap_or_else(|| "Instance".to_string());
    }
    if params.scale_x.is_some() || params.scale_y.is_some() {
        let factor = Vec2::new(params.scale_x.unwrap_or(1.0), params.scale_y.unwrap_or(1.0));
        graph.rescale(instance, factor)?;
    }
    graph.attach(parent, instance)?;

    Created::reply(instance)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FillParams {
    node_id: String,
    #[serde(default)]
    fill: Option<Value>,
}

pub fn set_fill(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: FillParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    let node = graph
        .get_mut(id)
        .ok_or_else(|| BridgeError::NodeNotFound(params.node_id.clone()))?;
    require(node, "fills")?;

    if let (Some(fill), Some(fills)) = (&params.fill, &mut node.fills) {
        *fills = normalize_fill(fill);
    }
    Created::reply(id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokeParams {
    node_id: String,
    #[serde(default)]
    stroke: Option<Value>,
    stroke_weight: Option<f32>,
}

pub fn set_stroke(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: StrokeParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    let node = graph
        .get_mut(id)
        .ok_or_else(|| BridgeError::NodeNotFound(params.node_id.clone()))?;
    require(node, "strokes")?;

    if let (Some(stroke), Some(strokes)) = (&params.stroke, &mut node.strokes) {
        *strokes = normalize_stroke(stroke);
    }
    if let Some(weight) = params.stroke_weight {
        node.apply(PropertyPatch::StrokeWeight(weight));
    }
    Created::reply(id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EffectParams {
    node_id: String,
    #[serde(default)]
    effects: Option<Value>,
}

pub fn set_effects(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: EffectParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    let node = graph
        .get_mut(id)
        .ok_or_else(|| BridgeError::NodeNotFound(params.node_id.clone()))?;
    require(node, "effects")?;

    if let (Some(effects @ Value::Array(_)), Some(current)) = (&params.effects, &mut node.effects) {
        *current = normalize_effects(effects);
    }
    Created::reply(id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    node_id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// A validated change to one property.
enum Change {
    Scalar(PropertyPatch),
    Fills(Value),
    Strokes(Value),
    Effects(Value),
}

pub fn update_node(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: UpdateParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    let node = graph
        .get_mut(id)
        .ok_or_else(|| BridgeError::NodeNotFound(params.node_id.clone()))?;

    // Validate everything first so a bad value can't leave a half-applied update
    let mut changes = Vec::new();
    for (key, value) in &params.properties {
        if !node.exposes(key) {
            log::debug!("Ignoring property {key} on {}", node.node_type);
            continue;
        }
        let change = match key.as_str() {
            "fills" => Change::Fills(value.clone()),
            "strokes" => Change::Strokes(value.clone()),
            "effects" => Change::Effects(value.clone()),
            _ => match PropertyPatch::parse(key, value)? {
                Some(patch) => Change::Scalar(patch),
                None => continue,
            },
        };
        changes.push(change);
    }

    for change in changes {
        match change {
            Change::Scalar(patch) => node.apply(patch),
            Change::Fills(value) => node.fills = Some(normalize_fill(&value)),
            Change::Strokes(value) => node.strokes = Some(normalize_stroke(&value)),
            Change::Effects(value) => node.effects = Some(normalize_effects(&value)),
        }
    }

    Created::reply(id)
}

pub fn delete_node(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: NodeParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    graph.remove(id)?;
    Ok(Reply::empty())
}
