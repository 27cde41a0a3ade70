use super::mutation::resolve_node;
use super::{CommandHandler, HandlerContext, HandlerResult, Params, Reply};
use crate::{BridgeError, ExportFormat, ExportSettings};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use node::{NodeId, NodeType};
use scene_graph::SceneGraph;
use serde::{Deserialize, Serialize};
use smol::future::BoxedLocal;

/// A flat listing entry.
#[derive(Serialize)]
struct Layer<'a> {
    id: NodeId,
    name: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    key: Option<&'a str>,
}

/// Lists the document's top-level containers. Does not descend into them.
pub fn get_root_layers(graph: &mut SceneGraph, _params: Params) -> HandlerResult {
    let layers: Vec<Layer> = graph
        .pages()
        .iter()
        .filter_map(|id| graph.get(*id))
        .map(|node| Layer {
            id: node.id,
            name: &node.name,
            node_type: node.node_type,
            key: component_key(node),
        })
        .collect();
    Reply::text(&layers)
}

#[derive(Serialize)]
struct Selected<'a> {
    id: NodeId,
    name: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
}

pub fn get_selection(graph: &mut SceneGraph, _params: Params) -> HandlerResult {
    let selection = graph.selection();
    let selected: Vec<Selected> = selection
        .iter()
        .filter_map(|id| graph.get(*id))
        .map(|node| Selected {
            id: node.id,
            name: &node.name,
            node_type: node.node_type,
        })
        .collect();
    Reply::text(&selected)
}

/// One node of a `get_node_children` tree.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChildTree<'a> {
    id: NodeId,
    parent_id: Option<NodeId>,
    name: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    key: Option<&'a str>,
    children: Vec<ChildTree<'a>>,
}

fn component_key(node: &node::Node) -> Option<&str> {
    match node.node_type {
        NodeType::Component => node.key.as_deref(),
        _ => None,
    }
}

/// Builds the tree under `id`, following child lists only.
fn child_tree(graph: &SceneGraph, id: NodeId) -> Option<ChildTree<'_>> {
    let node = graph.get(id)?;
    Some(ChildTree {
        id: node.id,
        parent_id: node.parent,
        name: &node.name,
        node_type: node.node_type,
        key: component_key(node),
        children: node
            .children
            .iter()
            .filter_map(|child| child_tree(graph, *child))
            .collect(),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeParams {
    node_id: String,
}

/// Returns the full subtree under a node as a list of child trees.
pub fn get_node_children(graph: &mut SceneGraph, params: Params) -> HandlerResult {
    let params: NodeParams = params.parse()?;
    let id = resolve_node(graph, &params.node_id)?;
    let trees: Vec<ChildTree> = graph
        .children(id)
        .iter()
        .filter_map(|child| child_tree(graph, *child))
        .collect();
    Reply::text(&trees)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    node_id: String,
    #[serde(default)]
    format: Option<ExportFormat>,
    #[serde(default)]
    scale: Option<f32>,
}

#[derive(Serialize)]
struct Exported {
    id: String,
    format: ExportFormat,
    data: String,
}

/// Renders a node and returns the bytes base64 encoded.
///
/// The renderer works on an owned snapshot, so nothing needs to be
/// re-checked once the render completes.
pub struct ExportNode;

impl CommandHandler for ExportNode {
    fn handle(&self, cx: HandlerContext, params: Params) -> BoxedLocal<HandlerResult> {
        Box::pin(async move {
            let params: ExportParams = params.parse()?;
            let settings = ExportSettings {
                format: params.format.unwrap_or_default(),
                scale: params.scale.filter(|scale| *scale > 0.0).unwrap_or(1.0),
            };

            let snapshot = {
                let graph = cx.graph.borrow();
                let id = resolve_node(&graph, &params.node_id)?;
                graph
                    .snapshot(id)
                    .ok_or_else(|| BridgeError::NodeNotFound(params.node_id.clone()))?
            };

            log::debug!(
                "Exporting {} as {} at {}x",
                params.node_id,
                settings.format,
                settings.scale
            );
            let bytes = cx
                .renderer
                .export(snapshot, settings)
                .await
                .map_err(|err| BridgeError::Export(err.to_string()))?;

            Reply::image(&Exported {
                id: params.node_id,
                format: settings.format,
                data: STANDARD.encode(bytes),
            })
        })
    }
}
