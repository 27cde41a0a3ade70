//! Command handlers and the registry that routes tags to them.
//!
//! Most handlers finish in one synchronous step against the scene graph
//! and are wrapped in [`Immediate`]. The ones that wait on the host
//! (`create_text`, `export_node`) implement [`CommandHandler`] directly.

mod mutation;
mod query;
mod text;

use crate::{BridgeError, CommandTag, FontLoader, Renderer, ResponseKind};
use node::FontName;
use scene_graph::SceneGraph;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use smol::future::{self, BoxedLocal};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;
use strum::IntoEnumIterator;

/// The document, shared between in-flight commands on one thread.
///
/// Borrows must never be held across an `.await`.
pub type SharedGraph = Rc<RefCell<SceneGraph>>;

pub type HandlerResult = Result<Reply, BridgeError>;

/// Everything a handler may touch.
#[derive(Clone)]
pub struct HandlerContext {
    pub graph: SharedGraph,
    pub fonts: Rc<dyn FontLoader>,
    pub renderer: Rc<dyn Renderer>,
    pub default_font: FontName,
}

pub trait CommandHandler {
    fn handle(&self, cx: HandlerContext, params: Params) -> BoxedLocal<HandlerResult>;
}

/// Adapts a synchronous graph operation into a [`CommandHandler`].
pub struct Immediate<F>(pub F);

impl<F> CommandHandler for Immediate<F>
where
    F: Fn(&mut SceneGraph, Params) -> HandlerResult,
{
    fn handle(&self, cx: HandlerContext, params: Params) -> BoxedLocal<HandlerResult> {
        let result = {
            let mut graph = cx.graph.borrow_mut();
            (self.0)(&mut graph, params)
        };
        Box::pin(future::ready(result))
    }
}

/// A command's parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    /// Deserializes the parameters into a typed shape.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|err| BridgeError::InvalidParams(err.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// A successful handler outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    pub kind: ResponseKind,
    pub result: Option<Value>,
    /// Work that was skipped after the command itself succeeded.
    pub warning: Option<String>,
}

impl Reply {
    pub fn text(result: &impl Serialize) -> HandlerResult {
        Self::with_kind(ResponseKind::Text, result)
    }

    pub fn image(result: &impl Serialize) -> HandlerResult {
        Self::with_kind(ResponseKind::Image, result)
    }

    /// Success with no result payload.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    fn with_kind(kind: ResponseKind, result: &impl Serialize) -> HandlerResult {
        let result =
            serde_json::to_value(result).map_err(|err| BridgeError::Encode(err.to_string()))?;
        Ok(Self {
            kind,
            result: Some(result),
            warning: None,
        })
    }
}

/// Maps command tags to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<CommandTag, Rc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with a handler for every [`CommandTag`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for tag in CommandTag::iter() {
            match tag {
                CommandTag::GetRootLayers => registry.register(tag, Immediate(query::get_root_layers)),
                CommandTag::GetSelection => registry.register(tag, Immediate(query::get_selection)),
                CommandTag::GetNodeChildren => {
                    registry.register(tag, Immediate(query::get_node_children))
                }
                CommandTag::ExportNode => registry.register(tag, query::ExportNode),
                CommandTag::CreateRectangle => {
                    registry.register(tag, Immediate(mutation::create_rectangle))
                }
                CommandTag::CreateText => registry.register(tag, text::CreateText),
                CommandTag::CreateFrame => registry.register(tag, Immediate(mutation::create_frame)),
                CommandTag::CreateComponent => {
                    registry.register(tag, Immediate(mutation::create_component))
                }
                CommandTag::CreateInstance => {
                    registry.register(tag, Immediate(mutation::create_instance))
                }
                CommandTag::SetFill => registry.register(tag, Immediate(mutation::set_fill)),
                CommandTag::SetStroke => registry.register(tag, Immediate(mutation::set_stroke)),
                CommandTag::SetEffects => registry.register(tag, Immediate(mutation::set_effects)),
                CommandTag::UpdateNode => registry.register(tag, Immediate(mutation::update_node)),
                CommandTag::DeleteNode => registry.register(tag, Immediate(mutation::delete_node)),
            }
        }
        registry
    }

    /// Installs or replaces the handler for a tag.
    pub fn register(&mut self, tag: CommandTag, handler: impl CommandHandler + 'static) {
        self.handlers.insert(tag, Rc::new(handler));
    }

    pub fn get(&self, tag: &str) -> Result<Rc<dyn CommandHandler>, BridgeError> {
        CommandTag::from_str(tag)
            .ok()
            .and_then(|tag| self.handlers.get(&tag))
            .cloned()
            .ok_or_else(|| BridgeError::UnknownCommand(tag.to_string()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
