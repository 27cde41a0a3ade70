//! `create_text`, the one mutation that waits on the host.
//!
//! The node is created and attached synchronously. Its content can only be
//! set once the font has loaded, and by then other commands may have run,
//! so the work after the await is a separate step that starts by looking
//! the node up again.
//!
//! ```text
//! create node -> LoadingFont -> Commit (re-validate, assign, style) -> Done
//! ```

use super::mutation::{create_shape, ShapeParams};
use super::{CommandHandler, HandlerContext, HandlerResult, Params, Reply};
use crate::{BridgeError, FontError};
use glam::Vec2;
use node::{
    FontName, LetterSpacing, LineHeight, NodeId, NodeType, TextAlignHorizontal, TextAlignVertical,
    TextProps,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol::future::{self, BoxedLocal};
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use thiserror::Error;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TextParams {
    #[serde(flatten)]
    shape: ShapeParams,
    characters: Option<String>,
    style: Option<Value>,
}

#[derive(Serialize)]
struct Created {
    id: NodeId,
}

/// Styling that couldn't be applied. Reported as a warning, never an error.
#[derive(Debug, Error)]
enum TextStyleError {
    #[error("Invalid text style: {0}")]
    Malformed(String),
    #[error("Invalid {property}: {value}")]
    InvalidValue { property: &'static str, value: Value },
}

/// The character style overrides a caller may send.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TextStyle {
    font_family: Option<String>,
    font_style: Option<String>,
    font_size: Option<Value>,
    font_weight: Option<Value>,
    text_align_horizontal: Option<Value>,
    text_align_vertical: Option<Value>,
    letter_spacing: Option<Value>,
    line_height: Option<Value>,
}

impl TextStyle {
    fn parse(value: &Value) -> Result<Self, TextStyleError> {
        serde_json::from_value(value.clone()).map_err(|err| TextStyleError::Malformed(err.to_string()))
    }

    /// The font named by the style, if any.
    fn font(&self) -> Option<FontName> {
        let family = self.font_family.as_deref()?;
        Some(FontName::new(
            family,
            self.font_style.as_deref().unwrap_or("Regular"),
        ))
    }

    /// Applies overrides in order, stopping at the first bad one.
    fn apply(&self, text: &mut TextProps) -> Result<(), TextStyleError> {
        if let Some(value) = &self.font_size {
            text.font_size = positive("fontSize", value)?;
        }
        if let Some(value) = &self.font_weight {
            text.font_weight = value
                .as_u64()
                .filter(|weight| (1..=1000).contains(weight))
                .map(|weight| weight as u16)
                .ok_or_else(|| invalid("fontWeight", value))?;
        }
        if let Some(value) = &self.text_align_horizontal {
            text.text_align_horizontal = keyword("textAlignHorizontal", value)?;
        }
        if let Some(value) = &self.text_align_vertical {
            text.text_align_vertical = keyword("textAlignVertical", value)?;
        }
        if let Some(value) = &self.letter_spacing {
            text.letter_spacing = match metric::<LetterSpacing>("letterSpacing", value)? {
                Metric::Pixels(value) => LetterSpacing::Pixels { value },
                Metric::Unit(spacing) => spacing,
            };
        }
        if let Some(value) = &self.line_height {
            text.line_height = match metric::<LineHeight>("lineHeight", value)? {
                Metric::Pixels(value) => LineHeight::Pixels { value },
                Metric::Unit(height) => height,
            };
        }
        Ok(())
    }
}

/// A bare number means pixels.
#[derive(Deserialize)]
#[serde(untagged)]
enum Metric<T> {
    Pixels(f32),
    Unit(T),
}

fn invalid(property: &'static str, value: &Value) -> TextStyleError {
    TextStyleError::InvalidValue {
        property,
        value: value.clone(),
    }
}

fn positive(property: &'static str, value: &Value) -> Result<f32, TextStyleError> {
    value
        .as_f64()
        .filter(|n| *n > 0.0)
        .map(|n| n as f32)
        .ok_or_else(|| invalid(property, value))
}

fn keyword<T: FromStr>(property: &'static str, value: &Value) -> Result<T, TextStyleError> {
    value
        .as_str()
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| invalid(property, value))
}

fn metric<T: DeserializeOwned>(
    property: &'static str,
    value: &Value,
) -> Result<Metric<T>, TextStyleError> {
    serde_json::from_value(value.clone()).map_err(|_| invalid(property, value))
}

pub struct CreateText;

impl CommandHandler for CreateText {
    fn handle(&self, cx: HandlerContext, params: Params) -> BoxedLocal<HandlerResult> {
        let params: TextParams = match params.parse() {
            Ok(params) => params,
            Err(err) => return Box::pin(future::ready(Err(err))),
        };

        let created = {
            let mut graph = cx.graph.borrow_mut();
            create_shape(
                &mut graph,
                NodeType::Text,
                Vec2::new(200.0, 50.0),
                "Text",
                params.shape,
            )
        };
        let node = match created {
            Ok(node) => node,
            Err(err) => return Box::pin(future::ready(Err(err))),
        };

        // Without content there is nothing to wait for
        let Some(characters) = params.characters.filter(|c| !c.is_empty()) else {
            return Box::pin(future::ready(Reply::text(&Created { id: node })));
        };

        let style = params.style;
        let font = style
            .as_ref()
            .and_then(|style| TextStyle::parse(style).ok())
            .and_then(|style| style.font())
            .unwrap_or_else(|| cx.default_font.clone());

        log::debug!("Loading font {font} for text node {node}");
        let load = cx.fonts.load_font(font.clone());
        Box::pin(CreateTextTask {
            cx,
            node,
            font,
            characters,
            style,
            step: Step::LoadingFont { load },
        })
    }
}

enum Step {
    LoadingFont {
        load: BoxedLocal<Result<(), FontError>>,
    },
    Commit {
        font: Result<(), FontError>,
    },
    Done,
}

/// The part of `create_text` that runs after the node exists.
struct CreateTextTask {
    cx: HandlerContext,
    node: NodeId,
    font: FontName,
    characters: String,
    style: Option<Value>,
    step: Step,
}

impl CreateTextTask {
    /// Re-validates the node, then assigns content and style.
    ///
    /// Failures past the font load are reported as warnings on a
    /// successful reply. The node already exists and is kept.
    fn commit(&mut self, font: Result<(), FontError>) -> HandlerResult {
        let mut graph = self.cx.graph.borrow_mut();
        let text = graph
            .get_mut(self.node)
            .and_then(|node| node.text.as_mut())
            .ok_or_else(|| BridgeError::NodeNotFound(self.node.to_string()))?;
        let reply = Reply::text(&Created { id: self.node })?;

        if let Err(err) = font {
            log::warn!("{err}, text node {} left without content", self.node);
            return Ok(reply.with_warning(err.to_string()));
        }

        text.font_name = self.font.clone();
        text.characters = mem::take(&mut self.characters);

        if let Some(style) = &self.style {
            if let Err(err) = TextStyle::parse(style).and_then(|style| style.apply(text)) {
                log::warn!("Text node {} partially styled: {err}", self.node);
                return Ok(reply.with_warning(err.to_string()));
            }
        }

        Ok(reply)
    }
}

impl Future for CreateTextTask {
    type Output = HandlerResult;

    fn poll(mut self: Pin<&mut Self>, task: &mut Context<'_>) -> Poll<HandlerResult> {
        let this = &mut *self;
        loop {
            match mem::replace(&mut this.step, Step::Done) {
                Step::LoadingFont { mut load } => match load.as_mut().poll(task) {
                    Poll::Ready(font) => this.step = Step::Commit { font },
                    Poll::Pending => {
                        this.step = Step::LoadingFont { load };
                        return Poll::Pending;
                    }
                },
                Step::Commit { font } => return Poll::Ready(this.commit(font)),
                Step::Done => panic!("create_text polled after completion"),
            }
        }
    }
}
