//! Bridge - command execution against a document scene graph.
//!
//! Remote callers send tagged commands over an asynchronous channel. The
//! bridge routes each one to a handler, runs it against the shared
//! [`SceneGraph`](scene_graph::SceneGraph), and answers with a response
//! correlated by the command's id.
//!
//! ```text
//! inbound envelope -> Bridge::dispatch -> HandlerRegistry -> handler
//!                                                             |
//!                       Transport <- ResponseEmitter <--------+
//! ```
//!
//! Everything runs on one thread. Handlers that wait on the host (font
//! loading, rendering) suspend on a `smol::LocalExecutor`, so several
//! commands may be in flight at once and may complete out of order.
//!
//! # Example
//! ```ignore
//! use bridge::{Bridge, BridgeConfig, Host, InboundMessage};
//!
//! let bridge = Bridge::new(graph, host, BridgeConfig::default());
//! bridge.start();
//! bridge.handle_json(r#"{"type":"connection-status","status":"connected","message":"ok"}"#)?;
//! bridge.handle_json(r#"{"type":"ws-message","message":{"type":"command","id":"1","command":"get_selection","params":{}}}"#)?;
//! bridge.run_until_stalled();
//! ```

mod config;
mod correlation;
mod dispatcher;
mod emitter;
mod error;
mod handlers;
mod host;
mod protocol;
mod style;

pub use config::BridgeConfig;
pub use correlation::CorrelationTracker;
pub use dispatcher::{Bridge, Host};
pub use emitter::{ResponseEmitter, Ticket};
pub use error::BridgeError;
pub use handlers::{
    CommandHandler, HandlerContext, HandlerRegistry, HandlerResult, Immediate, Params, Reply,
    SharedGraph,
};
pub use host::{
    ExportFormat, ExportSettings, FontError, FontLoader, RenderError, Renderer, Transport,
    TransportError,
};
pub use protocol::*;
pub use style::{normalize_effects, normalize_fill, normalize_stroke};
