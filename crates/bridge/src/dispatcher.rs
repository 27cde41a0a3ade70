//! Routes inbound envelopes to handlers and responses back out.
//!
//! Each command runs as its own task on a single-threaded executor. The
//! task owns the error boundary: whatever the handler does, including
//! panicking, ends in exactly one call to [`ResponseEmitter::emit`].

use crate::{
    BridgeConfig, BridgeError, Command, ConnectionStatus, FontLoader, HandlerContext,
    HandlerRegistry, InboundMessage, OutboundMessage, Params, PluginInfo, Renderer, Response,
    ResponseEmitter, ServerMessage, SharedGraph, Transport,
};
use smol::future::FutureExt as _;
use smol::LocalExecutor;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

/// The host collaborators the bridge talks to.
pub struct Host {
    pub transport: Rc<dyn Transport>,
    pub fonts: Rc<dyn FontLoader>,
    pub renderer: Rc<dyn Renderer>,
}

pub struct Bridge {
    executor: LocalExecutor<'static>,
    context: HandlerContext,
    registry: Rc<HandlerRegistry>,
    emitter: Rc<ResponseEmitter>,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(graph: SharedGraph, host: Host, config: BridgeConfig) -> Self {
        Self::with_registry(graph, host, config, HandlerRegistry::standard())
    }

    pub fn with_registry(
        graph: SharedGraph,
        host: Host,
        config: BridgeConfig,
        registry: HandlerRegistry,
    ) -> Self {
        let context = HandlerContext {
            graph,
            fonts: host.fonts,
            renderer: host.renderer,
            default_font: config.default_font.clone(),
        };
        Self {
            executor: LocalExecutor::new(),
            context,
            registry: Rc::new(registry),
            emitter: Rc::new(ResponseEmitter::new(host.transport)),
            config,
        }
    }

    /// Announces the bridge to the transport adapter.
    pub fn start(&self) {
        self.send_plugin_info();
    }

    pub fn handle_message(&self, message: InboundMessage) {
        match message {
            InboundMessage::WsMessage {
                message: ServerMessage::Command(command),
            } => self.dispatch(command),
            InboundMessage::WsMessage {
                message: ServerMessage::Other,
            } => log::debug!("Ignoring non-command server message"),
            InboundMessage::ConnectionStatus { status, message } => {
                log::info!("Connection {status}: {message}");
                match status {
                    ConnectionStatus::Connected => self.emitter.connect(),
                    ConnectionStatus::Disconnected => self.emitter.disconnect(),
                }
            }
            InboundMessage::WsError { error } => log::error!("WebSocket error: {error}"),
            InboundMessage::GetPluginInfo => self.send_plugin_info(),
        }
    }

    /// Parses and handles one inbound envelope.
    pub fn handle_json(&self, json: &str) -> Result<(), serde_json::Error> {
        let message = serde_json::from_str(json)?;
        self.handle_message(message);
        Ok(())
    }

    /// Starts a command. Its response is emitted once the executor has run
    /// the command's task to completion.
    pub fn dispatch(&self, command: Command) {
        log::info!("Processing command {} ({})", command.command, command.id);
        self.emitter.post(&OutboundMessage::progress(&command.command));

        let ticket = self.emitter.register(&command);
        let handler = self.registry.get(&command.command);
        let cx = self.context.clone();
        let emitter = self.emitter.clone();
        let params = Params::new(command.params);

        let task = async move {
            let outcome = match handler {
                Ok(handler) => {
                    // Synchronous handlers run inside this future too, so they are covered
                    let run = AssertUnwindSafe(async move { handler.handle(cx, params).await });
                    run.catch_unwind().await.unwrap_or_else(|panic| {
                        Err(BridgeError::HandlerPanicked(panic_message(&*panic)))
                    })
                }
                Err(err) => Err(err),
            };
            if let Err(err) = &outcome {
                log::error!("Command {} failed: {err}", ticket.id());
            }
            let response = Response::from_outcome(ticket.id(), outcome);
            emitter.emit(ticket, response);
        };
        self.executor.spawn(task).detach();
    }

    pub fn send_plugin_info(&self) {
        let info = {
            let graph = self.context.graph.borrow();
            PluginInfo {
                name: Some(graph.name())
                    .filter(|name| !name.is_empty())
                    .unwrap_or("Unknown File")
                    .to_string(),
                id: graph.file_key().unwrap_or("Unknown ID").to_string(),
                user: self.config.user.clone(),
            }
        };
        self.emitter.post(&OutboundMessage::PluginInfo { data: info });
    }

    pub fn is_connected(&self) -> bool {
        self.emitter.is_connected()
    }

    pub fn pending_count(&self) -> usize {
        self.emitter.pending_count()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.emitter.is_pending(id)
    }

    pub fn graph(&self) -> SharedGraph {
        self.context.graph.clone()
    }

    /// Runs every task that can make progress without waiting on the host.
    pub fn run_until_stalled(&self) {
        while self.executor.try_tick() {}
    }

    /// Drives the bridge's tasks while `future` runs.
    pub async fn run<T>(&self, future: impl Future<Output = T>) -> T {
        self.executor.run(future).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
