#![allow(dead_code)]

use bridge::{
    Bridge, BridgeConfig, ExportSettings, FontError, FontLoader, HandlerRegistry, Host,
    OutboundMessage, RenderError, Renderer, Response, Transport, TransportError,
};
use node::FontName;
use scene_graph::{SceneGraph, Snapshot};
use serde_json::{json, Value};
use smol::channel::{self, Sender};
use smol::future::{self, BoxedLocal};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Records every outbound envelope.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: RefCell<Vec<OutboundMessage>>,
}

impl Transport for RecordingTransport {
    fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

impl RecordingTransport {
    pub fn responses(&self) -> Vec<Response> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|message| message.as_response().cloned())
            .collect()
    }
}

/// Font loader whose loads can be held open and released by the test.
#[derive(Default)]
pub struct TestFonts {
    pub hold: Cell<bool>,
    pub missing: RefCell<Vec<FontName>>,
    held: RefCell<Vec<(FontName, Sender<Result<(), FontError>>)>>,
}

impl TestFonts {
    pub fn held_count(&self) -> usize {
        self.held.borrow().len()
    }

    /// Completes every held load.
    pub fn release(&self) {
        for (font, sender) in self.held.borrow_mut().drain(..) {
            let result = self.result_for(font);
            let _ = sender.try_send(result);
        }
    }

    fn result_for(&self, font: FontName) -> Result<(), FontError> {
        if self.missing.borrow().contains(&font) {
            Err(FontError {
                font,
                reason: "not available".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl FontLoader for TestFonts {
    fn load_font(&self, font: FontName) -> BoxedLocal<Result<(), FontError>> {
        if !self.hold.get() {
            return Box::pin(future::ready(self.result_for(font)));
        }

        let (sender, receiver) = channel::bounded(1);
        self.held.borrow_mut().push((font.clone(), sender));
        Box::pin(async move {
            receiver.recv().await.unwrap_or_else(|_| {
                Err(FontError {
                    font,
                    reason: "loader dropped".to_string(),
                })
            })
        })
    }
}

/// Renders a fixed byte pattern and records the settings it was asked for.
#[derive(Default)]
pub struct TestRenderer {
    pub requests: RefCell<Vec<(String, ExportSettings)>>,
}

impl Renderer for TestRenderer {
    fn export(
        &self,
        snapshot: Snapshot,
        settings: ExportSettings,
    ) -> BoxedLocal<Result<Vec<u8>, RenderError>> {
        self.requests
            .borrow_mut()
            .push((snapshot.node.name.clone(), settings));
        let bytes = format!("{}:{}", settings.format, snapshot.len()).into_bytes();
        Box::pin(future::ready(Ok(bytes)))
    }
}

pub struct Harness {
    pub bridge: Bridge,
    pub transport: Rc<RecordingTransport>,
    pub fonts: Rc<TestFonts>,
    pub renderer: Rc<TestRenderer>,
}

impl Harness {
    /// A bridge over an empty document, not yet connected.
    pub fn new() -> Self {
        Self::with_registry(HandlerRegistry::standard())
    }

    pub fn with_registry(registry: HandlerRegistry) -> Self {
        let transport = Rc::new(RecordingTransport::default());
        let fonts = Rc::new(TestFonts::default());
        let renderer = Rc::new(TestRenderer::default());
        let host = Host {
            transport: transport.clone(),
            fonts: fonts.clone(),
            renderer: renderer.clone(),
        };
        let graph = Rc::new(RefCell::new(SceneGraph::new("Test Document")));
        Self {
            bridge: Bridge::with_registry(graph, host, BridgeConfig::default(), registry),
            transport,
            fonts,
            renderer,
        }
    }

    /// A bridge with an open session.
    pub fn connected() -> Self {
        let harness = Self::new();
        harness.connect();
        harness
    }

    pub fn connect(&self) {
        self.inbound(json!({"type": "connection-status", "status": "connected", "message": "ok"}));
    }

    pub fn disconnect(&self) {
        self.inbound(json!({"type": "connection-status", "status": "disconnected", "message": "closed"}));
    }

    pub fn inbound(&self, envelope: Value) {
        self.bridge
            .handle_json(&envelope.to_string())
            .expect("valid envelope");
    }

    /// Dispatches a command through the wire envelope without running it.
    pub fn send(&self, id: &str, command: &str, params: Value) {
        self.inbound(json!({
            "type": "ws-message",
            "message": {"type": "command", "id": id, "command": command, "params": params}
        }));
    }

    /// Dispatches a command, runs the executor and returns its response.
    pub fn run(&self, id: &str, command: &str, params: Value) -> Response {
        self.send(id, command, params);
        self.bridge.run_until_stalled();
        self.response(id)
            .unwrap_or_else(|| panic!("no response emitted for {id}"))
    }

    /// Runs a command that must succeed and returns its result.
    pub fn ok(&self, id: &str, command: &str, params: Value) -> Value {
        let response = self.run(id, command, params);
        assert!(response.success, "{command} failed: {:?}", response.error);
        response.result.unwrap_or(Value::Null)
    }

    /// Runs a create command and returns the new node's wire id.
    pub fn create(&self, id: &str, command: &str, params: Value) -> String {
        self.ok(id, command, params)["id"]
            .as_str()
            .expect("created id")
            .to_string()
    }

    pub fn response(&self, id: &str) -> Option<Response> {
        self.responses_for(id).into_iter().last()
    }

    pub fn responses_for(&self, id: &str) -> Vec<Response> {
        self.transport
            .responses()
            .into_iter()
            .filter(|response| response.id == id)
            .collect()
    }

    pub fn current_page(&self) -> String {
        self.bridge.graph().borrow().current_page().to_string()
    }
}
