use bridge::{OutboundMessage, Transport, TransportError};
use std::io::Write;

/// Writes each outbound envelope to stdout as one line of JSON.
#[derive(Default)]
pub struct StdoutTransport {
    pretty: bool,
}

impl StdoutTransport {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Transport for StdoutTransport {
    fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(message)
        } else {
            serde_json::to_string(message)
        }
        .map_err(|e| TransportError(e.to_string()))?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")
            .and_then(|()| stdout.flush())
            .map_err(|e| TransportError(e.to_string()))
    }
}
