use crate::{Command, CorrelationTracker, OutboundMessage, Response, Transport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// State that lives exactly as long as one connection.
#[derive(Debug)]
struct Session {
    generation: u64,
    tracker: CorrelationTracker,
}

/// Proof that a command was dispatched, used to emit its response.
///
/// Remembers the session the command was dispatched under, so a response
/// that outlives its connection can never leak into the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    id: String,
    generation: Option<u64>,
}

impl Ticket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Packages responses into outbound envelopes and owns the session.
pub struct ResponseEmitter {
    transport: Rc<dyn Transport>,
    session: RefCell<Option<Session>>,
    last_generation: Cell<u64>,
}

impl ResponseEmitter {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            session: RefCell::new(None),
            last_generation: Cell::new(0),
        }
    }

    /// Opens a session. Does nothing if one is already open.
    pub fn connect(&self) {
        let mut session = self.session.borrow_mut();
        if session.is_some() {
            return;
        }
        let generation = self.last_generation.get() + 1;
        self.last_generation.set(generation);
        *session = Some(Session {
            generation,
            tracker: CorrelationTracker::new(),
        });
        log::info!("Session {generation} opened");
    }

    /// Closes the current session. Commands still pending are abandoned.
    pub fn disconnect(&self) {
        if let Some(session) = self.session.borrow_mut().take() {
            if session.tracker.is_empty() {
                log::info!("Session {} closed", session.generation);
            } else {
                log::warn!(
                    "Session {} closed with {} pending command(s)",
                    session.generation,
                    session.tracker.len()
                );
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Registers a command with the current session, if any.
    pub fn register(&self, command: &Command) -> Ticket {
        let mut session = self.session.borrow_mut();
        let generation = session.as_mut().map(|session| {
            session.tracker.register(command);
            session.generation
        });
        Ticket {
            id: command.id.clone(),
            generation,
        }
    }

    /// Emits the response for a ticket.
    ///
    /// The response always carries the ticket's id, and the pending entry
    /// is resolved by that id. Nothing is sent while disconnected, or when
    /// the ticket belongs to a session that has since ended. A command
    /// dispatched before any session opened is answered in the current one.
    pub fn emit(&self, ticket: Ticket, mut response: Response) {
        response.id = ticket.id;

        {
            let mut session = self.session.borrow_mut();
            match (session.as_mut(), ticket.generation) {
                (Some(session), Some(generation)) if session.generation == generation => {
                    session.tracker.resolve(&response.id);
                }
                (Some(session), None) => {
                    log::debug!(
                        "Response {} was dispatched before session {} opened",
                        response.id,
                        session.generation
                    );
                }
                (Some(_), Some(_)) => {
                    log::warn!(
                        "Dropping response {}: its session has ended",
                        response.id
                    );
                    return;
                }
                (None, _) => {
                    log::warn!("Dropping response {}: not connected", response.id);
                    return;
                }
            }
        }

        log::debug!("Sending response {} (success: {})", response.id, response.success);
        self.post(&OutboundMessage::response(response));
    }

    /// Sends a message that isn't a response. Not gated on the session.
    pub fn post(&self, message: &OutboundMessage) {
        if let Err(err) = self.transport.send(message) {
            log::error!("{err}");
        }
    }

    /// Number of commands awaiting a response in the current session.
    pub fn pending_count(&self) -> usize {
        self.session
            .borrow()
            .as_ref()
            .map_or(0, |session| session.tracker.len())
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|session| session.tracker.is_pending(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BridgeError, CommandTag, Reply, TransportError};
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<OutboundMessage>>,
    }

    impl Transport for Recorder {
        fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn emitter() -> (Rc<Recorder>, ResponseEmitter) {
        let recorder = Rc::new(Recorder::default());
        let emitter = ResponseEmitter::new(recorder.clone());
        (recorder, emitter)
    }

    fn ok() -> Response {
        Response::from_outcome("ignored", Ok(Reply::empty()))
    }

    #[test]
    fn test_emit_resolves_by_ticket_id() {
        let (recorder, emitter) = emitter();
        emitter.connect();
        let ticket = emitter.register(&Command::new("a", CommandTag::GetSelection, json!({})));
        assert!(emitter.is_pending("a"));

        // The handler's response id is overridden by the ticket
        emitter.emit(ticket, ok());

        assert_eq!(emitter.pending_count(), 0);
        let sent = recorder.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].as_response().unwrap().id, "a");
    }

    #[test]
    fn test_disconnected_emission_is_dropped() {
        let (recorder, emitter) = emitter();
        let ticket = emitter.register(&Command::new("a", CommandTag::GetSelection, json!({})));
        emitter.emit(ticket, ok());
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn test_response_dispatched_before_connect_is_delivered() {
        let (recorder, emitter) = emitter();
        let ticket = emitter.register(&Command::new("early", CommandTag::GetSelection, json!({})));
        emitter.connect();
        // Same id registered in the new session stays pending
        emitter.register(&Command::new("early", CommandTag::GetSelection, json!({})));

        emitter.emit(ticket, ok());

        let sent = recorder.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].as_response().unwrap().id, "early");
        assert!(emitter.is_pending("early"));
    }

    #[test]
    fn test_stale_session_response_is_dropped() {
        let (recorder, emitter) = emitter();
        emitter.connect();
        let ticket = emitter.register(&Command::new("a", CommandTag::GetSelection, json!({})));
        emitter.disconnect();
        emitter.connect();

        emitter.emit(
            ticket,
            Response::from_outcome("a", Err(BridgeError::NodeNotFound("1".to_string()))),
        );
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let (_, emitter) = emitter();
        emitter.connect();
        emitter.register(&Command::new("a", CommandTag::GetSelection, json!({})));
        emitter.connect();
        assert!(emitter.is_pending("a"));

        emitter.disconnect();
        assert!(!emitter.is_connected());
        assert_eq!(emitter.pending_count(), 0);
    }
}
