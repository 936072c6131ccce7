//! End-to-end lifecycle scenarios driven through the public API.

use std::sync::{Arc, Mutex};

use serde_json::json;

use parlor_session::testing::MockConnector;
use parlor_session::{InboundMessage, Session, SessionEvent};

fn recording_session() -> (Session, MockConnector, Arc<Mutex<Vec<SessionEvent>>>) {
    let connector = MockConnector::new();
    let session = Session::with_endpoint(Arc::new(connector.clone()), "ws://primary");
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    session.on_message(move |event| {
        sink.lock().unwrap().push(event);
        Ok(())
    });
    (session, connector, log)
}

#[test]
fn full_session_lifecycle() {
    let (session, mock, log) = recording_session();
    assert_eq!(session.endpoint(), "ws://primary");

    // Nothing is open yet; sends fail softly.
    assert!(!session.send(&json!({"type": "join"})));

    session.connect(None).unwrap();
    mock.open();
    assert!(session.is_connected());
    assert!(session.send(&json!({"type": "join"})));
    assert_eq!(mock.sent_frames(), vec![r#"{"type":"join"}"#.to_string()]);

    mock.emit_frame(r#"{"type":"joined","room":"a"}"#);
    mock.emit_frame("garbled");
    mock.close_from_remote();

    let events = log.lock().unwrap().clone();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        SessionEvent::Message(InboundMessage::Structured(
            json!({"type": "joined", "room": "a"})
        ))
    );
    assert_eq!(
        events[1],
        SessionEvent::Message(InboundMessage::Raw("garbled".to_string()))
    );
    assert_eq!(
        events[2],
        SessionEvent::SocketClosed {
            last_message: Some(InboundMessage::Raw("garbled".to_string()))
        }
    );
    assert!(!session.is_connected());
}

#[test]
fn session_can_reconnect_after_remote_close() {
    let (session, mock, log) = recording_session();

    session.connect(None).unwrap();
    mock.open();
    mock.close_from_remote();

    session.connect(Some("ws://fallback")).unwrap();
    mock.open();
    mock.emit_frame(r#"{"type":"welcome"}"#);

    assert!(session.is_connected());
    assert_eq!(
        mock.connects(),
        vec!["ws://primary".to_string(), "ws://fallback".to_string()]
    );

    let events = log.lock().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], SessionEvent::SocketClosed { last_message: None });
    assert_eq!(
        events[1],
        SessionEvent::Message(InboundMessage::Structured(json!({"type": "welcome"})))
    );
}
