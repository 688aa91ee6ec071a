//! End-to-end session tests over the in-memory transport.
//!
//! The session runtime multiplexes commands and transport events, so tests
//! inject events through the channel a production transport would use and
//! observe outcomes on the recorded command log, the notice stream and
//! snapshots. Command execution is asynchronous; assertions on the log poll
//! with a timeout instead of assuming scheduling order.

use std::time::Duration;

use bytes::Bytes;
use earshot_app::{Session, SessionError};
use earshot_core::{Identity, Notice, Role, TransportEvent};
use earshot_harness::{FaultPlan, SimTransport, TransportCommand};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(2);

async fn wait_for(mut condition: impl FnMut() -> bool) {
    let poll = async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    };
    timeout(WAIT, poll).await.expect("condition should hold before the deadline");
}

async fn next_notice(notices: &mut broadcast::Receiver<Notice>) -> Notice {
    timeout(WAIT, notices.recv())
        .await
        .expect("notice should arrive before the deadline")
        .expect("notice channel should stay open")
}

#[tokio::test]
async fn discoverer_session_connects_and_chats() {
    let transport = SimTransport::new();
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("alice"), transport, events_rx);
    let mut notices = session.subscribe();

    // Going online starts the scan.
    wait_for(|| observer.has_issued(|command| *command == TransportCommand::StartDiscovery)).await;

    // A marked endpoint is requested eagerly, under the local name.
    let found = TransportEvent::EndpointFound {
        endpoint_id: "ep-hub".into(),
        display_name: "1-hub".into(),
    };
    events.send(found).await.expect("runtime should be listening");
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::RequestConnection { display_name, endpoint_id }
                    if display_name == "alice" && endpoint_id.as_str() == "ep-hub"
            )
        })
    })
    .await;

    // The handshake is auto-accepted.
    let initiated = TransportEvent::ConnectionInitiated {
        endpoint_id: "ep-hub".into(),
        display_name: "1-hub".into(),
    };
    events.send(initiated).await.expect("runtime should be listening");
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::AcceptConnection { endpoint_id }
                    if endpoint_id.as_str() == "ep-hub"
            )
        })
    })
    .await;

    // Success stops the scan and reports the link at the boundary.
    let result = TransportEvent::ConnectionResult { endpoint_id: "ep-hub".into(), success: true };
    events.send(result).await.expect("runtime should be listening");
    assert_eq!(next_notice(&mut notices).await, Notice::ConnectionStatus { connected: true });
    let toast = next_notice(&mut notices).await;
    assert!(matches!(&toast, Notice::Toast { text } if text.starts_with("connected to")));

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    assert_eq!(snapshot.role, Role::Connected);
    assert_eq!(snapshot.connected.len(), 1);
    assert_eq!(snapshot.connected[0].id.as_str(), "ep-hub");

    // Outbound chat fans out over the established link.
    session.send_message("hello").await.expect("runtime should be alive");
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::SendPayload { endpoint_ids, payload }
                    if endpoint_ids.len() == 1
                        && endpoint_ids[0].as_str() == "ep-hub"
                        && payload.as_ref() == b"hello".as_slice()
            )
        })
    })
    .await;

    // Inbound chat surfaces as a notice and lands newest-first.
    let payload = TransportEvent::PayloadReceived {
        endpoint_id: "ep-hub".into(),
        payload: Bytes::from_static(b"hey"),
    };
    events.send(payload).await.expect("runtime should be listening");
    assert_eq!(next_notice(&mut notices).await, Notice::Message { text: "hey".to_owned() });

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    let texts: Vec<&str> = snapshot.messages.iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(texts, ["hey", "hello"]);
}

#[tokio::test]
async fn advertiser_session_accepts_inbound_handshake() {
    let transport = SimTransport::new();
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("1-hub"), transport, events_rx);
    let mut notices = session.subscribe();

    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::StartAdvertising { display_name } if display_name == "1-hub"
            )
        })
    })
    .await;

    let initiated = TransportEvent::ConnectionInitiated {
        endpoint_id: "ep-alice".into(),
        display_name: "alice".into(),
    };
    events.send(initiated).await.expect("runtime should be listening");
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::AcceptConnection { endpoint_id }
                    if endpoint_id.as_str() == "ep-alice"
            )
        })
    })
    .await;

    let result = TransportEvent::ConnectionResult { endpoint_id: "ep-alice".into(), success: true };
    events.send(result).await.expect("runtime should be listening");
    assert_eq!(next_notice(&mut notices).await, Notice::ConnectionStatus { connected: true });
    let toast = next_notice(&mut notices).await;
    assert!(matches!(&toast, Notice::Toast { text } if text.starts_with("connected to")));

    // Found reports mean nothing to an advertiser; flush with a payload and
    // confirm no request went out. Handshakes are accepted, never rejected.
    let found = TransportEvent::EndpointFound {
        endpoint_id: "ep-other".into(),
        display_name: "1-other".into(),
    };
    events.send(found).await.expect("runtime should be listening");
    let payload = TransportEvent::PayloadReceived {
        endpoint_id: "ep-alice".into(),
        payload: Bytes::from_static(b"hi"),
    };
    events.send(payload).await.expect("runtime should be listening");
    assert_eq!(next_notice(&mut notices).await, Notice::Message { text: "hi".to_owned() });

    assert!(!observer.has_issued(|command| {
        matches!(command, TransportCommand::RequestConnection { .. })
    }));
    assert!(!observer.has_issued(|command| {
        matches!(command, TransportCommand::RejectConnection { .. })
    }));

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    assert_eq!(snapshot.role, Role::Connected);
    assert!(snapshot.discovered.is_empty());
}

#[tokio::test]
async fn rejected_connect_feeds_back_as_toast_and_cleanup() {
    let transport = SimTransport::with_faults(FaultPlan::none().reject_connect("radio busy"));
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("alice"), transport, events_rx);
    let mut notices = session.subscribe();

    wait_for(|| observer.has_issued(|command| *command == TransportCommand::StartDiscovery)).await;

    let found = TransportEvent::EndpointFound {
        endpoint_id: "ep-hub".into(),
        display_name: "1-hub".into(),
    };
    events.send(found).await.expect("runtime should be listening");

    // The synchronous rejection loops back through the orchestrator.
    let toast = next_notice(&mut notices).await;
    assert_eq!(toast, Notice::Toast { text: "connection request failed: radio busy".to_owned() });
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::Disconnect { endpoint_id } if endpoint_id.as_str() == "ep-hub"
            )
        })
    })
    .await;

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    assert_eq!(snapshot.role, Role::Discovering);
    assert!(snapshot.discovered.is_empty(), "the abandoned candidate must not linger");
}

#[tokio::test]
async fn rejected_accept_surfaces_toast_only() {
    let transport = SimTransport::with_faults(FaultPlan::none().reject_accept("pairing refused"));
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("1-hub"), transport, events_rx);
    let mut notices = session.subscribe();

    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::StartAdvertising { display_name } if display_name == "1-hub"
            )
        })
    })
    .await;

    let initiated = TransportEvent::ConnectionInitiated {
        endpoint_id: "ep-alice".into(),
        display_name: "alice".into(),
    };
    events.send(initiated).await.expect("runtime should be listening");

    // The rejection is diagnostic only: no cleanup, no retry, no role change.
    let toast = next_notice(&mut notices).await;
    assert_eq!(toast, Notice::Toast { text: "accept failed: pairing refused".to_owned() });

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    assert_eq!(snapshot.role, Role::Advertising);
    assert!(snapshot.connected.is_empty());
}

#[tokio::test]
async fn go_offline_quiesces_the_radio() {
    let transport = SimTransport::new();
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("alice"), transport, events_rx);
    let handle = session.clone();

    wait_for(|| observer.has_issued(|command| *command == TransportCommand::StartDiscovery)).await;

    session.go_offline().await.expect("teardown should be acknowledged");

    // The teardown is acknowledged only after the radio was quiesced.
    assert!(observer.has_issued(|command| *command == TransportCommand::StopAdvertising));
    assert!(observer.has_issued(|command| *command == TransportCommand::StopDiscovery));
    assert!(observer.has_issued(|command| *command == TransportCommand::StopAllEndpoints));

    // Remaining handles observe the closed session once the task exits.
    let mut closed = false;
    for _ in 0..100 {
        if handle.send_message("late").await == Err(SessionError::Closed) {
            closed = true;
            break;
        }
        sleep(Duration::from_millis(5)).await;
    }
    assert!(closed, "commands after shutdown should fail");

    drop(events);
}

#[tokio::test]
async fn snapshot_separates_candidates_from_links() {
    let transport = SimTransport::new();
    let observer = transport.clone();
    let (events, events_rx) = mpsc::channel(16);
    let session = Session::go_online(Identity::new("alice"), transport, events_rx);

    wait_for(|| observer.has_issued(|command| *command == TransportCommand::StartDiscovery)).await;

    // First marked endpoint goes straight to a request; the second waits as
    // a candidate; the unmarked one is ignored.
    for (endpoint_id, display_name) in
        [("ep-a", "1-hubA"), ("ep-b", "1-hubB"), ("ep-c", "carol")]
    {
        let found = TransportEvent::EndpointFound {
            endpoint_id: endpoint_id.into(),
            display_name: display_name.into(),
        };
        events.send(found).await.expect("runtime should be listening");
    }

    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::RequestConnection { endpoint_id, .. }
                    if endpoint_id.as_str() == "ep-a"
            )
        })
    })
    .await;

    // The accept for the in-flight request doubles as a flush: once it is
    // recorded, every earlier found report has been handled too.
    let initiated = TransportEvent::ConnectionInitiated {
        endpoint_id: "ep-a".into(),
        display_name: "1-hubA".into(),
    };
    events.send(initiated).await.expect("runtime should be listening");
    wait_for(|| {
        observer.has_issued(|command| {
            matches!(
                command,
                TransportCommand::AcceptConnection { endpoint_id }
                    if endpoint_id.as_str() == "ep-a"
            )
        })
    })
    .await;

    let snapshot = session.snapshot().await.expect("runtime should be alive");
    assert_eq!(snapshot.role, Role::Discovering);
    assert_eq!(snapshot.connected.len(), 0);
    assert_eq!(snapshot.discovered.len(), 1);
    assert_eq!(snapshot.discovered[0].display_name, "1-hubB");
}
