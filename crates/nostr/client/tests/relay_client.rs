//! Relay client dispatch and send behavior against an in-memory communicator.

use nostr_core::nip01::KIND_SHORT_TEXT_NOTE;
use nostr_core::{CloseRequest, CodecConfig, Event, EventRequest, Filter, SubscriptionRequest, TypedEvent};
use nostr_relay_client::testing::FakeCommunicator;
use nostr_relay_client::{
    ClientError, Communicator, MessageStream, Received, RelayClient, RelayClientConfig,
    StreamSubscription,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

type Collected<T> = Arc<Mutex<Vec<T>>>;

fn collect<T: Clone + Send + 'static>(stream: &MessageStream<T>) -> (StreamSubscription, Collected<T>) {
    let items: Collected<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&items);
    let subscription = stream.subscribe(move |item: &T| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item.clone());
    });
    (subscription, items)
}

fn snapshot<T: Clone>(items: &Collected<T>) -> Vec<T> {
    items.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

const COMPLEX_EVENT_FRAME: &str = concat!(
    r#"["EVENT","subscription:x",{"#,
    r#""pubkey":"63fe6318dc58583cfe16810f86dd09e18bfd76aabc24a0081ce2856f330504ed","#,
    r#""kind":27235,"created_at":1680610669,"content":"","#,
    r#""tags":[["url","http://localhost:5097/api/v1/subscription"],["method","GET"]],"#,
    r#""id":"8897fc803723b4c6d3f9740a01369971b3b59dbc8d2eb0d53853480663c55ae3","#,
    r#""sig":"741635cb39e2dbdf21defa31d195aeb749708daf0ffbc94bf37aff0f79a2d36f996e9dab67225655eb506146fd10f87792f926e8b84b2238913ab8b114475501""#,
    r#"}]"#
);

fn simple_event() -> Event {
    Event {
        id: Some("dc24dd0c6ac6443c280f912caf091752bb3ba2c59cfc308b4238817ff7f82ff8".to_string()),
        pubkey: Some("604e96e099936a104883958b040b47672e0f048c98ac793f37ffe4c720279eb2".to_string()),
        created_at: 1677084500,
        kind: KIND_SHORT_TEXT_NOTE,
        content: "gm".to_string(),
        ..Event::default()
    }
}

#[test]
fn test_send_writes_serialized_frame() -> anyhow::Result<()> {
    let fake = FakeCommunicator::shared("damus");
    let client = RelayClient::new(fake.clone());

    client.send(&SubscriptionRequest::new(
        "timeline",
        Filter::new().kinds([KIND_SHORT_TEXT_NOTE]).limit(5),
    ))?;
    client.send(&CloseRequest::new("timeline"))?;

    assert_eq!(
        fake.sent_messages(),
        vec![
            r#"["REQ","timeline",{"kinds":[1],"limit":5}]"#.to_string(),
            r#"["CLOSE","timeline"]"#.to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_pretty_codec_config_reaches_the_wire() -> anyhow::Result<()> {
    let fake = FakeCommunicator::shared("pretty");
    let client = RelayClient::with_config(
        fake.clone(),
        RelayClientConfig {
            codec: CodecConfig { pretty: true },
        },
    );
    client.send(&CloseRequest::new("x"))?;

    let sent = fake.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains('\n'));
    Ok(())
}

#[test]
fn test_send_failure_is_returned() {
    let fake = FakeCommunicator::shared("flaky");
    fake.set_fail_sends(true);
    let client = RelayClient::new(fake.clone());

    let result = client.send(&EventRequest::new(simple_event()));
    assert!(matches!(result, Err(ClientError::Transport(_))));
    assert!(fake.sent_messages().is_empty());
}

#[test]
fn test_event_frame_dispatch() {
    let fake = FakeCommunicator::shared("local");
    let client = RelayClient::new(fake.clone());
    let (_events, events) = collect(client.streams().events());
    let (_raw, raw) = collect(client.streams().unknown_raw());

    let before = SystemTime::now();
    fake.push_frame(COMPLEX_EVENT_FRAME);

    let events = snapshot(&events);
    assert_eq!(events.len(), 1);
    assert!(snapshot(&raw).is_empty());

    let Received {
        relay_name,
        received_at,
        message,
    } = &events[0];
    assert_eq!(relay_name, "local");
    assert!(*received_at >= before);
    assert_eq!(message.subscription_id.as_deref(), Some("subscription:x"));

    let event = message.event.as_ref().map(TypedEvent::event);
    assert_eq!(event.map(|event| event.kind), Some(27235));
    assert_eq!(
        event.and_then(|event| event.tags.find_first_value("url")),
        Some("http://localhost:5097/api/v1/subscription")
    );
    assert_eq!(
        event.and_then(|event| event.id.as_deref()),
        Some("8897fc803723b4c6d3f9740a01369971b3b59dbc8d2eb0d53853480663c55ae3")
    );
}

#[test]
fn test_control_frames_reach_their_streams() {
    let fake = FakeCommunicator::shared("local");
    let client = RelayClient::new(fake.clone());
    let streams = client.streams();
    let (_eose, eose) = collect(streams.eose());
    let (_notices, notices) = collect(streams.notices());
    let (_ok, ok) = collect(streams.ok());
    let (_unknown, unknown) = collect(streams.unknown_messages());

    fake.push_frame(r#"["EOSE","timeline"]"#);
    fake.push_frame(r#"["notice","rate limited"]"#);
    fake.push_frame(r#"["OK","b1a649ebe8",true,"duplicate:"]"#);
    fake.push_frame(r#"["AUTH","challenge-string"]"#);

    assert_eq!(
        snapshot(&eose)
            .first()
            .and_then(|item| item.message.subscription_id.clone()),
        Some("timeline".to_string())
    );
    assert_eq!(
        snapshot(&notices)
            .first()
            .and_then(|item| item.message.message.clone()),
        Some("rate limited".to_string())
    );

    let ok = snapshot(&ok);
    assert_eq!(ok.len(), 1);
    assert!(ok[0].message.accepted);
    assert_eq!(ok[0].message.event_id.as_deref(), Some("b1a649ebe8"));
    assert_eq!(ok[0].message.message.as_deref(), Some("duplicate:"));

    let unknown = snapshot(&unknown);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].message.message_type.as_deref(), Some("AUTH"));
}

#[test]
fn test_malformed_frames_route_to_unknown_raw() {
    let fake = FakeCommunicator::shared("noisy");
    let client = RelayClient::new(fake.clone());
    let (_events, events) = collect(client.streams().events());
    let (_raw, raw) = collect(client.streams().unknown_raw());

    let frames = [
        "hello relay",
        "{\"EVENT\":1}",
        "[\"EVENT\",",
        "[]",
        "[42,\"x\"]",
    ];
    for frame in frames {
        fake.push_frame(frame);
    }

    assert!(snapshot(&events).is_empty());
    let raw = snapshot(&raw);
    assert_eq!(raw.len(), frames.len());
    for (item, frame) in raw.iter().zip(frames) {
        assert_eq!(item.relay_name, "noisy");
        assert_eq!(item.message.text, frame);
    }
}

#[test]
fn test_handle_frame_matches_communicator_path() {
    let fake = FakeCommunicator::shared("local");
    let client = RelayClient::new(fake.clone());
    let (_eose, eose) = collect(client.streams().eose());

    client.handle_frame(r#"["EOSE","a"]"#);
    fake.push_frame(r#"["EOSE","b"]"#);

    let ids: Vec<Option<String>> = snapshot(&eose)
        .into_iter()
        .map(|item| item.message.subscription_id)
        .collect();
    assert_eq!(ids, vec![Some("a".to_string()), Some("b".to_string())]);
}

#[test]
fn test_dropped_client_stops_listening() {
    let fake = FakeCommunicator::shared("local");
    let client = RelayClient::new(fake.clone());
    assert_eq!(fake.message_received().observer_count(), 1);

    drop(client);
    assert_eq!(fake.message_received().observer_count(), 0);
    fake.push_frame(r#"["EOSE","after"]"#);
}

#[tokio::test]
async fn test_events_over_a_channel() -> anyhow::Result<()> {
    let fake = FakeCommunicator::shared("channel");
    let client = RelayClient::new(fake.clone());
    let (_subscription, mut rx) = client.streams().events().subscribe_channel(16);

    fake.push_frame(COMPLEX_EVENT_FRAME);

    let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?;
    assert_eq!(
        received.and_then(|item| item.message.subscription_id),
        Some("subscription:x".to_string())
    );
    Ok(())
}

#[test]
fn test_lifecycle_notifications() -> anyhow::Result<()> {
    let fake = FakeCommunicator::shared("local");
    let (_reconnects, reconnects) = collect(fake.reconnection_happened());
    let (_disconnects, disconnects) = collect(fake.disconnection_happened());

    fake.start()?;
    fake.start()?;
    fake.simulate_reconnect();
    fake.stop()?;

    let kinds: Vec<_> = snapshot(&reconnects).into_iter().map(|info| info.kind).collect();
    assert_eq!(
        kinds,
        vec![
            nostr_relay_client::ReconnectionType::Initial,
            nostr_relay_client::ReconnectionType::Lost,
        ]
    );
    let kinds: Vec<_> = snapshot(&disconnects).into_iter().map(|info| info.kind).collect();
    assert_eq!(
        kinds,
        vec![
            nostr_relay_client::DisconnectionType::Lost,
            nostr_relay_client::DisconnectionType::ByUser,
        ]
    );
    assert!(!fake.is_running());
    Ok(())
}
