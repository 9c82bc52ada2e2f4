//! Multi-relay broadcast, forwarding and registry behavior.

use nostr_core::nip01::KIND_SHORT_TEXT_NOTE;
use nostr_core::{CloseRequest, Event, EventRequest};
use nostr_relay_client::testing::FakeCommunicator;
use nostr_relay_client::{
    ClientError, Communicator, MessageStream, MultiRelayClient, StreamSubscription,
};
use std::sync::{Arc, Mutex, PoisonError};

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

fn multi_line_event() -> Event {
    Event {
        id: Some("cff674d3d7e741120883a9aacee054d69830dd0e6e2ff549d5b6b3ceaa88df4d".to_string()),
        pubkey: Some("819d714d18439d8add3a5a89d4196c0f858f5e5913b547764b0eeeacbbb48028".to_string()),
        created_at: 1677143276,
        kind: KIND_SHORT_TEXT_NOTE,
        content: "Test message. \n\nMulti line. !@#$%^&*()\n\nhttps://nostr.mkotas.cz \n\n“✓” \"\" '' OK".to_string(),
        sig: Some("303fd07c2f5345339d6d534ef1efb6a2619f2fafdf301627e4a7a68e7ab5486cd435b568616c341e948f9e09b5b8e0df5fa2ac3a3404b4f7aebc3db88562014a".to_string()),
        ..Event::default()
    }
}

const EXPECTED_EVENT_FRAME: &str = concat!(
    r#"["EVENT",{"#,
    r#""id":"cff674d3d7e741120883a9aacee054d69830dd0e6e2ff549d5b6b3ceaa88df4d","#,
    r#""pubkey":"819d714d18439d8add3a5a89d4196c0f858f5e5913b547764b0eeeacbbb48028","#,
    r#""created_at":1677143276,"kind":1,"tags":[],"#,
    r#""content":"Test message. \n\nMulti line. !@#$%^&*()\n\nhttps://nostr.mkotas.cz \n\n“✓” \"\" '' OK","#,
    r#""sig":"303fd07c2f5345339d6d534ef1efb6a2619f2fafdf301627e4a7a68e7ab5486cd435b568616c341e948f9e09b5b8e0df5fa2ac3a3404b4f7aebc3db88562014a""#,
    r#"}]"#
);

fn three_relays() -> (MultiRelayClient, Vec<Arc<FakeCommunicator>>) {
    let fakes: Vec<Arc<FakeCommunicator>> = ["first", "second", "third"]
        .into_iter()
        .map(FakeCommunicator::shared)
        .collect();
    let multi = MultiRelayClient::with_communicators(
        fakes
            .iter()
            .map(|fake| Arc::clone(fake) as Arc<dyn Communicator>),
    );
    (multi, fakes)
}

#[test]
fn test_broadcast_sends_identical_frame_to_every_relay() -> anyhow::Result<()> {
    let (multi, fakes) = three_relays();

    multi.send(&EventRequest::new(multi_line_event()))?;

    for fake in &fakes {
        assert_eq!(fake.sent_messages(), vec![EXPECTED_EVENT_FRAME.to_string()]);
    }
    Ok(())
}

#[test]
fn test_broadcast_attempts_every_relay_and_aggregates_failures() {
    let (multi, fakes) = three_relays();
    fakes[0].set_fail_sends(true);
    fakes[2].set_fail_sends(true);

    let error = multi.send(&CloseRequest::new("timeline")).err();

    assert!(matches!(error, Some(ClientError::Broadcast { .. })));
    assert_eq!(
        error.as_ref().map(ClientError::failed_relays),
        Some(vec!["first", "third"])
    );
    assert_eq!(
        fakes[1].sent_messages(),
        vec![r#"["CLOSE","timeline"]"#.to_string()]
    );
}

#[test]
fn test_broadcast_with_no_relays_is_a_no_op() -> anyhow::Result<()> {
    let multi = MultiRelayClient::new();
    assert!(multi.is_empty());
    multi.send(&CloseRequest::new("x"))?;
    Ok(())
}

#[test]
fn test_send_to_targets_one_relay() -> anyhow::Result<()> {
    let (multi, fakes) = three_relays();

    assert!(multi.send_to("second", &CloseRequest::new("only-me"))?);
    assert!(!multi.send_to("missing", &CloseRequest::new("nobody"))?);

    assert!(fakes[0].sent_messages().is_empty());
    assert_eq!(
        fakes[1].sent_messages(),
        vec![r#"["CLOSE","only-me"]"#.to_string()]
    );
    assert!(fakes[2].sent_messages().is_empty());
    Ok(())
}

#[test]
fn test_streams_forward_with_relay_name() {
    let (multi, fakes) = three_relays();
    let streams = multi.streams();
    let (_events, events) = collect(streams.events());
    let (_eose, eose) = collect(streams.eose());
    let (_notices, notices) = collect(streams.notices());
    let (_ok, ok) = collect(streams.ok());
    let (_unknown, unknown) = collect(streams.unknown_messages());
    let (_raw, raw) = collect(streams.unknown_raw());

    let event_frame = format!(
        "[\"EVENT\",\"sub\",{}]",
        EXPECTED_EVENT_FRAME
            .trim_start_matches("[\"EVENT\",")
            .trim_end_matches(']')
    );
    for fake in &fakes {
        fake.push_frame(event_frame.clone());
    }
    fakes[1].push_frame(r#"["EOSE","sub"]"#);
    fakes[2].push_frame(r#"["NOTICE","slow down"]"#);
    fakes[0].push_frame(r#"["OK","cff674",false,"blocked: spam"]"#);
    fakes[0].push_frame(r#"["CLOSED","sub","error"]"#);
    fakes[2].push_frame("garbage");

    let names: Vec<String> = snapshot(&events)
        .into_iter()
        .map(|item| item.relay_name)
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);

    assert_eq!(
        snapshot(&eose).first().map(|item| item.relay_name.clone()),
        Some("second".to_string())
    );
    assert_eq!(
        snapshot(&notices).first().map(|item| item.relay_name.clone()),
        Some("third".to_string())
    );

    let ok = snapshot(&ok);
    assert_eq!(ok.len(), 1);
    assert_eq!(ok[0].relay_name, "first");
    assert!(!ok[0].message.accepted);

    assert_eq!(snapshot(&unknown).len(), 1);
    assert_eq!(
        snapshot(&raw).first().map(|item| item.message.text.clone()),
        Some("garbage".to_string())
    );
}

#[test]
fn test_remove_registration_stops_forwarding() -> anyhow::Result<()> {
    let (multi, fakes) = three_relays();
    let (_eose, eose) = collect(multi.streams().eose());

    assert!(multi.find_client("second").is_some());
    assert!(multi.remove_registration("second"));
    assert!(!multi.remove_registration("second"));
    assert!(multi.find_client("second").is_none());

    fakes[1].push_frame(r#"["EOSE","ignored"]"#);
    fakes[0].push_frame(r#"["EOSE","kept"]"#);

    let items = snapshot(&eose);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].relay_name, "first");

    multi.send(&CloseRequest::new("after-removal"))?;
    assert!(fakes[1].sent_messages().is_empty());
    assert_eq!(fakes[0].sent_messages().len(), 1);
    Ok(())
}

#[test]
fn test_find_client_and_registration_order() {
    let (multi, _fakes) = three_relays();

    let names: Vec<String> = multi
        .clients()
        .iter()
        .map(|client| client.name().to_string())
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(multi.len(), 3);

    let third = multi.find_client("third");
    assert_eq!(third.map(|client| client.name().to_string()), Some("third".to_string()));
    assert!(multi.find_client("fourth").is_none());
}

#[test]
fn test_registered_client_keeps_its_own_streams() {
    let multi = MultiRelayClient::new();
    let fake = FakeCommunicator::shared("solo");
    let client = multi.register_communicator(fake.clone());

    let (_own, own) = collect(client.streams().notices());
    let (_merged, merged) = collect(multi.streams().notices());
    fake.push_frame(r#"["NOTICE","hi"]"#);

    assert_eq!(snapshot(&own).len(), 1);
    assert_eq!(snapshot(&merged).len(), 1);
}

#[test]
fn test_dropping_multi_client_detaches_forwards() {
    let fake = FakeCommunicator::shared("solo");
    let multi = MultiRelayClient::new();
    let client = multi.register_communicator(fake.clone());
    assert_eq!(client.streams().events().observer_count(), 1);

    drop(multi);
    assert_eq!(client.streams().events().observer_count(), 0);
}
