//! Channel framing over scripted transports, including replies split across reads.
use landlord::agent::{Decision, ResponseShape};
use landlord::config::ProtocolConfig;
use landlord::protocol::framer::encode;
use landlord::protocol::wire::decode_reply;
use landlord::protocol::{Channel, Framing, ProtocolError};
use tokio_test::io::Builder;

fn legacy() -> ProtocolConfig {
    ProtocolConfig {
        framing: Framing::Legacy,
        ..ProtocolConfig::default()
    }
}

const REPLY: &str = r#"{"function": "buy_property", "param_dict": {"player": "player_1", "asset": "Boardwalk"}}"#;

#[tokio::test]
async fn legacy_reply_split_across_reads_matches_single_read() {
    let (head, tail) = REPLY.split_at(23);
    let mut split = Channel::new(Builder::new().read(head.as_bytes()).read(tail.as_bytes()).build(), &legacy());
    let mut whole = Channel::new(Builder::new().read(REPLY.as_bytes()).build(), &legacy());

    let a = split.recv().await.unwrap();
    let b = whole.recv().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(
        decode_reply(ResponseShape::Action, &a).unwrap(),
        decode_reply(ResponseShape::Action, &b).unwrap()
    );
}

#[tokio::test]
async fn length_prefixed_reply_split_inside_the_prefix() {
    let wire = encode(Framing::LengthPrefixed, REPLY);
    let mock = Builder::new().read(&wire[..2]).read(&wire[2..10]).read(&wire[10..]).build();
    let mut ch = Channel::new(mock, &ProtocolConfig::default());
    assert_eq!(ch.recv().await.unwrap(), REPLY);
}

#[tokio::test]
async fn length_prefixed_messages_in_one_read_are_both_delivered() {
    let mut wire = encode(Framing::LengthPrefixed, "True");
    wire.extend(encode(Framing::LengthPrefixed, "-1"));
    let mut ch = Channel::new(Builder::new().read(&wire).build(), &ProtocolConfig::default());

    let first = ch.recv().await.unwrap();
    let second = ch.recv().await.unwrap();
    assert_eq!(decode_reply(ResponseShape::Flag, &first).unwrap(), Decision::Flag(true));
    assert_eq!(decode_reply(ResponseShape::Code, &second).unwrap(), Decision::Code(-1));
}

#[tokio::test]
async fn legacy_back_to_back_messages_are_rejected() {
    let mock = Builder::new().read(br#"{"function": "skip_turn"}{"function": "skip_turn"}"#).build();
    let mut ch = Channel::new(mock, &legacy());
    assert!(matches!(ch.recv().await, Err(ProtocolError::BackToBack)));
}

#[tokio::test]
async fn legacy_endless_fragment_exhausts_retry_budget() {
    let cfg = ProtocolConfig {
        max_partial_reads: 3,
        ..legacy()
    };
    let mut builder = Builder::new();
    builder.read(b"{\"function\": \"");
    for _ in 0..3 {
        builder.read(b"xx");
    }
    let mut ch = Channel::new(builder.build(), &cfg);
    assert!(matches!(ch.recv().await, Err(ProtocolError::RetryBudgetExhausted(3))));
}

#[tokio::test]
async fn peer_hanging_up_mid_message_is_connection_closed() {
    let mut ch = Channel::new(Builder::new().read(b"{\"func").build(), &legacy());
    assert!(matches!(ch.recv().await, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn send_frames_payload() {
    let mock = Builder::new().write(&encode(Framing::LengthPrefixed, "True")).build();
    let mut ch = Channel::new(mock, &ProtocolConfig::default());
    ch.send("True").await.unwrap();
}
