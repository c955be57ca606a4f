use super::*;
use shared::{domain::ChatEvent, error::ApiException};

#[test]
fn encode_frame_produces_event_and_data() {
    assert_eq!(
        encode_frame(&ServerFrame::Participant(2)).as_deref(),
        Some(r#"{"event":"participant","data":2}"#)
    );
}

#[test]
fn encode_frame_keeps_chat_event_field_names() {
    let text = encode_frame(&ServerFrame::Chat(ChatEvent::join("alice", 7))).expect("encoded");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["event"], "chat");
    assert_eq!(value["data"]["EvtType"], "join");
    assert_eq!(value["data"]["User"], "alice");
}

#[test]
fn encode_frame_serializes_validation_errors() {
    let frame = ServerFrame::Error(ApiException::validation("bad frame").into());
    let value: serde_json::Value =
        serde_json::from_str(&encode_frame(&frame).expect("encoded")).expect("json");
    assert_eq!(value["data"]["code"], "validation");
    assert_eq!(value["data"]["message"], "bad frame");
}
