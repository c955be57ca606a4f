use super::*;
use crate::{render::HtmlRenderer, store::MemoryUserStore};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use shared::domain::ChatEvent;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<ClientFrame>>>,
    events: broadcast::Sender<ServerFrame>,
    fail: bool,
}

impl RecordingTransport {
    fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            events,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn sent(&self) -> Vec<ClientFrame> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn emit(&self, frame: ClientFrame) -> Result<()> {
        if self.fail {
            return Err(anyhow!("transport unavailable"));
        }
        self.sent.lock().expect("lock").push(frame);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerFrame> {
        self.events.subscribe()
    }
}

type TestController = ChatController<RecordingTransport, HtmlRenderer<Utc>, MemoryUserStore>;

fn controller(variant: PageVariant) -> TestController {
    controller_with(RecordingTransport::new(), MemoryUserStore::default(), variant)
}

fn controller_with(
    transport: RecordingTransport,
    store: MemoryUserStore,
    variant: PageVariant,
) -> TestController {
    ChatController::new(transport, HtmlRenderer::new(Utc), store, variant)
}

fn type_in(controller: &mut TestController, user: &str, message: &str) {
    let page = controller.page_mut();
    page.user = user.to_string();
    page.message = message.to_string();
}

#[tokio::test]
async fn empty_name_is_rejected_without_emitting() {
    let mut controller = controller(PageVariant::Basic);
    type_in(&mut controller, "", "hello");

    let outcome = controller.send(100).await.expect("send");
    assert_eq!(outcome, SendOutcome::Rejected);
    assert!(controller.transport().sent().is_empty());
    assert_eq!(controller.page().alerts(), [REQUIRED_FIELDS_ALERT.to_string()]);
    assert!(controller.page().message.is_empty());
    assert!(!controller.is_joined());
}

#[tokio::test]
async fn empty_message_is_rejected_without_emitting() {
    let mut controller = controller(PageVariant::Basic);
    type_in(&mut controller, "alice", "");

    assert_eq!(
        controller.send(100).await.expect("send"),
        SendOutcome::Rejected
    );
    assert!(controller.transport().sent().is_empty());
    assert_eq!(controller.page().alerts().len(), 1);
}

#[tokio::test]
async fn first_send_joins_once_then_chats() {
    let mut controller = controller(PageVariant::Basic);
    type_in(&mut controller, "alice", "hello");
    assert_eq!(controller.send(100).await.expect("send"), SendOutcome::Sent);

    controller.page_mut().message = "again".into();
    assert_eq!(controller.send(101).await.expect("send"), SendOutcome::Sent);

    let sent = controller.transport().sent();
    assert_eq!(
        sent,
        vec![
            ClientFrame::Join("alice".into()),
            ClientFrame::Chat(ChatMessage::new("alice", "hello", 100)),
            ClientFrame::Chat(ChatMessage::new("alice", "again", 101)),
        ]
    );
    assert!(controller.is_joined());
    assert!(controller.page().message.is_empty());
    assert!(controller.page().alerts().is_empty());
}

#[tokio::test]
async fn chat_payload_serializes_with_integer_timestamp() {
    let mut controller = controller(PageVariant::Basic);
    type_in(&mut controller, "bob", "hi");
    controller.send(1_700_000_000).await.expect("send");

    let sent = controller.transport().sent();
    let value = serde_json::to_value(&sent[1]).expect("json");
    assert_eq!(value["event"], "chat");
    assert_eq!(value["data"]["user"], "bob");
    assert_eq!(value["data"]["message"], "hi");
    assert!(value["data"]["timestamp"].is_i64());
}

#[tokio::test]
async fn failed_join_leaves_controller_unjoined() {
    let mut controller = controller_with(
        RecordingTransport::failing(),
        MemoryUserStore::default(),
        PageVariant::Basic,
    );
    type_in(&mut controller, "alice", "hello");

    assert!(controller.send(100).await.is_err());
    assert!(!controller.is_joined());
    assert!(controller.page().message.is_empty());
}

#[test]
fn received_message_is_rendered_and_clears_feedback() {
    let mut controller = controller(PageVariant::Basic);
    controller.handle(&ServerFrame::Typing("carol".into()));
    assert!(controller.page().feedback.contains("carol"));

    controller.handle(&ServerFrame::Chat(ChatEvent::from_message(ChatMessage::new(
        "carol",
        "good morning",
        1_700_000_000,
    ))));

    assert!(controller.page().feedback.is_empty());
    let output = controller.page().output_html();
    assert!(output.contains("carol"));
    assert!(output.contains("good morning"));
}

#[test]
fn join_and_leave_events_are_appended_in_order() {
    let mut controller = controller(PageVariant::Basic);
    controller.handle(&ServerFrame::Chat(ChatEvent::join("dave", 0)));
    controller.handle(&ServerFrame::Chat(ChatEvent::leave("dave", 0)));

    let output = controller.page().output();
    assert_eq!(output.len(), 2);
    assert!(output[0].contains("dave joined"));
    assert!(output[1].contains("dave left"));
}

#[test]
fn typing_event_reflects_the_given_name() {
    let mut controller = controller(PageVariant::Basic);
    controller.handle(&ServerFrame::Typing("erin".into()));
    assert_eq!(
        controller.page().feedback,
        "<p><em>erin is typing a message...</em></p>"
    );
}

#[test]
fn participant_count_updates_title_only_when_present() {
    let mut presence = controller(PageVariant::Presence);
    presence.handle(&ServerFrame::Participant(3));
    assert_eq!(presence.page().title(), Some("3 participants online"));

    let mut basic = controller(PageVariant::Basic);
    basic.handle(&ServerFrame::Participant(3));
    assert_eq!(basic.page().title(), None);
    assert!(basic.page().output().is_empty());
}

#[test]
fn error_frames_are_not_rendered() {
    let mut controller = controller(PageVariant::Presence);
    controller.handle(&ServerFrame::Error(shared::error::ApiError::new(
        shared::error::ErrorCode::Validation,
        "bad frame",
    )));
    assert!(controller.page().output().is_empty());
    assert!(controller.page().feedback.is_empty());
}

#[tokio::test]
async fn remembered_variant_restores_and_saves_the_name() {
    let controller = controller_with(
        RecordingTransport::new(),
        MemoryUserStore::with_user("frank"),
        PageVariant::Remembered,
    );
    assert_eq!(controller.page().user, "frank");

    let mut controller = controller_with(
        RecordingTransport::new(),
        MemoryUserStore::default(),
        PageVariant::Presence,
    );
    type_in(&mut controller, "gina", "hey");
    controller.send(5).await.expect("send");
    assert_eq!(
        controller.store().load().expect("load").as_deref(),
        Some("gina")
    );
}

#[tokio::test]
async fn basic_variant_neither_restores_nor_saves() {
    let mut controller = controller_with(
        RecordingTransport::new(),
        MemoryUserStore::with_user("frank"),
        PageVariant::Basic,
    );
    assert!(controller.page().user.is_empty());

    type_in(&mut controller, "gina", "hey");
    controller.send(5).await.expect("send");
    assert_eq!(
        controller.store().load().expect("load").as_deref(),
        Some("frank")
    );
}

#[tokio::test]
async fn key_presses_announce_typing_and_enter_sends() {
    let mut controller = controller(PageVariant::Basic);
    controller.page_mut().user = "hana".into();

    assert_eq!(
        controller.key_press(Key::Char('h'), 1).await.expect("key"),
        None
    );
    assert_eq!(
        controller.key_press(Key::Char('i'), 1).await.expect("key"),
        None
    );
    assert_eq!(controller.page().message, "hi");
    assert_eq!(
        controller.key_press(Key::Enter, 2).await.expect("key"),
        Some(SendOutcome::Sent)
    );

    let sent = controller.transport().sent();
    assert_eq!(
        sent,
        vec![
            ClientFrame::Typing("hana".into()),
            ClientFrame::Typing("hana".into()),
            ClientFrame::Typing("hana".into()),
            ClientFrame::Join("hana".into()),
            ClientFrame::Chat(ChatMessage::new("hana", "hi", 2)),
        ]
    );
}

#[tokio::test]
async fn typing_is_not_announced_without_a_name() {
    let mut controller = controller(PageVariant::Basic);
    controller.key_press(Key::Char('x'), 1).await.expect("key");
    assert!(controller.transport().sent().is_empty());
}

#[tokio::test]
async fn leave_is_emitted_once_and_only_after_joining() {
    let mut controller = controller(PageVariant::Basic);
    controller.leave().await.expect("leave");
    assert!(controller.transport().sent().is_empty());

    type_in(&mut controller, "ivan", "bye soon");
    controller.send(1).await.expect("send");
    controller.leave().await.expect("leave");
    controller.leave().await.expect("leave");

    let leaves = controller
        .transport()
        .sent()
        .into_iter()
        .filter(|frame| matches!(frame, ClientFrame::Leave(_)))
        .count();
    assert_eq!(leaves, 1);
    assert!(!controller.is_joined());
}

#[tokio::test]
async fn leave_uses_the_name_that_joined() {
    let mut controller = controller(PageVariant::Basic);
    type_in(&mut controller, "alice", "hi");
    controller.send(1).await.expect("send");

    controller.page_mut().user = "bob".to_string();
    controller.leave().await.expect("leave");

    assert_eq!(
        controller.transport().sent().last(),
        Some(&ClientFrame::Leave("alice".to_string()))
    );
}

#[tokio::test]
async fn run_renders_until_the_transport_closes() {
    let mut controller = controller(PageVariant::Presence);

    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);
    controller.on(EventName::Chat, move |_| {
        *counter.lock().expect("lock") += 1;
    });

    let (events, frames) = broadcast::channel(8);
    events
        .send(ServerFrame::Chat(ChatEvent::join("jade", 0)))
        .expect("send");
    events.send(ServerFrame::Participant(2)).expect("send");
    drop(events);

    controller.run(frames).await;

    assert_eq!(controller.page().output().len(), 1);
    assert_eq!(controller.page().title(), Some("2 participants online"));
    assert_eq!(*seen.lock().expect("lock"), 1);
}
