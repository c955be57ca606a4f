//! The chat room hub: fans frames out to every connected participant and keeps a
//! short archive of recent room events for late joiners.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{unix_now, ChatEvent, ChatMessage},
    protocol::ServerFrame,
};
use tokio::sync::broadcast;
use tracing::debug;

pub(crate) const DEFAULT_ARCHIVE_CAPACITY: usize = 5;
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub(crate) struct Chatroom {
    inner: Arc<RoomInner>,
}

struct RoomInner {
    archive_capacity: usize,
    frames: broadcast::Sender<ServerFrame>,
    state: Mutex<RoomState>,
}

#[derive(Default)]
struct RoomState {
    archive: VecDeque<ChatEvent>,
    participants: usize,
}

pub(crate) struct Subscription {
    pub(crate) archive: Vec<ChatEvent>,
    pub(crate) frames: broadcast::Receiver<ServerFrame>,
    pub(crate) presence: Presence,
}

/// Counts as one participant until dropped.
pub(crate) struct Presence {
    room: Chatroom,
}

impl Drop for Presence {
    fn drop(&mut self) {
        let mut state = self.room.lock_state();
        state.participants = state.participants.saturating_sub(1);
        let count = state.participants;
        let _ = self.room.inner.frames.send(ServerFrame::Participant(count));
        debug!(participants = count, "participant left the room");
    }
}

impl Default for Chatroom {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_CAPACITY, DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Chatroom {
    pub(crate) fn new(archive_capacity: usize, channel_capacity: usize) -> Self {
        let (frames, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            inner: Arc::new(RoomInner {
                archive_capacity,
                frames,
                state: Mutex::new(RoomState::default()),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RoomState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a participant. The archive snapshot and the receiver are taken
    /// under one lock, so no published event is missed or seen twice.
    pub(crate) fn subscribe(&self) -> Subscription {
        let mut state = self.lock_state();
        let archive = state.archive.iter().cloned().collect();
        let frames = self.inner.frames.subscribe();
        state.participants += 1;
        let count = state.participants;
        let _ = self.inner.frames.send(ServerFrame::Participant(count));
        drop(state);

        debug!(participants = count, "participant joined the room");
        Subscription {
            archive,
            frames,
            presence: Presence { room: self.clone() },
        }
    }

    pub(crate) fn publish(&self, event: ChatEvent) {
        let mut state = self.lock_state();
        let _ = self.inner.frames.send(ServerFrame::Chat(event.clone()));

        if self.inner.archive_capacity == 0 {
            return;
        }
        while state.archive.len() >= self.inner.archive_capacity {
            state.archive.pop_front();
        }
        state.archive.push_back(event);
    }

    pub(crate) fn join(&self, user: &str) {
        self.publish(ChatEvent::join(user, unix_now()));
    }

    pub(crate) fn leave(&self, user: &str) {
        self.publish(ChatEvent::leave(user, unix_now()));
    }

    pub(crate) fn say(&self, message: ChatMessage) {
        self.publish(ChatEvent::from_message(message));
    }

    pub(crate) fn typing(&self, user: &str) {
        let _ = self.inner.frames.send(ServerFrame::Typing(user.to_string()));
    }

    pub(crate) fn participants(&self) -> usize {
        self.lock_state().participants
    }

    pub(crate) fn recent_events(&self) -> Vec<ChatEvent> {
        self.lock_state().archive.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "tests/chatroom_tests.rs"]
mod tests;
