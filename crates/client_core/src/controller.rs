//! The chat page controller: validates and sends what the user typed, and
//! renders what the transport delivers.

use anyhow::Result;
use shared::{
    domain::{ChatMessage, Timestamp},
    protocol::{ClientFrame, EventName, ServerFrame},
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    page::{Page, PageVariant},
    render::Renderer,
    store::UserStore,
    transport::{Handlers, Transport},
};

pub const REQUIRED_FIELDS_ALERT: &str = "Both Name and Message are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
}

pub struct ChatController<T, R, S> {
    transport: T,
    renderer: R,
    store: S,
    variant: PageVariant,
    page: Page,
    /// The name announced by the last `join`, until `leave`.
    joined: Option<String>,
    handlers: Handlers,
}

impl<T, R, S> ChatController<T, R, S>
where
    T: Transport,
    R: Renderer,
    S: UserStore,
{
    pub fn new(transport: T, renderer: R, store: S, variant: PageVariant) -> Self {
        let mut page = Page::new(variant);
        if variant.remembers_user() {
            match store.load() {
                Ok(Some(user)) => {
                    debug!(%user, "restored remembered user name");
                    page.user = user;
                }
                Ok(None) => {}
                Err(err) => warn!(%err, "failed to load remembered user name"),
            }
        }

        Self {
            transport,
            renderer,
            store,
            variant,
            page,
            joined: None,
            handlers: Handlers::default(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn variant(&self) -> PageVariant {
        self.variant
    }

    pub fn is_joined(&self) -> bool {
        self.joined.is_some()
    }

    /// Registers an extra callback that runs after the page has been updated
    /// for a received frame.
    pub fn on<F>(&mut self, event: EventName, handler: F)
    where
        F: FnMut(&ServerFrame) + Send + 'static,
    {
        self.handlers.on(event, handler);
    }

    /// Sends the typed message. The message input is cleared afterwards, even
    /// when the submission is rejected or the transport fails.
    pub async fn send(&mut self, now: Timestamp) -> Result<SendOutcome> {
        let outcome = self.submit(now).await;
        self.page.message.clear();
        outcome
    }

    async fn submit(&mut self, now: Timestamp) -> Result<SendOutcome> {
        if self.page.user.is_empty() || self.page.message.is_empty() {
            self.page.alert(REQUIRED_FIELDS_ALERT);
            return Ok(SendOutcome::Rejected);
        }

        let user = self.page.user.clone();
        if self.joined.is_none() {
            self.transport.emit(ClientFrame::Join(user.clone())).await?;
            self.joined = Some(user.clone());
            info!(%user, "joined");
            if self.variant.remembers_user() {
                if let Err(err) = self.store.save(&user) {
                    warn!(%err, "failed to remember user name");
                }
            }
        }

        let message = ChatMessage::new(user, self.page.message.clone(), now);
        debug!(user = %message.user, timestamp = message.timestamp, "sending message");
        self.transport.emit(ClientFrame::Chat(message)).await?;
        Ok(SendOutcome::Sent)
    }

    /// Every key press announces typing; Enter also sends.
    pub async fn key_press(&mut self, key: Key, now: Timestamp) -> Result<Option<SendOutcome>> {
        if !self.page.user.is_empty() {
            self.transport
                .emit(ClientFrame::Typing(self.page.user.clone()))
                .await?;
        }

        match key {
            Key::Enter => Ok(Some(self.send(now).await?)),
            Key::Char(c) => {
                self.page.message.push(c);
                Ok(None)
            }
        }
    }

    pub fn handle(&mut self, frame: &ServerFrame) {
        match frame {
            ServerFrame::Chat(event) => {
                self.page.feedback.clear();
                let entry = self.renderer.chat_event(event);
                self.page.append_output(entry);
            }
            ServerFrame::Typing(name) => {
                self.page.feedback = self.renderer.typing(name);
            }
            ServerFrame::Participant(count) => {
                let label = self.renderer.participants(*count);
                if !self.page.set_title(label) {
                    debug!(count, "participant count ignored without a title element");
                }
            }
            ServerFrame::Error(error) => {
                warn!(code = ?error.code, message = %error.message, "server reported an error");
            }
        }
        self.handlers.dispatch(frame);
    }

    /// Announces departure once per join, under the name that joined.
    pub async fn leave(&mut self) -> Result<()> {
        let Some(user) = self.joined.clone() else {
            return Ok(());
        };
        self.transport.emit(ClientFrame::Leave(user.clone())).await?;
        self.joined = None;
        info!(%user, "left");
        Ok(())
    }

    /// Renders frames until the transport closes.
    pub async fn run(&mut self, mut frames: broadcast::Receiver<ServerFrame>) {
        loop {
            match frames.recv().await {
                Ok(frame) => self.handle(&frame),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "controller lagged behind the transport");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
