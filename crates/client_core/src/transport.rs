use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::{ClientFrame, EventName, ServerFrame};
use tokio::sync::broadcast;

/// A real-time client speaking named events.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn emit(&self, frame: ClientFrame) -> Result<()>;
    fn subscribe(&self) -> broadcast::Receiver<ServerFrame>;
}

type Handler = Box<dyn FnMut(&ServerFrame) + Send>;

/// Callbacks registered per event name.
#[derive(Default)]
pub struct Handlers {
    by_event: HashMap<EventName, Vec<Handler>>,
}

impl Handlers {
    pub fn on<F>(&mut self, event: EventName, handler: F)
    where
        F: FnMut(&ServerFrame) + Send + 'static,
    {
        self.by_event.entry(event).or_default().push(Box::new(handler));
    }

    /// Calls every handler registered for the frame's event in registration
    /// order and returns how many ran.
    pub fn dispatch(&mut self, frame: &ServerFrame) -> usize {
        match self.by_event.get_mut(&frame.name()) {
            Some(handlers) => {
                for handler in handlers.iter_mut() {
                    handler(frame);
                }
                handlers.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
