//! Websocket implementation of [`Transport`].

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientFrame, ServerFrame};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{error::ClientError, transport::Transport};

const OUTGOING_CAPACITY: usize = 64;
const EVENTS_CAPACITY: usize = 1024;

enum Outgoing {
    Frame(String),
    Close,
}

pub struct WsTransport {
    outgoing: mpsc::Sender<Outgoing>,
    /// Created before the reader starts, so it holds every frame the server
    /// sends on connect. Handed to the first subscriber.
    initial: Mutex<Option<broadcast::Receiver<ServerFrame>>>,
    events: broadcast::Receiver<ServerFrame>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsTransport {
    /// Maps a server URL onto its websocket endpoint, e.g.
    /// `http://host:4000` to `ws://host:4000/ws`.
    pub fn ws_url(server_url: &str) -> Result<Url, ClientError> {
        let invalid = || ClientError::InvalidServerUrl(server_url.to_string());
        let mut url = Url::parse(server_url.trim()).map_err(|_| invalid())?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            _ => return Err(invalid()),
        };
        url.set_scheme(scheme).map_err(|_| invalid())?;

        if !url.path().ends_with("/ws") {
            let path = format!("{}/ws", url.path().trim_end_matches('/'));
            url.set_path(&path);
        }
        Ok(url)
    }

    pub async fn connect(server_url: &str) -> Result<Self> {
        let url = Self::ws_url(server_url)?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect websocket: {url}"))?;
        info!(%url, "websocket connected");
        let (mut sink, mut stream) = ws_stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::channel::<Outgoing>(OUTGOING_CAPACITY);
        let writer = tokio::spawn(async move {
            while let Some(item) = outgoing_rx.recv().await {
                match item {
                    Outgoing::Frame(text) => {
                        if let Err(err) = sink.send(Message::Text(text)).await {
                            warn!(%err, "websocket send failed");
                            break;
                        }
                    }
                    Outgoing::Close => {
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
        });

        let (events_tx, initial) = broadcast::channel(EVENTS_CAPACITY);
        let events = initial.resubscribe();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => {
                            let _ = events_tx.send(frame);
                        }
                        Err(err) => warn!(%err, "skipping undecodable server frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "websocket receive failed");
                        break;
                    }
                }
            }
            debug!("websocket reader finished");
        });

        Ok(Self {
            outgoing,
            initial: Mutex::new(Some(initial)),
            events,
            reader,
            writer,
        })
    }

    /// Sends a close frame and waits for the writer to flush it.
    pub async fn close(&mut self) -> Result<()> {
        self.outgoing
            .send(Outgoing::Close)
            .await
            .map_err(|_| ClientError::TransportClosed)?;
        if let Err(err) = (&mut self.writer).await {
            debug!(%err, "websocket writer ended abnormally");
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn emit(&self, frame: ClientFrame) -> Result<()> {
        let text = serde_json::to_string(&frame)?;
        debug!(event = %frame.name(), "emit");
        self.outgoing
            .send(Outgoing::Frame(text))
            .await
            .map_err(|_| ClientError::TransportClosed)?;
        Ok(())
    }

    /// The first subscriber sees everything received since `connect`; later
    /// ones start from the current tail.
    fn subscribe(&self) -> broadcast::Receiver<ServerFrame> {
        self.initial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| self.events.resubscribe())
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
#[path = "tests/ws_tests.rs"]
mod tests;
