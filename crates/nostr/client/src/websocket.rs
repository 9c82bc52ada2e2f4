//! WebSocket communicator.
//!
//! Runs one supervisor task per started communicator. The task connects,
//! pumps frames in both directions, and after a lost connection waits
//! `reconnect_delay` before connecting again. Outbound frames queue while
//! the socket is down and are written once it is back.

use crate::communicator::{
    Communicator, DisconnectionInfo, DisconnectionType, ReconnectionInfo, ReconnectionType,
    TransportStreams,
};
use crate::error::{ClientError, Result};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket communicator configuration.
#[derive(Debug, Clone)]
pub struct WebsocketConfig {
    pub connect_timeout: Duration,
    /// Fixed delay before reconnecting. `None` disables reconnect.
    pub reconnect_delay: Option<Duration>,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Some(Duration::from_secs(5)),
        }
    }
}

struct Running {
    outgoing: mpsc::UnboundedSender<String>,
    shutdown: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl Running {
    // the supervisor owns the receiving end until it exits
    fn is_alive(&self) -> bool {
        !self.outgoing.is_closed()
    }
}

/// A [`Communicator`] over `tokio-tungstenite`.
pub struct WebsocketCommunicator {
    name: String,
    url: Url,
    config: WebsocketConfig,
    runtime: Handle,
    streams: Arc<TransportStreams>,
    running: Mutex<Option<Running>>,
}

impl WebsocketCommunicator {
    /// Create a communicator with default config on the current runtime.
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self> {
        Self::with_config(name, url, WebsocketConfig::default())
    }

    /// Create a communicator with custom config on the current runtime.
    pub fn with_config(name: impl Into<String>, url: &str, config: WebsocketConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|error| ClientError::Internal(format!("no tokio runtime: {}", error)))?;
        Self::with_runtime(name, url, config, runtime)
    }

    /// Create a communicator whose supervisor runs on `runtime`.
    pub fn with_runtime(
        name: impl Into<String>,
        url: &str,
        config: WebsocketConfig,
        runtime: Handle,
    ) -> Result<Self> {
        let parsed_url = Url::parse(url)?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(ClientError::InvalidUrl(format!(
                "URL must use ws:// or wss:// scheme, got: {}",
                parsed_url.scheme()
            )));
        }

        Ok(Self {
            name: name.into(),
            url: parsed_url,
            config,
            runtime,
            streams: Arc::new(TransportStreams::default()),
            running: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Communicator for WebsocketCommunicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> Result<()> {
        let mut running = self.lock();
        if running.as_ref().is_some_and(Running::is_alive) {
            return Ok(());
        }

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let supervisor = Supervisor {
            name: self.name.clone(),
            url: self.url.clone(),
            config: self.config.clone(),
            streams: Arc::clone(&self.streams),
            outgoing: outgoing_rx,
            shutdown: shutdown_rx,
        };
        let task = self.runtime.spawn(supervisor.run());

        *running = Some(Running {
            outgoing: outgoing_tx,
            shutdown: shutdown_tx,
            _task: task,
        });
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if let Some(running) = self.lock().take() {
            // the supervisor may already be gone if reconnect is disabled
            let _ = running.shutdown.send(true);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(Running::is_alive)
    }

    fn send(&self, text: &str) -> Result<()> {
        let running = self.lock();
        let running = running.as_ref().ok_or(ClientError::NotConnected)?;
        running
            .outgoing
            .send(text.to_string())
            .map_err(|_| ClientError::NotConnected)
    }

    fn streams(&self) -> &TransportStreams {
        &self.streams
    }
}

impl Drop for WebsocketCommunicator {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

enum ConnectionEnd {
    Shutdown,
    Lost,
    Error(ClientError),
}

struct Supervisor {
    name: String,
    url: Url,
    config: WebsocketConfig,
    streams: Arc<TransportStreams>,
    outgoing: mpsc::UnboundedReceiver<String>,
    shutdown: watch::Receiver<bool>,
}

impl Supervisor {
    async fn run(mut self) {
        let mut kind = ReconnectionType::Initial;

        loop {
            let connected = tokio::select! {
                _ = self.shutdown.changed() => break,
                result = timeout(self.config.connect_timeout, connect_async(self.url.as_str())) => result,
            };

            let end = match connected {
                Ok(Ok((stream, _response))) => {
                    info!(relay = %self.name, url = %self.url, "connected");
                    self.streams
                        .reconnection_happened
                        .publish(&ReconnectionInfo { kind: kind.clone() });
                    kind = ReconnectionType::Lost;
                    self.pump(stream).await
                }
                Ok(Err(error)) => ConnectionEnd::Error(ClientError::WebSocket(error.to_string())),
                Err(_) => ConnectionEnd::Error(ClientError::Timeout(format!(
                    "connection timeout after {:?}",
                    self.config.connect_timeout
                ))),
            };

            let disconnection = match end {
                ConnectionEnd::Shutdown => break,
                ConnectionEnd::Lost => {
                    warn!(relay = %self.name, "connection lost");
                    DisconnectionType::Lost
                }
                ConnectionEnd::Error(error) => {
                    warn!(relay = %self.name, %error, "websocket error");
                    DisconnectionType::Error(error.to_string())
                }
            };
            self.streams
                .disconnection_happened
                .publish(&DisconnectionInfo {
                    kind: disconnection,
                });

            let Some(delay) = self.config.reconnect_delay else {
                return;
            };
            tokio::select! {
                _ = self.shutdown.changed() => break,
                () = tokio::time::sleep(delay) => {}
            }
            info!(relay = %self.name, "reconnecting");
        }

        info!(relay = %self.name, "stopped");
        self.streams.disconnection_happened.publish(&DisconnectionInfo {
            kind: DisconnectionType::ByUser,
        });
    }

    async fn pump(&mut self, stream: WsStream) -> ConnectionEnd {
        let (mut writer, mut reader) = stream.split();

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = writer.send(Message::Close(None)).await;
                    return ConnectionEnd::Shutdown;
                }
                text = self.outgoing.recv() => {
                    let Some(text) = text else {
                        return ConnectionEnd::Shutdown;
                    };
                    if let Err(error) = writer.send(Message::Text(text)).await {
                        return ConnectionEnd::Error(ClientError::WebSocket(error.to_string()));
                    }
                }
                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.streams.message_received.publish(&text);
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => self.streams.message_received.publish(&text),
                        Err(_) => debug!(relay = %self.name, "ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(error) = writer.send(Message::Pong(payload)).await {
                            return ConnectionEnd::Error(ClientError::WebSocket(error.to_string()));
                        }
                    }
                    Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        debug!(relay = %self.name, ?frame, "close frame received");
                        return ConnectionEnd::Lost;
                    }
                    Some(Err(error)) => {
                        return ConnectionEnd::Error(ClientError::WebSocket(error.to_string()));
                    }
                    None => return ConnectionEnd::Lost,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Case {
        name: &'static str,
        input: &'static str,
        expected_error_fragment: &'static str,
    }

    #[tokio::test]
    async fn test_rejects_bad_urls() {
        let cases = [
            Case {
                name: "http scheme",
                input: "http://relay.example.com",
                expected_error_fragment: "ws:// or wss://",
            },
            Case {
                name: "not a url",
                input: "relay.example.com",
                expected_error_fragment: "URL parse error",
            },
        ];

        for case in cases {
            let error = WebsocketCommunicator::new("relay", case.input).err();
            let message = error.map(|error| error.to_string()).unwrap_or_default();
            assert!(
                message.contains(case.expected_error_fragment),
                "{}: got {:?}",
                case.name,
                message
            );
        }
    }

    #[tokio::test]
    async fn test_send_before_start_is_not_connected() -> Result<()> {
        let communicator = WebsocketCommunicator::new("damus", "wss://relay.damus.io")?;
        assert_eq!(communicator.name(), "damus");
        assert!(!communicator.is_running());
        assert!(matches!(
            communicator.send("[\"CLOSE\",\"x\"]"),
            Err(ClientError::NotConnected)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_no_op() -> Result<()> {
        let communicator = WebsocketCommunicator::new("local", "ws://127.0.0.1:9")?;
        communicator.stop()?;
        assert!(!communicator.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn test_supervisor_exit_clears_running_without_reconnect() -> anyhow::Result<()> {
        let config = WebsocketConfig {
            connect_timeout: Duration::from_millis(200),
            reconnect_delay: None,
        };
        // nothing listens on the discard port
        let communicator = WebsocketCommunicator::with_config("local", "ws://127.0.0.1:9", config)?;

        let disconnections = Arc::new(Mutex::new(Vec::new()));
        let _subscription = {
            let disconnections = Arc::clone(&disconnections);
            communicator.disconnection_happened().subscribe(move |info: &DisconnectionInfo| {
                disconnections
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(info.kind.clone());
            })
        };

        communicator.start()?;
        assert!(communicator.is_running());

        for _ in 0..100 {
            if !communicator.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(!communicator.is_running());
        assert!(matches!(
            communicator.send("[\"CLOSE\",\"x\"]"),
            Err(ClientError::NotConnected)
        ));
        let seen = disconnections.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert!(matches!(
            seen.as_slice(),
            [DisconnectionType::Error(message)]
                if message.starts_with("WebSocket error") || message.starts_with("timeout error")
        ));

        // a dead supervisor does not block a fresh start
        communicator.start()?;
        assert!(communicator.is_running());
        communicator.stop()?;
        assert!(!communicator.is_running());
        Ok(())
    }

    #[test]
    fn test_default_config() {
        let config = WebsocketConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Some(Duration::from_secs(5)));
    }
}
