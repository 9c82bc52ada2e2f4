//! Multi-relay client.
//!
//! Holds any number of [`RelayClient`]s, broadcasts outbound messages to all
//! of them and merges their inbound streams into one aggregate set. Each
//! forwarded item keeps the [`Received::relay_name`] of the relay it came
//! from.
//!
//! [`Received::relay_name`]: crate::streams::Received::relay_name

use crate::communicator::Communicator;
use crate::error::{ClientError, Result};
use crate::relay::{RelayClient, RelayClientConfig};
use crate::stream::{MessageStream, StreamSubscription};
use crate::streams::{ClientStreams, Received};
use nostr_core::ArrayMessage;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Registration {
    client: Arc<RelayClient>,
    // dropped on removal, which detaches the forwarding observers
    _forwards: Vec<StreamSubscription>,
}

/// Broadcasting client over a set of relay clients.
pub struct MultiRelayClient {
    config: RelayClientConfig,
    streams: Arc<ClientStreams>,
    registrations: Mutex<Vec<Registration>>,
}

impl MultiRelayClient {
    /// Create an empty multi-relay client.
    pub fn new() -> Self {
        Self::with_config(RelayClientConfig::default())
    }

    /// Create an empty multi-relay client. `config` applies to relay
    /// clients created by [`register_communicator`](Self::register_communicator).
    pub fn with_config(config: RelayClientConfig) -> Self {
        Self {
            config,
            streams: Arc::new(ClientStreams::new()),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Create a multi-relay client and register every communicator.
    pub fn with_communicators<I>(communicators: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Communicator>>,
    {
        let client = Self::new();
        for communicator in communicators {
            client.register_communicator(communicator);
        }
        client
    }

    /// Aggregate streams of every registered relay.
    pub fn streams(&self) -> &ClientStreams {
        &self.streams
    }

    /// Wrap a communicator in a relay client and register it.
    pub fn register_communicator(&self, communicator: Arc<dyn Communicator>) -> Arc<RelayClient> {
        let client = Arc::new(RelayClient::with_config(communicator, self.config));
        self.register_client(Arc::clone(&client));
        client
    }

    /// Register a relay client and start forwarding its streams.
    pub fn register_client(&self, client: Arc<RelayClient>) {
        let source = client.streams();
        let forwards = vec![
            forward(source.events(), &self.streams, ClientStreams::events),
            forward(source.notices(), &self.streams, ClientStreams::notices),
            forward(source.eose(), &self.streams, ClientStreams::eose),
            forward(source.ok(), &self.streams, ClientStreams::ok),
            forward(
                source.unknown_messages(),
                &self.streams,
                ClientStreams::unknown_messages,
            ),
            forward(source.unknown_raw(), &self.streams, ClientStreams::unknown_raw),
        ];

        debug!(relay = client.name(), "registered relay client");
        self.lock().push(Registration {
            client,
            _forwards: forwards,
        });
    }

    /// Remove the first relay client registered under `name` and stop
    /// forwarding its streams. Returns false when no client has that name.
    pub fn remove_registration(&self, name: &str) -> bool {
        let removed = {
            let mut registrations = self.lock();
            registrations
                .iter()
                .position(|registration| registration.client.name() == name)
                .map(|index| registrations.remove(index))
        };

        match removed {
            Some(_) => {
                debug!(relay = name, "removed relay client");
                true
            }
            None => false,
        }
    }

    /// Look up a registered relay client by communicator name.
    pub fn find_client(&self, name: &str) -> Option<Arc<RelayClient>> {
        self.lock()
            .iter()
            .find(|registration| registration.client.name() == name)
            .map(|registration| Arc::clone(&registration.client))
    }

    /// Snapshot of the registered clients, in registration order.
    pub fn clients(&self) -> Vec<Arc<RelayClient>> {
        self.lock()
            .iter()
            .map(|registration| Arc::clone(&registration.client))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Send a message to every registered relay, in registration order.
    ///
    /// Every relay is attempted. When any of them fail the error lists each
    /// failed relay; the others have already sent the message.
    pub fn send<M: ArrayMessage + fmt::Debug>(&self, message: &M) -> Result<()> {
        let mut failures = Vec::new();
        for client in self.clients() {
            if let Err(error) = client.send(message) {
                debug!(relay = client.name(), %error, "relay send failed");
                failures.push((client.name().to_string(), error));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Broadcast { failures })
        }
    }

    /// Send a message to one relay. Returns `Ok(false)` when no client is
    /// registered under `name`.
    pub fn send_to<M: ArrayMessage + fmt::Debug>(&self, name: &str, message: &M) -> Result<bool> {
        match self.find_client(name) {
            Some(client) => client.send(message).map(|()| true),
            None => Ok(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MultiRelayClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MultiRelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .clients()
            .iter()
            .map(|client| client.name().to_string())
            .collect();
        f.debug_struct("MultiRelayClient")
            .field("relays", &names)
            .finish()
    }
}

fn forward<T: 'static>(
    source: &MessageStream<Received<T>>,
    aggregate: &Arc<ClientStreams>,
    select: fn(&ClientStreams) -> &MessageStream<Received<T>>,
) -> StreamSubscription {
    let aggregate = Arc::clone(aggregate);
    source.subscribe(move |item| select(&aggregate).publish(item))
}
