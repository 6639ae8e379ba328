//! Single-threaded executor owning a [`PublisherRegistry`].
//!
//! Front ends talk to the registry through a cloneable [`PublisherClient`].
//! Commands and timer firings are handled on one thread, so an edit and a
//! publish of the same entry never interleave.

use std::thread::JoinHandle;
use std::time::Instant;

use flume::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::bus::BusClient;
use crate::error::PublisherError;
use crate::publisher::{PublisherDescriptor, PublisherId, PublisherRegistry, PublisherSummary};

type Reply<T> = Sender<Result<T, PublisherError>>;

enum Command {
    Add {
        topic: String,
        type_name: String,
        rate: f64,
        enabled: bool,
        reply: Reply<PublisherId>,
    },
    Change {
        id: PublisherId,
        path: String,
        field: String,
        value: String,
        reply: Reply<Option<String>>,
    },
    Remove {
        id: PublisherId,
        reply: Reply<()>,
    },
    PublishOnce {
        id: PublisherId,
        reply: Reply<()>,
    },
    Clear {
        reply: Reply<()>,
    },
    List {
        reply: Reply<Vec<PublisherSummary>>,
    },
    Export {
        reply: Reply<Vec<PublisherDescriptor>>,
    },
    Import {
        descriptors: Vec<PublisherDescriptor>,
        reply: Reply<Vec<PublisherId>>,
    },
    Shutdown {
        reply: Option<Reply<()>>,
    },
}

/// Handle to the executor thread.
///
/// Dropping it shuts the loop down and waits for it; every publisher is
/// removed on the way out.
pub struct PublisherExecutor {
    client: PublisherClient,
    handle: Option<JoinHandle<()>>,
}

impl PublisherExecutor {
    pub fn spawn<B>(registry: PublisherRegistry<B>) -> Self
    where
        B: BusClient + Send + 'static,
        B::Channel: Send,
    {
        let (tx, rx) = flume::unbounded();
        let handle = std::thread::spawn(move || run(registry, rx));
        Self {
            client: PublisherClient { tx },
            handle: Some(handle),
        }
    }

    pub fn client(&self) -> PublisherClient {
        self.client.clone()
    }

    /// Stop the loop and wait for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.client.tx.send(Command::Shutdown { reply: None });
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("Publisher executor thread panicked");
        }
    }
}

impl Drop for PublisherExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<B: BusClient>(mut registry: PublisherRegistry<B>, rx: Receiver<Command>) {
    info!("Publisher executor started");
    loop {
        let command = match registry.next_deadline() {
            Some(deadline) => match rx.recv_deadline(deadline) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };
        if let Some(command) = command
            && !handle(&mut registry, command)
        {
            break;
        }
        registry.fire_due(Instant::now());
    }
    registry.clear();
    info!("Publisher executor stopped");
}

/// Apply one command. Returns false on shutdown.
fn handle<B: BusClient>(registry: &mut PublisherRegistry<B>, command: Command) -> bool {
    // A caller that gave up waiting is not an error for the loop.
    match command {
        Command::Add {
            topic,
            type_name,
            rate,
            enabled,
            reply,
        } => {
            let _ = reply.send(registry.add(&topic, &type_name, rate, enabled));
        }
        Command::Change {
            id,
            path,
            field,
            value,
            reply,
        } => {
            let _ = reply.send(registry.change(id, &path, &field, &value));
        }
        Command::Remove { id, reply } => {
            let _ = reply.send(registry.remove(id));
        }
        Command::PublishOnce { id, reply } => {
            let _ = reply.send(registry.publish_once(id));
        }
        Command::Clear { reply } => {
            registry.clear();
            let _ = reply.send(Ok(()));
        }
        Command::List { reply } => {
            let _ = reply.send(Ok(registry.list()));
        }
        Command::Export { reply } => {
            let _ = reply.send(Ok(registry.export()));
        }
        Command::Import { descriptors, reply } => {
            let _ = reply.send(Ok(registry.import(&descriptors)));
        }
        Command::Shutdown { reply } => {
            debug!("Publisher executor received shutdown");
            registry.clear();
            if let Some(reply) = reply {
                let _ = reply.send(Ok(()));
            }
            return false;
        }
    }
    true
}

/// Cloneable, blocking front to a running [`PublisherExecutor`].
#[derive(Clone)]
pub struct PublisherClient {
    tx: Sender<Command>,
}

impl PublisherClient {
    fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, PublisherError> {
        let (reply, rx) = flume::bounded(1);
        self.tx
            .send(build(reply))
            .map_err(|_| PublisherError::Disconnected)?;
        rx.recv().map_err(|_| PublisherError::Disconnected)?
    }

    pub fn add(
        &self,
        topic: &str,
        type_name: &str,
        rate: f64,
        enabled: bool,
    ) -> Result<PublisherId, PublisherError> {
        self.request(|reply| Command::Add {
            topic: topic.to_string(),
            type_name: type_name.to_string(),
            rate,
            enabled,
            reply,
        })
    }

    pub fn change(
        &self,
        id: PublisherId,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<String>, PublisherError> {
        self.request(|reply| Command::Change {
            id,
            path: path.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            reply,
        })
    }

    pub fn remove(&self, id: PublisherId) -> Result<(), PublisherError> {
        self.request(|reply| Command::Remove { id, reply })
    }

    pub fn publish_once(&self, id: PublisherId) -> Result<(), PublisherError> {
        self.request(|reply| Command::PublishOnce { id, reply })
    }

    pub fn clear(&self) -> Result<(), PublisherError> {
        self.request(|reply| Command::Clear { reply })
    }

    pub fn list(&self) -> Result<Vec<PublisherSummary>, PublisherError> {
        self.request(|reply| Command::List { reply })
    }

    pub fn export(&self) -> Result<Vec<PublisherDescriptor>, PublisherError> {
        self.request(|reply| Command::Export { reply })
    }

    pub fn import(
        &self,
        descriptors: Vec<PublisherDescriptor>,
    ) -> Result<Vec<PublisherId>, PublisherError> {
        self.request(|reply| Command::Import { descriptors, reply })
    }

    /// Remove every publisher and stop the executor loop.
    ///
    /// Every client, this one included, is disconnected afterwards.
    pub fn shutdown(&self) -> Result<(), PublisherError> {
        self.request(|reply| Command::Shutdown { reply: Some(reply) })
    }
}
