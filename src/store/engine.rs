// Keyward — Store Engine
//
// Single-owner key-value engine. The map is owned by one worker task; every
// public operation is turned into a `Command` carrying a oneshot reply channel,
// queued on a bounded mpsc channel, and processed to completion before the next
// command is taken. This gives a total order over all operations without locks.
//
// Flow:
//   1. `KvStore::spawn()` starts the worker and returns a cloneable handle
//   2. each handle method sends a command and awaits its private reply
//   3. `close()` stops the worker; later calls fail with `EngineClosed`

use std::collections::HashMap;
use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};

use super::models::{Entry, EntryInfo};
use super::StoreError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Commands that may wait in the intake queue before senders are back-pressured.
const COMMAND_QUEUE_DEPTH: usize = 256;

// ─── Commands ────────────────────────────────────────────────────────────────

/// The closed set of operations the worker understands.
enum Command {
    Read {
        key: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Write {
        key: String,
        value: String,
        identity: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Delete {
        key: String,
        identity: String,
        reply: oneshot::Sender<Result<bool, StoreError>>,
    },
    List {
        key: String,
        reply: oneshot::Sender<Option<EntryInfo>>,
    },
    ListAll {
        reply: oneshot::Sender<Vec<EntryInfo>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Handle to the store engine. Cheap to clone; all clones talk to the same worker.
#[derive(Debug, Clone)]
pub struct KvStore {
    commands: mpsc::Sender<Command>,
}

impl KvStore {
    /// Start a new, empty store engine on the current tokio runtime.
    pub fn spawn() -> Self {
        Self::with_queue_depth(COMMAND_QUEUE_DEPTH)
    }

    /// Start an engine with a custom intake queue depth.
    pub fn with_queue_depth(depth: usize) -> Self {
        let (commands, receiver) = mpsc::channel(depth.max(1));
        let worker = Worker {
            data: HashMap::new(),
            commands: receiver,
        };
        tokio::spawn(worker.run());
        Self { commands }
    }

    /// Return the value stored under `key`, if any. Any identity may read.
    pub async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.request(|reply| Command::Read { key, reply }).await
    }

    /// Create or update `key`.
    ///
    /// A new key becomes permanently owned by `identity`. An existing key may only
    /// be updated by its owner; otherwise `OwnershipConflict` is returned and the
    /// stored value is left untouched.
    pub async fn write(&self, key: &str, value: &str, identity: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if identity.is_empty() {
            return Err(StoreError::MissingIdentity);
        }

        let key = key.to_string();
        let value = value.to_string();
        let identity = identity.to_string();
        self.request(|reply| Command::Write {
            key,
            value,
            identity,
            reply,
        })
        .await?
    }

    /// Remove `key` if `identity` owns it.
    ///
    /// Returns `Ok(false)` when the key does not exist, and `OwnershipConflict` when
    /// it exists but belongs to someone else.
    pub async fn delete(&self, key: &str, identity: &str) -> Result<bool, StoreError> {
        let key = key.to_string();
        let identity = identity.to_string();
        self.request(|reply| Command::Delete {
            key,
            identity,
            reply,
        })
        .await?
    }

    /// Ownership metadata for one key.
    pub async fn list(&self, key: &str) -> Result<Option<EntryInfo>, StoreError> {
        let key = key.to_string();
        self.request(|reply| Command::List { key, reply }).await
    }

    /// Ownership metadata for every key, in no particular order.
    pub async fn list_all(&self) -> Result<Vec<EntryInfo>, StoreError> {
        self.request(|reply| Command::ListAll { reply }).await
    }

    /// Stop the worker and drop the map. Resolves once the worker has acknowledged.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.request(|reply| Command::Close { reply }).await
    }

    /// Queue a command and wait for its reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, StoreError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| StoreError::EngineClosed)?;
        // A dropped reply sender means the worker stopped before reaching us.
        response.await.map_err(|_| StoreError::EngineClosed)
    }
}

// ─── Worker ──────────────────────────────────────────────────────────────────

/// Sole owner of the map. Never shared; only reachable through the command queue.
struct Worker {
    data: HashMap<String, Entry>,
    commands: mpsc::Receiver<Command>,
}

impl Worker {
    async fn run(mut self) {
        tracing::debug!("Store engine started");

        while let Some(command) = self.commands.recv().await {
            if self.apply(command).is_break() {
                break;
            }
        }

        tracing::info!(entries = self.data.len(), "Store engine stopped");
    }

    /// Apply one command and reply. A send error only means the caller went away.
    /// Breaks after `Close`.
    fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Read { key, reply } => {
                let _ = reply.send(self.data.get(&key).map(|e| e.value.clone()));
            }
            Command::Write {
                key,
                value,
                identity,
                reply,
            } => {
                let _ = reply.send(self.write(key, value, identity));
            }
            Command::Delete {
                key,
                identity,
                reply,
            } => {
                let _ = reply.send(self.delete(key, &identity));
            }
            Command::List { key, reply } => {
                let info = self
                    .data
                    .get(&key)
                    .map(|e| EntryInfo::new(key.clone(), e.owner.clone()));
                let _ = reply.send(info);
            }
            Command::ListAll { reply } => {
                let entries = self
                    .data
                    .iter()
                    .map(|(key, e)| EntryInfo::new(key.clone(), e.owner.clone()))
                    .collect();
                let _ = reply.send(entries);
            }
            Command::Close { reply } => {
                // Refuse new commands before acknowledging so callers fail fast.
                self.commands.close();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn write(&mut self, key: String, value: String, identity: String) -> Result<(), StoreError> {
        match self.data.get_mut(&key) {
            Some(entry) if entry.is_owned_by(&identity) => {
                entry.value = value;
                tracing::debug!(key = %key, owner = %identity, "Entry updated");
                Ok(())
            }
            Some(entry) => {
                tracing::warn!(
                    key = %key,
                    owner = %entry.owner,
                    identity = %identity,
                    "Rejected update by non-owner"
                );
                Err(StoreError::OwnershipConflict { key })
            }
            None => {
                tracing::debug!(key = %key, owner = %identity, "Entry created");
                self.data.insert(key, Entry::new(value, identity));
                Ok(())
            }
        }
    }

    fn delete(&mut self, key: String, identity: &str) -> Result<bool, StoreError> {
        match self.data.get(&key) {
            Some(entry) if entry.is_owned_by(identity) => {
                self.data.remove(&key);
                tracing::debug!(key = %key, owner = %identity, "Entry deleted");
                Ok(true)
            }
            Some(entry) => {
                tracing::warn!(
                    key = %key,
                    owner = %entry.owner,
                    identity = %identity,
                    "Rejected delete by non-owner"
                );
                Err(StoreError::OwnershipConflict { key })
            }
            None => Ok(false),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
