use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::contacts::{Contact, NewContact};
use crate::deals::{Deal, DealEdit, DealStage, NewDeal};
use crate::entities::{Entity, EntityKind};
use crate::errors::{Error, Result, ValidationError};
use crate::storage::StorageFacade;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// An intent applied to the in-memory collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Insert(T),
    Update(T),
    Remove(String),
}

/// Outcome of a queued persistence, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationEvent {
    #[serde(rename_all = "camelCase")]
    Persisted {
        kind: EntityKind,
        entity_id: String,
        revision: u64,
    },
    /// The change was rolled back in memory. `message` is meant for the user.
    #[serde(rename_all = "camelCase")]
    Failed {
        kind: EntityKind,
        entity_id: String,
        revision: u64,
        message: String,
    },
}

/// Handle on one applied mutation. Dropping it does not cancel persistence.
#[derive(Debug)]
pub struct MutationTicket {
    revision: u64,
    entity_id: String,
    outcome: oneshot::Receiver<std::result::Result<(), String>>,
}

impl MutationTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Waits until the change is durable or has been rolled back.
    pub async fn persisted(self) -> Result<()> {
        match self.outcome.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(Error::Persistence(message)),
            Err(_) => Err(Error::Persistence(
                "persistence queue stopped before the change was saved".to_string(),
            )),
        }
    }
}

enum WriteOp<T> {
    Upsert(T),
    Delete,
}

struct PendingWrite<T> {
    revision: u64,
    entity_id: String,
    op: WriteOp<T>,
    reply: oneshot::Sender<std::result::Result<(), String>>,
}

/// Bookkeeping for an id with writes still in the queue.
struct Unsettled<T> {
    /// Latest revision applied to the id.
    latest: u64,
    /// Last value known to be durable, with its position; `None` when the
    /// entity does not exist in storage.
    durable: Option<(usize, T)>,
}

struct CollectionState<T> {
    items: Vec<T>,
    revision: u64,
    unsettled: HashMap<String, Unsettled<T>>,
    last_error: Option<String>,
}

impl<T: Entity> CollectionState<T> {
    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Records a new revision for `id`. `before` is only kept when no earlier
    /// write for the id is pending, since it is then the durable value.
    fn track(&mut self, id: &str, revision: u64, before: Option<(usize, T)>) {
        self.unsettled
            .entry(id.to_string())
            .and_modify(|pending| pending.latest = revision)
            .or_insert(Unsettled {
                latest: revision,
                durable: before,
            });
    }

    /// Restores the entity's last durable state unless a later mutation owns it.
    ///
    /// A superseded failure is left to the later write: if that one succeeds
    /// it overwrites storage with what memory shows, and if it fails it
    /// restores the durable value recorded here.
    fn roll_back(&mut self, write: &PendingWrite<T>) {
        match self.unsettled.get(&write.entity_id) {
            Some(pending) if pending.latest == write.revision => {}
            _ => {
                debug!(
                    "Skipping rollback of {} {}: superseded by a later change",
                    T::KIND,
                    write.entity_id
                );
                return;
            }
        }
        let Some(pending) = self.unsettled.remove(&write.entity_id) else {
            return;
        };

        let current = self.position(&write.entity_id);
        match (pending.durable, current) {
            (Some((_, before)), Some(index)) => self.items[index] = before,
            (Some((index, before)), None) => {
                let index = index.min(self.items.len());
                self.items.insert(index, before);
            }
            (None, Some(index)) => {
                self.items.remove(index);
            }
            (None, None) => {}
        }
    }

    /// Marks the written value as durable.
    fn settle(&mut self, write: &PendingWrite<T>) {
        let current = self.position(&write.entity_id);
        let Some(pending) = self.unsettled.get_mut(&write.entity_id) else {
            return;
        };
        if pending.latest == write.revision {
            self.unsettled.remove(&write.entity_id);
            return;
        }
        pending.durable = match &write.op {
            WriteOp::Upsert(item) => {
                let index = current
                    .or_else(|| pending.durable.as_ref().map(|(index, _)| *index))
                    .unwrap_or(self.items.len());
                Some((index, item.clone()))
            }
            WriteOp::Delete => None,
        };
    }
}

/// In-memory collection of one entity kind whose changes show up at once and
/// are persisted in the background, in the order they were applied.
pub struct OptimisticCollection<T: Entity> {
    state: Arc<Mutex<CollectionState<T>>>,
    queue: mpsc::UnboundedSender<PendingWrite<T>>,
    events: broadcast::Sender<MutationEvent>,
}

impl<T: Entity> OptimisticCollection<T> {
    /// Loads the current collection through the facade and starts the
    /// persistence worker.
    pub async fn load(facade: Arc<StorageFacade>) -> Self {
        let initial = facade.load::<T>().await;
        Self::new(facade, initial)
    }

    /// Wraps an already loaded collection and starts the persistence worker.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the worker is
    /// started with `tokio::spawn`.
    pub fn new(facade: Arc<StorageFacade>, initial: Vec<T>) -> Self {
        let state = Arc::new(Mutex::new(CollectionState {
            items: initial,
            revision: 0,
            unsettled: HashMap::new(),
            last_error: None,
        }));
        let (queue, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(run_persistence_queue(
            facade,
            Arc::clone(&state),
            events.clone(),
            receiver,
        ));

        Self {
            state,
            queue,
            events,
        }
    }

    /// Applies `mutation` in memory and queues its persistence.
    ///
    /// Inserting an existing id, addressing an unknown one or passing an
    /// entity that fails validation is rejected here and nothing is queued.
    pub fn apply(&self, mutation: Mutation<T>) -> Result<MutationTicket> {
        let mut state = self.lock();

        let (entity_id, op, previous) = match mutation {
            Mutation::Insert(item) => {
                item.validate()?;
                if state.position(item.id()).is_some() {
                    return Err(ValidationError::DuplicateId(item.id().to_string()).into());
                }
                state.items.push(item.clone());
                (item.id().to_string(), WriteOp::Upsert(item), None)
            }
            Mutation::Update(item) => {
                let index = state
                    .position(item.id())
                    .ok_or_else(|| Error::not_found(T::KIND, item.id()))?;
                item.validate()?;
                let before = std::mem::replace(&mut state.items[index], item.clone());
                (
                    item.id().to_string(),
                    WriteOp::Upsert(item),
                    Some((index, before)),
                )
            }
            Mutation::Remove(id) => {
                let index = state
                    .position(&id)
                    .ok_or_else(|| Error::not_found(T::KIND, id.as_str()))?;
                let before = state.items.remove(index);
                (id, WriteOp::Delete, Some((index, before)))
            }
        };

        state.revision += 1;
        let revision = state.revision;
        state.track(&entity_id, revision, previous);

        let (reply, outcome) = oneshot::channel();
        let write = PendingWrite {
            revision,
            entity_id: entity_id.clone(),
            op,
            reply,
        };
        // Sent under the lock so queue order matches revision order.
        if let Err(mpsc::error::SendError(write)) = self.queue.send(write) {
            state.roll_back(&write);
            return Err(Error::Persistence(format!(
                "{} persistence queue is closed",
                T::KIND
            )));
        }

        Ok(MutationTicket {
            revision,
            entity_id,
            outcome,
        })
    }

    /// Replaces the entity with `id` by `change(current)`.
    pub fn update_with(&self, id: &str, change: impl FnOnce(&T) -> T) -> Result<MutationTicket> {
        let updated = {
            let state = self.lock();
            let current = state
                .items
                .iter()
                .find(|item| item.id() == id)
                .ok_or_else(|| Error::not_found(T::KIND, id))?;
            change(current)
        };
        self.apply(Mutation::Update(updated))
    }

    pub fn remove(&self, id: &str) -> Result<MutationTicket> {
        self.apply(Mutation::Remove(id.to_string()))
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    /// Message of the most recent failed persistence, if any.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().last_error = None;
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState<T>> {
        lock_state(&self.state)
    }
}

impl OptimisticCollection<Contact> {
    pub fn add(&self, input: NewContact) -> Result<MutationTicket> {
        self.apply(Mutation::Insert(Contact::create(input)?))
    }
}

impl OptimisticCollection<Deal> {
    pub fn add(&self, input: NewDeal) -> Result<MutationTicket> {
        self.apply(Mutation::Insert(Deal::create(input)?))
    }

    /// Moves a deal to `stage`. Any stage may follow any other.
    pub fn move_to_stage(&self, id: &str, stage: DealStage) -> Result<MutationTicket> {
        self.update_with(id, |deal| deal.with_stage(stage))
    }

    /// Applies a partial edit. The edited deal must still satisfy the deal
    /// invariants.
    pub fn edit(&self, id: &str, edit: &DealEdit) -> Result<MutationTicket> {
        self.update_with(id, |deal| deal.edited(edit))
    }
}

fn lock_state<T>(state: &Mutex<CollectionState<T>>) -> MutexGuard<'_, CollectionState<T>> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_persistence_queue<T: Entity>(
    facade: Arc<StorageFacade>,
    state: Arc<Mutex<CollectionState<T>>>,
    events: broadcast::Sender<MutationEvent>,
    mut receiver: mpsc::UnboundedReceiver<PendingWrite<T>>,
) {
    while let Some(write) = receiver.recv().await {
        let result = match &write.op {
            WriteOp::Upsert(item) => facade.upsert(item).await,
            WriteOp::Delete => facade.delete::<T>(&write.entity_id).await,
        };

        let (event, outcome) = match result {
            Ok(()) => {
                lock_state(&state).settle(&write);
                debug!(
                    "Persisted {} {} (revision {})",
                    T::KIND,
                    write.entity_id,
                    write.revision
                );
                (
                    MutationEvent::Persisted {
                        kind: T::KIND,
                        entity_id: write.entity_id.clone(),
                        revision: write.revision,
                    },
                    Ok(()),
                )
            }
            Err(err) => {
                let message = format!(
                    "Could not save changes to {} {}: {}",
                    T::KIND,
                    write.entity_id,
                    err
                );
                warn!("{}", message);
                {
                    let mut state = lock_state(&state);
                    state.roll_back(&write);
                    state.last_error = Some(message.clone());
                }
                (
                    MutationEvent::Failed {
                        kind: T::KIND,
                        entity_id: write.entity_id.clone(),
                        revision: write.revision,
                        message: message.clone(),
                    },
                    Err(message),
                )
            }
        };

        // No subscribers is fine.
        let _ = events.send(event);
        let _ = write.reply.send(outcome);
    }
    debug!("{} persistence queue closed", T::KIND);
}
