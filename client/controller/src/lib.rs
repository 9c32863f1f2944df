#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Claim Topics Synchronization Controller
//!
//! [`TopicsController`] owns the authoritative local snapshot of a claim
//! topics registry and the caller's authorization flag. A presentation layer
//! drives it with three intents (`refresh`, `add_topic`, `remove_topic`,
//! plus `set_registry`) and renders the [`ViewState`] snapshots it
//! publishes after every transition.
//!
//! ## Rules
//!
//! - One operation at a time. Any intent arriving while the phase is
//!   `Loading` is rejected with [`Rejected::Busy`] and leaves no trace,
//!   except a refresh arriving during a mutation, which is remembered and
//!   satisfied once the mutation settles.
//! - Mutations need the caller to be the registry owner, as established by
//!   the last read. Rejected intents make no remote call. The signer is
//!   resolved again right before submitting, and a signer that no longer
//!   matches the owner revokes authorization instead of writing.
//! - The topic set is only ever replaced wholesale by a successful read.
//!   A confirmed mutation is followed by exactly one full re-read; a failed
//!   one leaves the set untouched, and re-reads only if the remote state is
//!   in doubt (confirmation timeout, or the registry already holds a topic
//!   the snapshot lacks) or a refresh was deferred.
//! - Pre-checks against the local snapshot are advisory. Adding a topic also
//!   asks the registry whether it exists before submitting; the contract has
//!   the final word and a late rejection is reported as such.
//!
//! The state lock is never held across an `.await`, so the controller can be
//! shared (e.g. behind an `Arc`) and receive intents from several tasks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use adapters::{Confirmation, GatewayError, IdentityError, IdentityResolver, RegistryGateway};
use thiserror::Error;
use tokio::sync::broadcast;
use types::{Address, OperationPhase, Topic, TopicSet, ViewState};

/// Snapshots buffered per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 64;

/// Why an intent was refused without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    /// Another operation is in flight.
    #[error("Another operation is in progress")]
    Busy,
    /// The caller is not the registry owner.
    #[error("Only the registry owner can modify claim topics")]
    Unauthorized,
    /// No registry address has been configured.
    #[error("No registry address configured")]
    NoRegistry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
}

impl Mutation {
    fn name(self) -> &'static str {
        match self {
            Mutation::Add => "add",
            Mutation::Remove => "remove",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Mutation::Add => "added",
            Mutation::Remove => "removed",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Mutation::Add => "Adding",
            Mutation::Remove => "Removing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Refresh,
    Mutation,
}

/// How a read settles the phase and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reload {
    /// Requested refresh: ends `Idle`.
    Fresh,
    /// Follows a confirmed mutation: ends `Idle`, keeps the mutation message.
    AfterSuccess,
    /// Follows a failed mutation: ends `Failed`, keeps the failure message.
    Resync,
}

/// How a submitted mutation ended.
enum Settled {
    Confirmed(String),
    Failed { message: String, in_doubt: bool },
}

struct ReadOutcome {
    topics: Result<TopicSet, String>,
    owner: Option<Address>,
    authorized: bool,
}

/// `activity` is `Some` exactly while `view.phase` is `Loading`.
struct State {
    view: ViewState,
    /// Owner reported by the last owner read, if it succeeded.
    owner: Option<Address>,
    activity: Option<Activity>,
    deferred_refresh: bool,
}

/// The synchronization controller.
///
/// Generic over its two collaborators so tests can substitute scripted
/// gateways and fixed identities.
pub struct TopicsController<G, I> {
    gateway: G,
    identity: I,
    state: Mutex<State>,
    events: broadcast::Sender<ViewState>,
}

impl<G: RegistryGateway, I: IdentityResolver> TopicsController<G, I> {
    /// Creates a controller with no registry configured.
    pub fn new(gateway: G, identity: I) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            identity,
            state: Mutex::new(State {
                view: ViewState::default(),
                owner: None,
                activity: None,
                deferred_refresh: false,
            }),
            events,
        }
    }

    /// Creates a controller pointed at `registry`; nothing is read until the
    /// first [`refresh`](Self::refresh).
    pub fn with_registry(gateway: G, identity: I, registry: Address) -> Self {
        let controller = Self::new(gateway, identity);
        controller.lock().view.registry = Some(registry);
        controller
    }

    /// The current snapshot.
    pub fn view(&self) -> ViewState { self.lock().view.clone() }

    /// Receives a snapshot after every subsequent transition.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewState> { self.events.subscribe() }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) -> ViewState {
        let view = state.view.clone();
        tracing::debug!(
            phase = %view.phase,
            topics = view.topics.len(),
            authorized = view.authorized,
            message = ?view.message,
            "view state"
        );
        // No subscribers is fine.
        let _ = self.events.send(view.clone());
        view
    }

    /// Points the controller at another registry.
    ///
    /// Everything learned about the previous registry is dropped, and topics,
    /// owner and caller identity are re-read from scratch.
    pub async fn set_registry(&self, registry: Address) -> Result<ViewState, Rejected> {
        {
            let mut state = self.lock();
            if !state.view.phase.accepts_intents() {
                return Err(Rejected::Busy);
            }
            state.activity = Some(Activity::Refresh);
            state.owner = None;
            state.view = ViewState {
                registry: Some(registry),
                phase: OperationPhase::Loading,
                ..ViewState::default()
            };
            self.publish(&state);
        }
        tracing::info!(%registry, "registry changed");
        Ok(self.reload(registry, Reload::Fresh).await)
    }

    /// Re-reads the topic set, the owner and the caller identity.
    ///
    /// A refresh requested while a mutation is in flight is deferred until
    /// the mutation settles and reported as [`Rejected::Busy`].
    pub async fn refresh(&self) -> Result<ViewState, Rejected> {
        let registry = {
            let mut state = self.lock();
            let registry = state.view.registry.ok_or(Rejected::NoRegistry)?;
            match state.activity {
                Some(Activity::Mutation) => {
                    tracing::debug!("refresh deferred until the pending mutation settles");
                    state.deferred_refresh = true;
                    return Err(Rejected::Busy);
                }
                Some(Activity::Refresh) => return Err(Rejected::Busy),
                None => {}
            }
            state.activity = Some(Activity::Refresh);
            state.view.phase = OperationPhase::Loading;
            state.view.message = None;
            self.publish(&state);
            registry
        };
        tracing::info!(%registry, "refreshing claim topics");
        Ok(self.reload(registry, Reload::Fresh).await)
    }

    /// Adds `topic` to the registry.
    pub async fn add_topic(&self, topic: Topic) -> Result<ViewState, Rejected> {
        self.mutate(Mutation::Add, topic).await
    }

    /// Removes `topic` from the registry.
    ///
    /// Confirming the removal with the user is up to the caller.
    pub async fn remove_topic(&self, topic: Topic) -> Result<ViewState, Rejected> {
        self.mutate(Mutation::Remove, topic).await
    }

    async fn mutate(&self, kind: Mutation, topic: Topic) -> Result<ViewState, Rejected> {
        let registry = {
            let mut state = self.lock();
            let registry = state.view.registry.ok_or(Rejected::NoRegistry)?;
            if !state.view.phase.accepts_intents() {
                return Err(Rejected::Busy);
            }
            if !state.view.authorized {
                tracing::info!(intent = kind.name(), %topic, "rejected: caller is not the owner");
                return Err(Rejected::Unauthorized);
            }

            let present = state.view.topics.contains(topic);
            let veto = match kind {
                Mutation::Add if present => Some(format!("Topic {} already exists", topic)),
                Mutation::Remove if !present => Some(format!("Topic {} is not present", topic)),
                _ => None,
            };
            if let Some(message) = veto {
                tracing::info!(intent = kind.name(), %topic, "{}", message);
                state.view.phase = OperationPhase::Failed;
                state.view.message = Some(message);
                return Ok(self.publish(&state));
            }

            state.activity = Some(Activity::Mutation);
            state.view.phase = OperationPhase::Loading;
            state.view.message = None;
            self.publish(&state);
            registry
        };

        tracing::info!(intent = kind.name(), %topic, %registry, "submitting mutation");
        let settled = self.execute(kind, &registry, topic).await;
        Ok(self.settle(registry, settled).await)
    }

    async fn execute(&self, kind: Mutation, registry: &Address, topic: Topic) -> Settled {
        let failed = |message: String| Settled::Failed { message, in_doubt: false };

        let caller = self.identity.resolve_caller().await;
        let from = {
            let mut state = self.lock();
            match caller {
                Ok(from) if state.owner == Some(from) => from,
                Ok(from) => {
                    tracing::warn!(%from, owner = ?state.owner, "signer is no longer the owner");
                    state.view.authorized = false;
                    return failed(Rejected::Unauthorized.to_string());
                }
                Err(e) => {
                    state.view.authorized = false;
                    return failed(format!("Cannot {} topic {}: {}", kind.name(), topic, e));
                }
            }
        };

        let submitted = match kind {
            Mutation::Add => {
                match self.gateway.topic_exists(registry, topic).await {
                    // The snapshot missed this topic, so it is stale.
                    Ok(true) => {
                        return Settled::Failed {
                            message: format!("Topic {} already exists", topic),
                            in_doubt: true,
                        }
                    }
                    Ok(false) => {}
                    Err(e) => return failed(format!("Failed to check topic {}: {}", topic, e)),
                }
                self.gateway.submit_add(registry, &from, topic).await
            }
            Mutation::Remove => self.gateway.submit_remove(registry, &from, topic).await,
        };

        let pending = match submitted {
            Ok(pending) => pending,
            Err(e) if e.is_signer_refusal() => {
                return failed(format!("{} topic {} was declined by the signer", kind.gerund(), topic))
            }
            Err(e) => return failed(format!("Failed to {} topic {}: {}", kind.name(), topic, e)),
        };

        let tx = pending.tx_hash();
        tracing::info!(intent = kind.name(), %topic, %tx, "awaiting confirmation");
        match pending.await_confirmation().await {
            Ok(Confirmation::Confirmed(_)) => {
                Settled::Confirmed(format!("Topic {} {} successfully", topic, kind.past_tense()))
            }
            Ok(Confirmation::Reverted(_)) => failed(format!(
                "{} topic {} was rejected by the network",
                kind.gerund(),
                topic
            )),
            Err(e @ GatewayError::ConfirmationTimeout { .. }) => {
                Settled::Failed { message: e.to_string(), in_doubt: true }
            }
            Err(e) => Settled::Failed {
                message: format!("Failed to confirm {} of topic {}: {}", kind.name(), topic, e),
                in_doubt: true,
            },
        }
    }

    async fn settle(&self, registry: Address, settled: Settled) -> ViewState {
        let mode = {
            let mut state = self.lock();
            let mode = match settled {
                Settled::Confirmed(message) => {
                    tracing::info!("{}", message);
                    state.view.phase = OperationPhase::Succeeded;
                    state.view.message = Some(message);
                    self.publish(&state);
                    Reload::AfterSuccess
                }
                Settled::Failed { message, in_doubt } => {
                    tracing::warn!("{}", message);
                    state.view.phase = OperationPhase::Failed;
                    state.view.message = Some(message);
                    let deferred = std::mem::take(&mut state.deferred_refresh);
                    if !in_doubt && !deferred {
                        state.activity = None;
                        return self.publish(&state);
                    }
                    self.publish(&state);
                    Reload::Resync
                }
            };
            // Loading follows the outcome under the same lock.
            state.view.phase = OperationPhase::Loading;
            self.publish(&state);
            mode
        };
        self.reload(registry, mode).await
    }

    /// Runs the reads and publishes the settled snapshot. The caller has
    /// already published `Loading`.
    async fn reload(&self, registry: Address, mode: Reload) -> ViewState {
        let outcome = self.read_registry(&registry).await;

        let mut state = self.lock();
        state.activity = None;
        state.deferred_refresh = false;
        state.owner = outcome.owner;
        state.view.authorized = outcome.authorized;
        match outcome.topics {
            Ok(topics) => {
                state.view.topics = topics;
                state.view.phase = match mode {
                    Reload::Resync => OperationPhase::Failed,
                    Reload::Fresh | Reload::AfterSuccess => OperationPhase::Idle,
                };
            }
            Err(message) => {
                tracing::warn!(%registry, "{}", message);
                state.view.phase = OperationPhase::Failed;
                if mode != Reload::Resync {
                    state.view.message = Some(message);
                }
            }
        }
        self.publish(&state)
    }

    async fn read_registry(&self, registry: &Address) -> ReadOutcome {
        let caller = match self.identity.resolve_caller().await {
            Ok(caller) => Some(caller),
            Err(IdentityError::NoActiveSigner) => {
                tracing::debug!("no active signer, viewing read-only");
                None
            }
            Err(e) => {
                tracing::warn!("could not resolve caller: {}", e);
                None
            }
        };

        let owner = self.gateway.owner(registry).await;
        let authorized = matches!((&owner, caller), (Ok(owner), Some(caller)) if *owner == caller);

        let topics = match self.gateway.list_topics(registry).await {
            Ok(list) => TopicSet::from_remote(list).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
        .map_err(|e| format!("Failed to load claim topics: {}", e));

        let (topics, owner) = match (topics, owner) {
            (Ok(topics), Ok(owner)) => (Ok(topics), Some(owner)),
            (Err(message), owner) => (Err(message), owner.ok()),
            (Ok(_), Err(e)) => (Err(format!("Failed to read registry owner: {}", e)), None),
        };
        ReadOutcome { topics, owner, authorized }
    }
}
