use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use glam::DVec3;
use warpgate_common::{ActorId, Coordinate};
use warpgate_kernel::{
    ActorDirectory, DeferredExecutor, Notifier, PermissionCheck, Relocator, WorldQuery,
};

use crate::config::TeleportConfig;
use crate::error::TeleportError;
use crate::executor::TeleportExecutor;
use crate::pending::{PendingAction, TeleportRequest};
use crate::resolver::DestinationResolver;

/// Message sent when the watchdog cancels a wait.
pub const MOVED_MESSAGE: &str = "Teleport canceled because you moved.";

/// Result of [`PendingActionRegistry::request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Relocated immediately; the actor has been notified.
    Executed(Coordinate),
    /// Immediate relocation failed; the actor has been notified.
    Failed(TeleportError),
    /// Waiting out the delay. The caller tells the actor.
    Queued { delay_seconds: i32 },
    /// Nothing changed. The caller tells the actor.
    Rejected(TeleportError),
}

impl Outcome {
    /// Text the caller should deliver, if the registry has not already.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Queued { delay_seconds } => {
                Some(format!("Teleporting in {delay_seconds} seconds. Don't move!"))
            }
            Self::Rejected(err) => Some(err.to_string()),
            Self::Executed(_) | Self::Failed(_) => None,
        }
    }
}

/// What a call to [`PendingActionRegistry::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickStatus {
    /// No pending action for the actor.
    Idle,
    Waiting { remaining: f32 },
    /// Moved too far; the action was dropped.
    Cancelled,
    /// Ready; execution was submitted to the deferred executor.
    Dispatched,
}

enum Verdict {
    Moved,
    Waiting(f32),
    Ready,
}

/// Owns every in-flight delayed teleport, at most one per actor.
///
/// Safe to call from many workers at once: actors are ticked independently
/// and removals only take out the exact action that was inspected.
pub struct PendingActionRegistry {
    pending: DashMap<ActorId, PendingAction>,
    executor: Arc<TeleportExecutor>,
    permissions: Arc<dyn PermissionCheck>,
    notifier: Arc<dyn Notifier>,
    config: TeleportConfig,
    next_ticket: AtomicU64,
}

impl PendingActionRegistry {
    pub fn new(
        executor: Arc<TeleportExecutor>,
        permissions: Arc<dyn PermissionCheck>,
        notifier: Arc<dyn Notifier>,
        config: TeleportConfig,
    ) -> Self {
        Self {
            pending: DashMap::new(),
            executor,
            permissions,
            notifier,
            config,
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Wire the registry and its executor to one host implementing every
    /// interface.
    pub fn for_host<H>(host: Arc<H>, config: TeleportConfig) -> Self
    where
        H: WorldQuery + ActorDirectory + Relocator + Notifier + PermissionCheck + 'static,
    {
        let resolver = DestinationResolver::new(
            host.clone(),
            host.clone(),
            config.safe_search.clone(),
        );
        let executor = TeleportExecutor::new(resolver, host.clone(), host.clone(), host.clone());
        Self::new(Arc::new(executor), host.clone(), host, config)
    }

    pub fn config(&self) -> &TeleportConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<TeleportExecutor> {
        &self.executor
    }

    pub fn request(&self, request: TeleportRequest) -> Outcome {
        let actor = request.actor;
        if request.delay_seconds <= 0
            || self
                .permissions
                .has_permission(actor, &self.config.bypass_permission)
        {
            tracing::debug!(actor = %actor, "teleporting immediately");
            let TeleportRequest {
                target,
                success_message,
                on_success,
                ..
            } = request;
            return match self
                .executor
                .run(actor, &target, success_message.as_deref(), on_success)
            {
                Ok(destination) => Outcome::Executed(destination),
                Err(err) => Outcome::Failed(err),
            };
        }

        match self.pending.entry(actor) {
            Entry::Occupied(_) => {
                tracing::debug!(actor = %actor, "teleport already pending");
                Outcome::Rejected(TeleportError::AlreadyPending(actor))
            }
            Entry::Vacant(slot) => {
                let delay_seconds = request.delay_seconds;
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                slot.insert(PendingAction::new(request, ticket));
                tracing::debug!(actor = %actor, delay_seconds, ticket, "teleport queued");
                Outcome::Queued { delay_seconds }
            }
        }
    }

    /// Drop the actor's pending action. Sends `reason` if one was removed.
    pub fn cancel(&self, actor: ActorId, reason: Option<&str>) -> bool {
        let Some((_, action)) = self.pending.remove(&actor) else {
            return false;
        };
        tracing::debug!(actor = %actor, ticket = action.ticket, "teleport cancelled");
        if let Some(reason) = reason {
            self.notifier.notify(actor, reason);
        }
        true
    }

    /// The actor disconnected.
    pub fn disconnect(&self, actor: ActorId) -> bool {
        self.cancel(actor, None)
    }

    pub fn has_pending(&self, actor: ActorId) -> bool {
        self.pending.contains_key(&actor)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Actors with a pending action, for drivers that tick only those.
    pub fn pending_actors(&self) -> Vec<ActorId> {
        self.pending.iter().map(|entry| *entry.key()).collect()
    }

    /// Advance the actor's wait by `dt` seconds.
    ///
    /// Cancels if `current_position` is farther than the cancel distance from
    /// where the actor started. Once the delay has elapsed the action leaves
    /// the registry and its execution is handed to `deferred`; it never runs
    /// inside this call.
    pub fn tick(
        &self,
        actor: ActorId,
        current_position: DVec3,
        dt: f32,
        deferred: &dyn DeferredExecutor,
    ) -> TickStatus {
        let _span = tracing::trace_span!("teleport_tick", actor = %actor).entered();
        let limit = self.config.cancel_distance * self.config.cancel_distance;

        let (ticket, verdict) = {
            let Some(mut action) = self.pending.get_mut(&actor) else {
                return TickStatus::Idle;
            };
            let verdict = if action.start_position.distance_squared(current_position) > limit {
                Verdict::Moved
            } else {
                action.advance(dt);
                if action.is_ready() {
                    Verdict::Ready
                } else {
                    Verdict::Waiting(action.remaining())
                }
            };
            (action.ticket, verdict)
        };

        match verdict {
            Verdict::Waiting(remaining) => TickStatus::Waiting { remaining },
            Verdict::Moved => {
                if self.take(actor, ticket).is_none() {
                    return TickStatus::Idle;
                }
                tracing::debug!(actor = %actor, ticket, "teleport cancelled by movement");
                self.notifier.notify(actor, MOVED_MESSAGE);
                TickStatus::Cancelled
            }
            Verdict::Ready => {
                let Some(action) = self.take(actor, ticket) else {
                    return TickStatus::Idle;
                };
                tracing::debug!(actor = %actor, ticket, "teleport dispatched");
                let executor = Arc::clone(&self.executor);
                deferred.submit(Box::new(move || {
                    let _ = executor.complete(action);
                }));
                TickStatus::Dispatched
            }
        }
    }

    /// Drop every pending action without notifying anyone.
    pub fn shutdown(&self) {
        let dropped = self.pending.len();
        self.pending.clear();
        tracing::info!(dropped, "teleport registry shut down");
    }

    /// Remove the action only if it is still the one that was inspected.
    fn take(&self, actor: ActorId, ticket: u64) -> Option<PendingAction> {
        self.pending
            .remove_if(&actor, |_, action| action.ticket == ticket)
            .map(|(_, action)| action)
    }
}
