use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures::future::BoxFuture;
use glam::DVec3;
use rand::Rng;
use warpgate_common::{ActorId, Coordinate, Orientation, WorldId};
use warpgate_kernel::{ActorDirectory, Notifier, PermissionCheck, WorldQuery};
use warpgate_search::{SafeLocation, SafeLocationSearch, SearchError};

use crate::config::RtpConfig;
use crate::error::TeleportError;
use crate::pending::{Target, TeleportRequest};
use crate::registry::{Outcome, PendingActionRegistry};

pub const RTP_SUCCESS_MESSAGE: &str = "Randomly teleported!";

/// Seconds left on a cooldown, shown as `1h 2m 3s` with zero units left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRemaining(pub u64);

impl fmt::Display for CooldownRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, self.0 % 3600 / 60, self.0 % 60);
        let mut parts = Vec::new();
        if h > 0 {
            parts.push(format!("{h}h"));
        }
        if m > 0 {
            parts.push(format!("{m}m"));
        }
        if s > 0 || parts.is_empty() {
            parts.push(format!("{s}s"));
        }
        f.write_str(&parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RtpError {
    #[error("RTP is on cooldown. {remaining} remaining.")]
    OnCooldown { remaining: CooldownRemaining },
    #[error("RTP is not enabled in this world.")]
    NotEnabled,
    #[error("RTP world '{0}' is not loaded.")]
    WorldNotLoaded(WorldId),
    #[error(transparent)]
    Teleport(#[from] TeleportError),
}

impl From<SearchError> for RtpError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::WorldNotLoaded(world) => Self::WorldNotLoaded(world),
            other => Self::Teleport(other.into()),
        }
    }
}

/// Where a random teleport will search.
#[derive(Debug, Clone, PartialEq)]
pub struct RtpRoute {
    pub world: WorldId,
    pub radius: i32,
    /// The search world differs from the one the actor stands in.
    pub cross_world: bool,
    /// Captured when the route was chosen; the wait is measured from here.
    pub start_position: DVec3,
}

/// A random teleport in progress.
pub enum RtpTask {
    /// Resolved without waiting.
    Ready(Result<Outcome, RtpError>),
    /// Searching another world; poll to completion on any executor.
    Searching(BoxFuture<'static, Result<Outcome, RtpError>>),
}

/// Random teleport: picks a world, enforces the cooldown, searches for a
/// landing spot and queues the teleport through the registry.
///
/// Same-world searches use resident columns only and finish inside
/// [`RandomTeleport::start`]. Cross-world searches fetch columns and are
/// returned as a future so the caller's thread never waits on terrain.
pub struct RandomTeleport {
    search: SafeLocationSearch,
    query: Arc<dyn WorldQuery>,
    directory: Arc<dyn ActorDirectory>,
    permissions: Arc<dyn PermissionCheck>,
    config: RtpConfig,
    queue: Queue,
}

impl RandomTeleport {
    pub fn new(
        registry: Arc<PendingActionRegistry>,
        query: Arc<dyn WorldQuery>,
        directory: Arc<dyn ActorDirectory>,
        permissions: Arc<dyn PermissionCheck>,
        notifier: Arc<dyn Notifier>,
        config: RtpConfig,
    ) -> Self {
        let search = SafeLocationSearch::new(Arc::clone(&query), config.search.clone());
        Self {
            search,
            query,
            directory,
            permissions,
            config,
            queue: Queue {
                registry,
                notifier,
                last_use: Arc::new(DashMap::new()),
            },
        }
    }

    pub fn config(&self) -> &RtpConfig {
        &self.config
    }

    /// Record a completed random teleport at `at`.
    pub fn record_use(&self, actor: ActorId, at: Instant) {
        self.queue.last_use.insert(actor, at);
    }

    /// Cooldown left for `actor` as of `now`, or `None` if it may teleport.
    pub fn cooldown_remaining(&self, actor: ActorId, now: Instant) -> Option<CooldownRemaining> {
        if self.config.cooldown_seconds == 0
            || self
                .permissions
                .has_permission(actor, &self.config.cooldown_bypass_permission)
        {
            return None;
        }
        let last = *self.queue.last_use.get(&actor)?;
        let elapsed = now.saturating_duration_since(last).as_secs();
        let remaining = self.config.cooldown_seconds.saturating_sub(elapsed);
        (remaining > 0).then_some(CooldownRemaining(remaining))
    }

    /// Check the cooldown and choose the world to search.
    pub fn route(&self, actor: ActorId, now: Instant) -> Result<RtpRoute, RtpError> {
        if let Some(remaining) = self.cooldown_remaining(actor, now) {
            return Err(RtpError::OnCooldown { remaining });
        }
        let snapshot = match self.directory.resolve(actor) {
            Some(snapshot) if snapshot.valid => snapshot,
            _ => return Err(TeleportError::ActorUnavailable(actor).into()),
        };
        let current = snapshot.world();
        let (world, radius) = match self.config.radius(current.as_str()) {
            Some(radius) => (current.clone(), radius),
            None => {
                let fallback = &self.config.default_world;
                let radius = self.config.radius(fallback).ok_or(RtpError::NotEnabled)?;
                (WorldId::new(fallback.as_str()), radius)
            }
        };
        if !self.query.is_world_loaded(&world) {
            return Err(RtpError::WorldNotLoaded(world));
        }
        Ok(RtpRoute {
            cross_world: &world != current,
            world,
            radius,
            start_position: snapshot.position(),
        })
    }

    /// Begin a random teleport for `actor`. Failures and queue notices are
    /// delivered to the actor; the result is also returned.
    pub fn start<R>(&self, actor: ActorId, mut rng: R) -> RtpTask
    where
        R: Rng + Send + 'static,
    {
        let route = match self.route(actor, Instant::now()) {
            Ok(route) => route,
            Err(err) => return RtpTask::Ready(report(self.queue.notifier.as_ref(), actor, Err(err))),
        };
        tracing::debug!(
            actor = %actor,
            world = %route.world,
            radius = route.radius,
            cross_world = route.cross_world,
            "random teleport routed"
        );

        if !route.cross_world {
            let found = self
                .search
                .find_blocking(&route.world, route.radius, &mut rng);
            let result = found
                .map_err(RtpError::from)
                .map(|location| self.queue.submit(actor, &route, location));
            return RtpTask::Ready(report(self.queue.notifier.as_ref(), actor, result));
        }

        let search = self.search.find(route.world.clone(), route.radius, rng);
        let queue = self.queue.clone();
        RtpTask::Searching(Box::pin(async move {
            let result = search
                .await
                .map_err(RtpError::from)
                .map(|location| queue.submit(actor, &route, location));
            report(queue.notifier.as_ref(), actor, result)
        }))
    }
}

/// Handles needed once a landing spot is known.
#[derive(Clone)]
struct Queue {
    registry: Arc<PendingActionRegistry>,
    notifier: Arc<dyn Notifier>,
    last_use: Arc<DashMap<ActorId, Instant>>,
}

impl Queue {
    fn submit(&self, actor: ActorId, route: &RtpRoute, location: SafeLocation) -> Outcome {
        let destination = Coordinate::new(
            route.world.clone(),
            location.position(),
            Orientation::default(),
        );
        let last_use = Arc::clone(&self.last_use);
        let request = TeleportRequest::with_config(
            actor,
            route.start_position,
            Target::coordinate(destination),
            self.registry.config(),
        )
        .with_message(RTP_SUCCESS_MESSAGE)
        .on_success(move || {
            last_use.insert(actor, Instant::now());
        });
        self.registry.request(request)
    }
}

fn report(
    notifier: &dyn Notifier,
    actor: ActorId,
    result: Result<Outcome, RtpError>,
) -> Result<Outcome, RtpError> {
    match &result {
        Ok(outcome) => {
            if let Some(notice) = outcome.notice() {
                notifier.notify(actor, &notice);
            }
        }
        Err(err) => {
            tracing::debug!(actor = %actor, error = %err, "random teleport refused");
            notifier.notify(actor, &err.to_string());
        }
    }
    result
}
