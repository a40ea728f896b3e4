use std::fmt;

use glam::DVec3;
use warpgate_common::{ActorId, Coordinate};

use crate::config::TeleportConfig;

/// Run once after a successful relocation.
pub type SuccessHook = Box<dyn FnOnce() + Send + Sync + 'static>;

/// Where a teleport goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A fixed coordinate. With `find_safe_y` the stored Y is raised to the
    /// first opening above it before use.
    Coordinate {
        coordinate: Coordinate,
        find_safe_y: bool,
    },
    /// Wherever this actor is when the teleport executes.
    FollowActor(ActorId),
}

impl Target {
    /// Player-set destination (home, warp, spawn).
    pub fn coordinate(coordinate: Coordinate) -> Self {
        Self::Coordinate {
            coordinate,
            find_safe_y: true,
        }
    }

    pub fn exact(coordinate: Coordinate) -> Self {
        Self::Coordinate {
            coordinate,
            find_safe_y: false,
        }
    }

    pub fn follow(actor: ActorId) -> Self {
        Self::FollowActor(actor)
    }
}

/// Input to [`crate::PendingActionRegistry::request`].
pub struct TeleportRequest {
    pub actor: ActorId,
    /// Where the actor stood when asking.
    pub start_position: DVec3,
    pub target: Target,
    pub delay_seconds: i32,
    pub success_message: Option<String>,
    pub on_success: Option<SuccessHook>,
}

impl TeleportRequest {
    pub fn new(actor: ActorId, start_position: DVec3, target: Target, delay_seconds: i32) -> Self {
        Self {
            actor,
            start_position,
            target,
            delay_seconds,
            success_message: None,
            on_success: None,
        }
    }

    /// Request using the configured delay.
    pub fn with_config(
        actor: ActorId,
        start_position: DVec3,
        target: Target,
        config: &TeleportConfig,
    ) -> Self {
        Self::new(actor, start_position, target, config.delay_seconds)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn on_success(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for TeleportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeleportRequest")
            .field("actor", &self.actor)
            .field("start_position", &self.start_position)
            .field("target", &self.target)
            .field("delay_seconds", &self.delay_seconds)
            .field("success_message", &self.success_message)
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}

/// A queued teleport waiting out its delay.
pub struct PendingAction {
    pub(crate) actor: ActorId,
    pub(crate) start_position: DVec3,
    pub(crate) target: Target,
    pub(crate) delay_seconds: f32,
    pub(crate) elapsed_seconds: f32,
    pub(crate) success_message: Option<String>,
    pub(crate) on_success: Option<SuccessHook>,
    /// Unique per registry; distinguishes successive actions of one actor.
    pub(crate) ticket: u64,
}

impl PendingAction {
    pub(crate) fn new(request: TeleportRequest, ticket: u64) -> Self {
        Self {
            actor: request.actor,
            start_position: request.start_position,
            target: request.target,
            delay_seconds: request.delay_seconds as f32,
            elapsed_seconds: 0.0,
            success_message: request.success_message,
            on_success: request.on_success,
            ticket,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn start_position(&self) -> DVec3 {
        self.start_position
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn delay_seconds(&self) -> f32 {
        self.delay_seconds
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Accumulate waiting time. Negative or NaN deltas are ignored so
    /// elapsed time never decreases.
    pub(crate) fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.elapsed_seconds += dt;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.elapsed_seconds >= self.delay_seconds
    }

    pub fn remaining(&self) -> f32 {
        (self.delay_seconds - self.elapsed_seconds).max(0.0)
    }
}

impl fmt::Debug for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAction")
            .field("actor", &self.actor)
            .field("start_position", &self.start_position)
            .field("target", &self.target)
            .field("delay_seconds", &self.delay_seconds)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}
