use std::sync::Arc;

use glam::{DVec3, IVec3};
use warpgate_common::ActorId;
use warpgate_kernel::{Notifier, PermissionCheck};

use crate::area::ProtectedArea;
use crate::config::ProtectionConfig;

pub const PROTECTED_MESSAGE: &str = "This area is protected.";
pub const PVP_MESSAGE: &str = "PvP is disabled in spawn.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    Break,
    Place,
    /// Mining progress; cancelled silently.
    Damage,
}

/// Who dealt damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Player(ActorId),
    /// Another entity such as a creature.
    Entity,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The host must cancel the event. `notified` is who was told why.
    Cancel { notified: Option<ActorId> },
}

impl Decision {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }
}

/// Decides block and damage events against the protected area.
pub struct ProtectionGuard {
    area: ProtectedArea,
    config: ProtectionConfig,
    permissions: Arc<dyn PermissionCheck>,
    notifier: Arc<dyn Notifier>,
}

impl ProtectionGuard {
    pub fn new(
        area: ProtectedArea,
        config: ProtectionConfig,
        permissions: Arc<dyn PermissionCheck>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            area,
            config,
            permissions,
            notifier,
        }
    }

    pub fn area(&self) -> &ProtectedArea {
        &self.area
    }

    /// Block break, place or damage at `block` by `actor` (if the actor is
    /// known). Bypass holders are always allowed.
    pub fn check_block(&self, actor: Option<ActorId>, action: BlockAction, block: IVec3) -> Decision {
        if !self.config.enabled || !self.area.contains_block(block) {
            return Decision::Allow;
        }
        if actor.is_some_and(|a| {
            self.permissions
                .has_permission(a, &self.config.bypass_permission)
        }) {
            return Decision::Allow;
        }
        tracing::debug!(?actor, ?action, ?block, "block change in protected area cancelled");
        let notified = match action {
            BlockAction::Break | BlockAction::Place => actor,
            BlockAction::Damage => None,
        };
        if let Some(actor) = notified {
            self.notifier.notify(actor, PROTECTED_MESSAGE);
        }
        Decision::Cancel { notified }
    }

    /// Damage to a player standing at `victim_position`. Only damage dealt by
    /// another player inside the area is cancelled; the attacker is told.
    pub fn check_player_damage(&self, victim_position: DVec3, source: DamageSource) -> Decision {
        if !self.config.enabled || !self.config.invulnerable {
            return Decision::Allow;
        }
        let DamageSource::Player(attacker) = source else {
            return Decision::Allow;
        };
        if !self.area.contains(victim_position) {
            return Decision::Allow;
        }
        tracing::debug!(attacker = %attacker, "pvp in protected area cancelled");
        self.notifier.notify(attacker, PVP_MESSAGE);
        Decision::Cancel {
            notified: Some(attacker),
        }
    }
}
