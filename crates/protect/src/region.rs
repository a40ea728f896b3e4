use dashmap::DashMap;
use glam::DVec3;
use warpgate_common::ActorId;

use crate::area::ProtectedArea;
use crate::config::ProtectionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    Exited,
}

/// Title shown on a transition. `major` titles use the host's large style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub title: String,
    pub subtitle: String,
    pub major: bool,
}

/// Tracks which actors are inside the protected area and reports crossings.
///
/// The first observation of an actor only records where it is.
pub struct RegionTracker {
    area: ProtectedArea,
    config: ProtectionConfig,
    inside: DashMap<ActorId, bool>,
}

impl RegionTracker {
    pub fn new(area: ProtectedArea, config: ProtectionConfig) -> Self {
        Self {
            area,
            config,
            inside: DashMap::new(),
        }
    }

    fn active(&self) -> bool {
        self.config.enabled && self.config.show_titles
    }

    /// Record the actor at `position`, returning the crossing if any.
    pub fn observe(&self, actor: ActorId, position: DVec3) -> Option<Transition> {
        if !self.active() {
            return None;
        }
        let now_inside = self.area.contains(position);
        let was_inside = self.inside.insert(actor, now_inside)?;
        match (was_inside, now_inside) {
            (false, true) => Some(Transition::Entered),
            (true, false) => Some(Transition::Exited),
            _ => None,
        }
    }

    /// Title for `transition`, or `None` if both lines are configured empty.
    pub fn title(&self, transition: Transition) -> Option<Title> {
        let (title, subtitle, major) = match transition {
            Transition::Entered => (&self.config.enter_title, &self.config.enter_subtitle, true),
            Transition::Exited => (&self.config.exit_title, &self.config.exit_subtitle, false),
        };
        if title.is_empty() && subtitle.is_empty() {
            return None;
        }
        Some(Title {
            title: title.clone(),
            subtitle: subtitle.clone(),
            major,
        })
    }

    /// Drop the actor's state; call on disconnect.
    pub fn forget(&self, actor: ActorId) {
        self.inside.remove(&actor);
    }

    pub fn tracked(&self) -> usize {
        self.inside.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(config: ProtectionConfig) -> RegionTracker {
        let area = ProtectedArea::new(Some(DVec3::ZERO), &config);
        RegionTracker::new(area, config)
    }

    const INSIDE: DVec3 = DVec3::new(1.0, 64.0, 1.0);
    const OUTSIDE: DVec3 = DVec3::new(50.0, 64.0, 1.0);

    #[test]
    fn first_sighting_only_records() {
        let tracker = tracker(ProtectionConfig::default());
        let actor = ActorId::new();
        assert_eq!(tracker.observe(actor, INSIDE), None);
        assert_eq!(tracker.observe(actor, INSIDE), None);
        assert_eq!(tracker.observe(actor, OUTSIDE), Some(Transition::Exited));
        assert_eq!(tracker.observe(actor, OUTSIDE), None);
        assert_eq!(tracker.observe(actor, INSIDE), Some(Transition::Entered));
    }

    #[test]
    fn forget_resets_state() {
        let tracker = tracker(ProtectionConfig::default());
        let actor = ActorId::new();
        tracker.observe(actor, OUTSIDE);
        tracker.forget(actor);
        assert_eq!(tracker.tracked(), 0);
        assert_eq!(tracker.observe(actor, INSIDE), None);
    }

    #[test]
    fn titles_follow_config() {
        let tracker = tracker(ProtectionConfig {
            exit_title: String::new(),
            exit_subtitle: String::new(),
            ..ProtectionConfig::default()
        });
        let entered = tracker.title(Transition::Entered).unwrap();
        assert_eq!(entered.title, "Entering Spawn");
        assert!(entered.major);
        assert_eq!(tracker.title(Transition::Exited), None);
    }

    #[test]
    fn hidden_titles_disable_tracking() {
        let tracker = tracker(ProtectionConfig {
            show_titles: false,
            ..ProtectionConfig::default()
        });
        let actor = ActorId::new();
        tracker.observe(actor, OUTSIDE);
        assert_eq!(tracker.observe(actor, INSIDE), None);
        assert_eq!(tracker.tracked(), 0);
    }
}
