use warpgate_common::{ActorId, WorldId};
use warpgate_search::SearchError;

/// Why a followed actor could not be used as a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TargetFault {
    #[error("Target player is no longer online.")]
    Offline,
    #[error("Target player is not available.")]
    Stale,
}

/// Terminal failures of a teleport request. `Display` is the text shown to
/// the requesting actor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TeleportError {
    #[error("World '{0}' is not loaded.")]
    WorldNotLoaded(WorldId),
    #[error("Teleport failed - player reference invalid.")]
    ActorUnavailable(ActorId),
    #[error("You already have a pending teleport. Please wait.")]
    AlreadyPending(ActorId),
    #[error("Could not find a safe location after {attempts} attempts. Try again.")]
    NoSafeLocationFound { attempts: u32 },
    #[error("{fault}")]
    TargetInvalid { target: ActorId, fault: TargetFault },
    /// The host panicked while the relocation was applied.
    #[error("Teleport failed.")]
    Aborted,
}

impl From<SearchError> for TeleportError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::WorldNotLoaded(world) => Self::WorldNotLoaded(world),
            SearchError::NoSafeLocation { attempts } => Self::NoSafeLocationFound { attempts },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            TeleportError::WorldNotLoaded(WorldId::new("nether")).to_string(),
            "World 'nether' is not loaded."
        );
        assert_eq!(
            TeleportError::TargetInvalid {
                target: ActorId::new(),
                fault: TargetFault::Offline,
            }
            .to_string(),
            "Target player is no longer online."
        );
        assert_eq!(TeleportError::Aborted.to_string(), "Teleport failed.");
    }

    #[test]
    fn search_errors_convert() {
        let err: TeleportError = SearchError::NoSafeLocation { attempts: 5 }.into();
        assert_eq!(err, TeleportError::NoSafeLocationFound { attempts: 5 });
    }
}
