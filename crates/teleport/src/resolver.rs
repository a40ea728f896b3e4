use std::sync::Arc;

use warpgate_common::{Coordinate, Orientation};
use warpgate_kernel::{ActorDirectory, WorldQuery};
use warpgate_search::{VerticalSearchConfig, find_safe_y};

use crate::error::{TargetFault, TeleportError};
use crate::pending::Target;

/// Snap yaw to the nearest of 0, 90, 180 and -90 degrees and level pitch.
///
/// Yaw is first wrapped into (-180, 180]. Intervals are half-open on the
/// upper bound: 45 goes to 90, -45 to 0, 135 to 180, -135 to -90.
/// Non-finite yaw snaps to 0.
pub fn snap_cardinal(orientation: Orientation) -> Orientation {
    let yaw = if orientation.yaw.is_finite() {
        let wrapped = orientation.yaw.rem_euclid(360.0);
        let wrapped = if wrapped > 180.0 { wrapped - 360.0 } else { wrapped };
        if (-45.0..45.0).contains(&wrapped) {
            0.0
        } else if (45.0..135.0).contains(&wrapped) {
            90.0
        } else if (-135.0..-45.0).contains(&wrapped) {
            -90.0
        } else {
            180.0
        }
    } else {
        0.0
    };
    Orientation::new(yaw, 0.0)
}

/// Turns a [`Target`] into the coordinate to apply, at execution time.
#[derive(Clone)]
pub struct DestinationResolver {
    query: Arc<dyn WorldQuery>,
    directory: Arc<dyn ActorDirectory>,
    vertical: VerticalSearchConfig,
}

impl DestinationResolver {
    pub fn new(
        query: Arc<dyn WorldQuery>,
        directory: Arc<dyn ActorDirectory>,
        vertical: VerticalSearchConfig,
    ) -> Self {
        Self {
            query,
            directory,
            vertical,
        }
    }

    pub fn resolve(&self, target: &Target) -> Result<Coordinate, TeleportError> {
        match target {
            Target::Coordinate {
                coordinate,
                find_safe_y: safe,
            } => {
                if !self.query.is_world_loaded(&coordinate.world) {
                    return Err(TeleportError::WorldNotLoaded(coordinate.world.clone()));
                }
                let mut position = coordinate.position;
                if *safe {
                    position.y = find_safe_y(
                        self.query.as_ref(),
                        &coordinate.world,
                        position,
                        &self.vertical,
                    );
                }
                Ok(Coordinate {
                    world: coordinate.world.clone(),
                    position,
                    orientation: snap_cardinal(coordinate.orientation),
                })
            }
            Target::FollowActor(followed) => {
                let fault = |fault| TeleportError::TargetInvalid {
                    target: *followed,
                    fault,
                };
                let snapshot = self
                    .directory
                    .resolve(*followed)
                    .ok_or_else(|| fault(TargetFault::Offline))?;
                if !snapshot.valid {
                    return Err(fault(TargetFault::Stale));
                }
                let Coordinate {
                    world,
                    position,
                    orientation,
                } = snapshot.coordinate;
                Ok(Coordinate {
                    world,
                    position,
                    orientation: snap_cardinal(orientation),
                })
            }
        }
    }
}
