use glam::{DVec3, IVec3};
use warpgate_common::{Material, WorldId};
use warpgate_kernel::WorldQuery;

use crate::config::VerticalSearchConfig;

/// Lowest Y at or above `position` with `player_height` non-solid cells.
///
/// Scans upward from the block holding `position` for at most
/// `max_height` cells. Returns the original Y unchanged when the column is
/// not resident or no opening is found; this search never fails.
pub fn find_safe_y(
    query: &dyn WorldQuery,
    world: &WorldId,
    position: DVec3,
    config: &VerticalSearchConfig,
) -> f64 {
    let floored = position.floor();
    let addressable = f64::from(i32::MIN)..=f64::from(i32::MAX);
    if !floored.is_finite() || !addressable.contains(&floored.y) {
        return position.y;
    }
    let block = floored.as_ivec3();
    if !query.is_column_resident(world, block.x, block.z) {
        tracing::trace!(%world, ?block, "column not resident, keeping stored y");
        return position.y;
    }
    // Openings whose headroom would pass i32::MAX do not exist.
    let fits = |y: i32| {
        y.checked_add(config.player_height).is_some_and(|top| {
            (y..top).all(|h| {
                query.block_material(world, IVec3::new(block.x, h, block.z)) != Material::Solid
            })
        })
    };
    let end = block.y.saturating_add(config.max_height.max(0));
    match (block.y..end).find(|&y| fits(y)) {
        Some(y) => f64::from(y),
        None => position.y,
    }
}
