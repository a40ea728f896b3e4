use std::future::Future;
use std::sync::Arc;

use glam::DVec3;
use rand::Rng;
use warpgate_common::WorldId;
use warpgate_kernel::WorldQuery;

use crate::column::{ColumnVerdict, ColumnView, ResidentColumn, scan_column};
use crate::config::SearchConfig;

/// Errors from the landing search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("World '{0}' is not loaded.")]
    WorldNotLoaded(WorldId),
    #[error("Could not find a safe location after {attempts} attempts. Try again.")]
    NoSafeLocation { attempts: u32 },
}

/// A landing spot found by the search. Consumed once, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 1-based attempt that produced this location.
    pub attempt: u32,
}

impl SafeLocation {
    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// Bounded-attempt random search for a dry, unobstructed landing spot within
/// a square of `radius` around the world origin.
#[derive(Clone)]
pub struct SafeLocationSearch {
    query: Arc<dyn WorldQuery>,
    config: SearchConfig,
}

impl SafeLocationSearch {
    pub fn new(query: Arc<dyn WorldQuery>, config: SearchConfig) -> Self {
        Self { query, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search using only resident columns. Never fetches and never waits; a
    /// sampled column that is not resident costs its attempt.
    pub fn find_blocking<R: Rng + ?Sized>(
        &self,
        world: &WorldId,
        radius: i32,
        rng: &mut R,
    ) -> Result<SafeLocation, SearchError> {
        let _span = tracing::debug_span!("safe_search", %world, radius, mode = "blocking").entered();
        if !self.query.is_world_loaded(world) {
            return Err(SearchError::WorldNotLoaded(world.clone()));
        }
        for attempt in 1..=self.config.max_attempts {
            let (x, z) = sample(rng, radius);
            let (bx, bz) = (x.floor() as i32, z.floor() as i32);
            if !self.query.is_column_resident(world, bx, bz) {
                tracing::trace!(attempt, bx, bz, "column not resident");
                continue;
            }
            let column = ResidentColumn::new(self.query.as_ref(), world, bx, bz);
            if let Some(found) = judge(&column, &self.config, x, z, attempt) {
                return Ok(found);
            }
        }
        Err(self.exhausted())
    }

    /// Search fetching each sampled column without blocking. Attempt `n + 1`
    /// starts only after the fetch for attempt `n` has completed.
    ///
    /// Samples are drawn from `rng` in the same order as
    /// [`SafeLocationSearch::find_blocking`].
    pub fn find<R>(
        &self,
        world: WorldId,
        radius: i32,
        mut rng: R,
    ) -> impl Future<Output = Result<SafeLocation, SearchError>> + Send + 'static
    where
        R: Rng + Send + 'static,
    {
        let query = Arc::clone(&self.query);
        let config = self.config.clone();
        async move {
            tracing::debug!(%world, radius, mode = "async", "safe search started");
            if !query.is_world_loaded(&world) {
                return Err(SearchError::WorldNotLoaded(world));
            }
            for attempt in 1..=config.max_attempts {
                let (x, z) = sample(&mut rng, radius);
                let (bx, bz) = (x.floor() as i32, z.floor() as i32);
                let Some(column) = query.fetch_column(&world, bx, bz).await else {
                    tracing::trace!(attempt, bx, bz, "column fetch failed");
                    continue;
                };
                if let Some(found) = judge(&column, &config, x, z, attempt) {
                    return Ok(found);
                }
            }
            Err(SearchError::NoSafeLocation {
                attempts: config.max_attempts,
            })
        }
    }

    fn exhausted(&self) -> SearchError {
        SearchError::NoSafeLocation {
            attempts: self.config.max_attempts,
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, radius: i32) -> (f64, f64) {
    let r = f64::from(radius.max(0));
    let x = rng.gen_range(-r..=r);
    let z = rng.gen_range(-r..=r);
    (x, z)
}

fn judge(
    column: &impl ColumnView,
    config: &SearchConfig,
    x: f64,
    z: f64,
    attempt: u32,
) -> Option<SafeLocation> {
    match scan_column(column, config) {
        ColumnVerdict::Spawn(y) => {
            tracing::debug!(attempt, x, y, z, "safe location found");
            Some(SafeLocation {
                x,
                y: f64::from(y),
                z,
                attempt,
            })
        }
        ColumnVerdict::Fluid(y) => {
            tracing::trace!(attempt, x, z, fluid_y = y, "column rejected: fluid");
            None
        }
        ColumnVerdict::Exhausted => {
            tracing::trace!(attempt, x, z, "column rejected: no ground");
            None
        }
    }
}
