use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::BoxFuture;
use glam::{DVec3, IVec3};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use warpgate_common::{ActorId, Coordinate, Material, WorldId};

use crate::host::{
    ActorDirectory, ActorSnapshot, Notifier, PermissionCheck, Relocator, WorldQuery,
};
use crate::terrain::{ChunkCoord, ColumnSnapshot, Terrain};

/// An event record produced by every mutation to the host world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Actor connected at the given coordinate.
    Joined { id: ActorId, at: Coordinate },
    /// Actor disconnected.
    Left { id: ActorId, at: Coordinate },
    /// Actor walked to a new position within its world.
    Moved { id: ActorId, from: DVec3, to: DVec3 },
    /// A staged relocation was applied.
    Relocated {
        id: ActorId,
        from: Coordinate,
        to: Coordinate,
    },
    /// Simulation advanced one tick.
    Stepped { tick: u64 },
}

/// Per-actor data stored in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorData {
    pub coordinate: Coordinate,
    /// Cleared when the host reference goes stale while still connected.
    pub valid: bool,
}

/// Reference in-memory host.
///
/// Holds connected actors, per-world terrain and granted permissions.
/// Relocations are staged and applied at the start of the next [`World::step`],
/// like a component the host applies on its own schedule.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct World {
    actors: BTreeMap<ActorId, ActorData>,
    worlds: BTreeMap<WorldId, Terrain>,
    permissions: BTreeMap<ActorId, BTreeSet<String>>,
    staged: Vec<(ActorId, Coordinate)>,
    tick: u64,
    event_log: Vec<WorldEvent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all actors.
    pub fn actors(&self) -> &BTreeMap<ActorId, ActorData> {
        &self.actors
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorData> {
        self.actors.get(&id)
    }

    pub fn load_world(&mut self, name: impl Into<WorldId>, terrain: Terrain) {
        let name = name.into();
        tracing::debug!(world = %name, columns = terrain.column_count(), "world loaded");
        self.worlds.insert(name, terrain);
    }

    pub fn unload_world(&mut self, name: &WorldId) -> Option<Terrain> {
        self.worlds.remove(name)
    }

    pub fn terrain(&self, name: &WorldId) -> Option<&Terrain> {
        self.worlds.get(name)
    }

    pub fn terrain_mut(&mut self, name: &WorldId) -> Option<&mut Terrain> {
        self.worlds.get_mut(name)
    }

    /// Connect a new actor at `at`. Returns its id.
    pub fn join(&mut self, at: Coordinate) -> ActorId {
        let id = ActorId::new();
        self.join_with_id(id, at);
        id
    }

    pub fn join_with_id(&mut self, id: ActorId, at: Coordinate) {
        self.actors.insert(
            id,
            ActorData {
                coordinate: at.clone(),
                valid: true,
            },
        );
        self.event_log.push(WorldEvent::Joined { id, at });
    }

    /// Disconnect an actor. Returns its data if it was connected.
    pub fn leave(&mut self, id: ActorId) -> Option<ActorData> {
        let data = self.actors.remove(&id);
        if let Some(ref d) = data {
            self.event_log.push(WorldEvent::Left {
                id,
                at: d.coordinate.clone(),
            });
        }
        self.permissions.remove(&id);
        data
    }

    /// Mark the host reference to an actor stale without disconnecting it.
    pub fn invalidate(&mut self, id: ActorId) -> bool {
        match self.actors.get_mut(&id) {
            Some(data) => {
                data.valid = false;
                true
            }
            None => false,
        }
    }

    /// Walk an actor to `to` inside its current world.
    pub fn move_to(&mut self, id: ActorId, to: DVec3) -> bool {
        if let Some(data) = self.actors.get_mut(&id) {
            let from = data.coordinate.position;
            data.coordinate.position = to;
            self.event_log.push(WorldEvent::Moved { id, from, to });
            true
        } else {
            false
        }
    }

    pub fn grant(&mut self, id: ActorId, permission: impl Into<String>) {
        self.permissions
            .entry(id)
            .or_default()
            .insert(permission.into());
    }

    pub fn has_permission(&self, id: ActorId, permission: &str) -> bool {
        self.permissions
            .get(&id)
            .is_some_and(|set| set.contains(permission))
    }

    /// Queue a relocation to be applied on the next step.
    pub fn stage_relocation(&mut self, id: ActorId, to: Coordinate) -> bool {
        if !self.actors.contains_key(&id) {
            return false;
        }
        self.staged.push((id, to));
        true
    }

    /// Relocations waiting for the next step.
    pub fn staged(&self) -> &[(ActorId, Coordinate)] {
        &self.staged
    }

    /// Advance the simulation by one tick, applying staged relocations first.
    pub fn step(&mut self) {
        for (id, to) in std::mem::take(&mut self.staged) {
            let Some(data) = self.actors.get_mut(&id) else {
                tracing::debug!(actor = %id, "dropping relocation for departed actor");
                continue;
            };
            let from = std::mem::replace(&mut data.coordinate, to.clone());
            self.event_log.push(WorldEvent::Relocated { id, from, to });
        }
        self.tick += 1;
        self.event_log.push(WorldEvent::Stepped { tick: self.tick });
    }
}

/// Thread-safe handle to a [`World`] implementing every host interface.
///
/// Messages delivered through [`Notifier`] go to a mailbox kept outside the
/// world lock, so notifying never contends with world readers. Drivers must
/// not hold a guard from [`SharedWorld::read`] while ticking the engine.
#[derive(Clone, Default)]
pub struct SharedWorld {
    world: Arc<RwLock<World>>,
    mailbox: Arc<Mutex<BTreeMap<ActorId, Vec<String>>>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            world: Arc::new(RwLock::new(world)),
            mailbox: Arc::default(),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, World> {
        self.world.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, World> {
        self.world.write()
    }

    /// Messages delivered to `actor` so far.
    pub fn messages(&self, actor: ActorId) -> Vec<String> {
        self.mailbox.lock().get(&actor).cloned().unwrap_or_default()
    }

    pub fn take_messages(&self, actor: ActorId) -> Vec<String> {
        self.mailbox.lock().remove(&actor).unwrap_or_default()
    }

    fn with_terrain<T>(&self, world: &WorldId, f: impl FnOnce(&Terrain) -> T) -> Option<T> {
        self.world.read().terrain(world).map(f)
    }
}

impl WorldQuery for SharedWorld {
    fn is_world_loaded(&self, world: &WorldId) -> bool {
        self.world.read().terrain(world).is_some()
    }

    fn is_column_resident(&self, world: &WorldId, x: i32, z: i32) -> bool {
        self.with_terrain(world, |t| t.is_resident(x, z))
            .unwrap_or(false)
    }

    fn block_material(&self, world: &WorldId, pos: IVec3) -> Material {
        self.with_terrain(world, |t| {
            if t.is_resident(pos.x, pos.z) {
                t.cell(pos).material
            } else {
                Material::Empty
            }
        })
        .unwrap_or_default()
    }

    fn has_fluid(&self, world: &WorldId, pos: IVec3) -> bool {
        self.with_terrain(world, |t| t.is_resident(pos.x, pos.z) && t.cell(pos).fluid)
            .unwrap_or(false)
    }

    fn fetch_column(
        &self,
        world: &WorldId,
        x: i32,
        z: i32,
    ) -> BoxFuture<'static, Option<ColumnSnapshot>> {
        let handle = self.world.clone();
        let world = world.clone();
        Box::pin(async move {
            let mut guard = handle.write();
            let terrain = guard.terrain_mut(&world)?;
            terrain.load_chunk(ChunkCoord::from_block(x, z));
            Some(terrain.column(x, z))
        })
    }
}

impl ActorDirectory for SharedWorld {
    fn resolve(&self, actor: ActorId) -> Option<ActorSnapshot> {
        self.world.read().get(actor).map(|data| ActorSnapshot {
            coordinate: data.coordinate.clone(),
            valid: data.valid,
        })
    }
}

impl PermissionCheck for SharedWorld {
    fn has_permission(&self, actor: ActorId, permission: &str) -> bool {
        self.world.read().has_permission(actor, permission)
    }
}

impl Notifier for SharedWorld {
    fn notify(&self, actor: ActorId, message: &str) {
        tracing::trace!(actor = %actor, message, "notify");
        self.mailbox
            .lock()
            .entry(actor)
            .or_default()
            .push(message.to_owned());
    }
}

impl Relocator for SharedWorld {
    fn relocate(&self, actor: ActorId, destination: Coordinate) -> bool {
        self.world.write().stage_relocation(actor, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpgate_common::{Cell, Orientation};

    fn spawn_point() -> Coordinate {
        Coordinate::new("overworld", DVec3::new(0.5, 65.0, 0.5), Orientation::default())
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.actor_count(), 0);
    }

    #[test]
    fn join_and_leave() {
        let mut w = World::new();
        let id = w.join(spawn_point());
        assert_eq!(w.actor_count(), 1);
        assert!(w.get(id).is_some_and(|d| d.valid));

        let data = w.leave(id);
        assert!(data.is_some());
        assert_eq!(w.actor_count(), 0);
        assert_eq!(w.events().len(), 2);
    }

    #[test]
    fn staged_relocation_applies_on_step() {
        let mut w = World::new();
        let id = w.join(spawn_point());
        let target = Coordinate::new("nether", DVec3::new(10.0, 70.0, -3.0), Orientation::default());

        assert!(w.stage_relocation(id, target.clone()));
        assert_eq!(w.get(id).unwrap().coordinate, spawn_point());

        w.step();
        assert_eq!(w.get(id).unwrap().coordinate, target);
        assert!(w.staged().is_empty());
        assert!(matches!(w.events()[1], WorldEvent::Relocated { .. }));
    }

    #[test]
    fn relocation_for_unknown_actor_is_refused() {
        let mut w = World::new();
        assert!(!w.stage_relocation(ActorId::new(), spawn_point()));
    }

    #[test]
    fn departed_actor_relocation_is_dropped() {
        let mut w = World::new();
        let id = w.join(spawn_point());
        w.stage_relocation(id, spawn_point());
        w.leave(id);
        w.step();
        assert_eq!(w.tick(), 1);
        assert!(w.get(id).is_none());
    }

    #[test]
    fn move_to_logs_event() {
        let mut w = World::new();
        let id = w.join(spawn_point());
        assert!(w.move_to(id, DVec3::new(3.0, 65.0, 0.5)));
        assert_eq!(w.get(id).unwrap().coordinate.position.x, 3.0);
        assert!(matches!(w.events()[1], WorldEvent::Moved { .. }));
    }

    #[test]
    fn permissions_are_per_actor() {
        let mut w = World::new();
        let a = w.join(spawn_point());
        let b = w.join(spawn_point());
        w.grant(a, "teleport.bypass");
        assert!(w.has_permission(a, "teleport.bypass"));
        assert!(!w.has_permission(b, "teleport.bypass"));
        w.leave(a);
        assert!(!w.has_permission(a, "teleport.bypass"));
    }

    #[test]
    fn shared_world_hides_non_resident_columns() {
        let mut terrain = Terrain::new();
        terrain.fill_ground(0, 0, 10);
        let mut w = World::new();
        w.load_world("overworld", terrain);
        let shared = SharedWorld::new(w);
        let overworld = WorldId::new("overworld");

        assert!(shared.is_world_loaded(&overworld));
        assert!(!shared.is_column_resident(&overworld, 0, 0));
        assert_eq!(
            shared.block_material(&overworld, IVec3::new(0, 5, 0)),
            Material::Empty
        );

        let column = pollster::block_on(shared.fetch_column(&overworld, 0, 0));
        assert_eq!(column.map(|c| c.cell(10)), Some(Cell::SOLID));
        assert!(shared.is_column_resident(&overworld, 0, 0));
        assert_eq!(
            shared.block_material(&overworld, IVec3::new(0, 5, 0)),
            Material::Solid
        );
    }

    #[test]
    fn fetch_column_in_unloaded_world_is_none() {
        let shared = SharedWorld::default();
        let column = pollster::block_on(shared.fetch_column(&WorldId::new("void"), 0, 0));
        assert!(column.is_none());
    }

    #[test]
    fn notifier_fills_mailbox() {
        let shared = SharedWorld::default();
        let id = ActorId::new();
        shared.notify(id, "hello");
        shared.notify(id, "again");
        assert_eq!(shared.messages(id), vec!["hello", "again"]);
        assert_eq!(shared.take_messages(id).len(), 2);
        assert!(shared.messages(id).is_empty());
    }

    #[test]
    fn directory_reports_validity() {
        let mut w = World::new();
        let id = w.join(spawn_point());
        let shared = SharedWorld::new(w);
        assert!(shared.resolve(id).is_some_and(|s| s.valid));
        shared.write().invalidate(id);
        assert!(shared.resolve(id).is_some_and(|s| !s.valid));
        assert!(shared.resolve(ActorId::new()).is_none());
    }
}
