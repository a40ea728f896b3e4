use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use warpgate_common::{ActorId, Coordinate};
use warpgate_kernel::{ActorDirectory, Notifier, Relocator};

use crate::error::TeleportError;
use crate::pending::{PendingAction, SuccessHook, Target};
use crate::resolver::DestinationResolver;

/// Applies a resolved destination to an actor through the host's
/// [`Relocator`] and reports the result to the actor.
pub struct TeleportExecutor {
    resolver: DestinationResolver,
    directory: Arc<dyn ActorDirectory>,
    relocator: Arc<dyn Relocator>,
    notifier: Arc<dyn Notifier>,
}

impl TeleportExecutor {
    pub fn new(
        resolver: DestinationResolver,
        directory: Arc<dyn ActorDirectory>,
        relocator: Arc<dyn Relocator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            directory,
            relocator,
            notifier,
        }
    }

    pub fn resolver(&self) -> &DestinationResolver {
        &self.resolver
    }

    /// Resolve `target` and stage the relocation. Sends no messages.
    pub fn execute(&self, actor: ActorId, target: &Target) -> Result<Coordinate, TeleportError> {
        match self.directory.resolve(actor) {
            Some(snapshot) if snapshot.valid => {}
            _ => return Err(TeleportError::ActorUnavailable(actor)),
        }
        let destination = self.resolver.resolve(target)?;
        if !self.relocator.relocate(actor, destination.clone()) {
            return Err(TeleportError::ActorUnavailable(actor));
        }
        tracing::debug!(
            actor = %actor,
            world = %destination.world,
            x = destination.position.x,
            y = destination.position.y,
            z = destination.position.z,
            "relocation staged"
        );
        Ok(destination)
    }

    /// Execute, run the success hook, and tell the actor how it went.
    ///
    /// A panic raised by the host is contained here and reported as
    /// [`TeleportError::Aborted`].
    pub fn run(
        &self,
        actor: ActorId,
        target: &Target,
        success_message: Option<&str>,
        on_success: Option<SuccessHook>,
    ) -> Result<Coordinate, TeleportError> {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let destination = self.execute(actor, target)?;
            if let Some(hook) = on_success {
                hook();
            }
            Ok(destination)
        }))
        .unwrap_or_else(|payload| {
            tracing::error!(
                actor = %actor,
                panic = panic_message(payload.as_ref()),
                "teleport execution panicked"
            );
            Err(TeleportError::Aborted)
        });

        match &result {
            Ok(_) => {
                if let Some(message) = success_message {
                    self.notifier.notify(actor, message);
                }
            }
            Err(err) => {
                tracing::warn!(actor = %actor, error = %err, "teleport failed");
                self.notifier.notify(actor, &err.to_string());
            }
        }
        result
    }

    /// Body of the deferred job for a pending action that became ready.
    pub fn complete(&self, action: PendingAction) -> Result<Coordinate, TeleportError> {
        let PendingAction {
            actor,
            target,
            success_message,
            on_success,
            ..
        } = action;
        self.run(actor, &target, success_message.as_deref(), on_success)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use warpgate_common::Orientation;
    use warpgate_kernel::{SharedWorld, Terrain, World};
    use warpgate_search::VerticalSearchConfig;

    fn executor_for(shared: &SharedWorld, relocator: Arc<dyn Relocator>) -> TeleportExecutor {
        let resolver = DestinationResolver::new(
            Arc::new(shared.clone()),
            Arc::new(shared.clone()),
            VerticalSearchConfig::default(),
        );
        TeleportExecutor::new(
            resolver,
            Arc::new(shared.clone()),
            relocator,
            Arc::new(shared.clone()),
        )
    }

    fn setup() -> (SharedWorld, ActorId) {
        let mut world = World::new();
        world.load_world("overworld", Terrain::flat(8, 10));
        let actor = world.join(Coordinate::new(
            "overworld",
            DVec3::new(0.0, 11.0, 0.0),
            Orientation::default(),
        ));
        (SharedWorld::new(world), actor)
    }

    fn home() -> Target {
        Target::coordinate(Coordinate::new(
            "overworld",
            DVec3::new(5.0, 11.0, 5.0),
            Orientation::new(170.0, -60.0),
        ))
    }

    #[test]
    fn run_stages_relocation_and_notifies() {
        let (shared, actor) = setup();
        let executor = executor_for(&shared, Arc::new(shared.clone()));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);

        let destination = executor
            .run(
                actor,
                &home(),
                Some("Welcome home."),
                Some(Box::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        assert_eq!(destination.orientation, Orientation::new(180.0, 0.0));
        assert_eq!(shared.read().staged().len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(shared.messages(actor), vec!["Welcome home.".to_owned()]);

        shared.write().step();
        assert_eq!(
            shared.read().get(actor).unwrap().coordinate.position,
            DVec3::new(5.0, 11.0, 5.0)
        );
    }

    #[test]
    fn invalid_actor_is_unavailable() {
        let (shared, actor) = setup();
        shared.write().invalidate(actor);
        let executor = executor_for(&shared, Arc::new(shared.clone()));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);

        let err = executor
            .run(
                actor,
                &home(),
                None,
                Some(Box::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap_err();
        assert_eq!(err, TeleportError::ActorUnavailable(actor));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(
            shared.messages(actor),
            vec!["Teleport failed - player reference invalid.".to_owned()]
        );
        assert!(shared.read().staged().is_empty());
    }

    struct PanickingRelocator;

    impl Relocator for PanickingRelocator {
        fn relocate(&self, _actor: ActorId, _destination: Coordinate) -> bool {
            panic!("host store rejected the component");
        }
    }

    #[test]
    fn host_panic_is_reported_generically() {
        let (shared, actor) = setup();
        let executor = executor_for(&shared, Arc::new(PanickingRelocator));
        let err = executor.run(actor, &home(), Some("ok"), None).unwrap_err();
        assert_eq!(err, TeleportError::Aborted);
        assert_eq!(shared.messages(actor), vec!["Teleport failed.".to_owned()]);
    }
}
