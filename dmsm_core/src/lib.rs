#![allow(
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::single_match
)]
pub mod config;
pub mod host;
pub mod marker_api;
pub mod prelude;
pub mod registry;
pub mod settings;
mod sign_events;
pub mod sweep;
#[cfg(test)]
mod testing;

use bevy::ecs::schedule::common_conditions::{resource_added, resource_exists};

use self::prelude::*;
use self::sweep::SweepTimer;

/// Ordering of everything that touches pending host changes in [Update].
///
/// Host systems that push sign edits or block breaks belong in `HostEvents`,
/// so the marker handlers see them before the host applies them.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum DmsmSet {
    HostEvents,
    HandleEvents,
    ApplyEvents,
    Sweep,
}

/// Sign marker integration.
///
/// Does nothing until a [MarkerService] resource is inserted. The first frame
/// it exists, the marker type config is loaded and the registry is built; from
/// then on sign edits and block breaks are checked against it and the sweep
/// timer runs.
#[derive(Debug)]
pub struct DmsmPlugin;

impl Plugin for DmsmPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DmsmSettings>()
            .init_resource::<Time>()
            .add_event::<sweep::RequestSweep>()
            .add_event::<sweep::SweepReport>()
            .configure_sets(
                Update,
                (
                    DmsmSet::HostEvents,
                    DmsmSet::HandleEvents,
                    DmsmSet::ApplyEvents,
                    DmsmSet::Sweep,
                )
                    .chain(),
            )
            .add_systems(
                PreUpdate,
                (
                    sys_deactivate.run_if(resource_exists::<MarkerTypeRegistry>),
                    sys_activate.run_if(resource_added::<MarkerService>),
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    (
                        sign_events::sys_handle_sign_changes,
                        sign_events::sys_handle_block_breaks,
                    )
                        .chain()
                        .in_set(DmsmSet::HandleEvents),
                    sweep::sys_sweep.in_set(DmsmSet::Sweep),
                )
                    .run_if(is_active),
            );
    }
}

/// True once the registry has been built and the marker service is still around.
pub fn is_active(
    registry: Option<Res<MarkerTypeRegistry>>,
    service: Option<Res<MarkerService>>,
) -> bool {
    registry.is_some() && service.is_some()
}

fn sys_activate(
    mut commands: Commands,
    settings: Res<DmsmSettings>,
    mut service: ResMut<MarkerService>,
) {
    log::info!("Marker service available, loading marker types");
    let config = config::load_marker_types(settings.config_path());
    let registry = MarkerTypeRegistry::build(config.definitions, service.api_mut());
    log::info!("Running with {} marker type(s)", registry.len());
    commands.insert_resource(registry);
    commands.insert_resource(SweepTimer::new(settings.sweep_interval()));
    log::info!(
        "Started cleanup routine, sweeping every {:?}",
        settings.sweep_interval()
    );
}

fn sys_deactivate(mut commands: Commands, service: Option<Res<MarkerService>>) {
    if service.is_none() {
        log::info!("Marker service went away, sign markers deactivated");
        commands.remove_resource::<MarkerTypeRegistry>();
        commands.remove_resource::<SweepTimer>();
    }
}
