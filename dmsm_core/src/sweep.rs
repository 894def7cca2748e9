//! Periodic cleanup of markers whose sign is gone.
//!
//! A marker survives a sweep only if a sign tile sits at its block and the
//! sign's first line is still the marker type's keyword.

use std::time::Duration;

use crate::host::{LookupError, Tile, TileLookup};
use crate::marker_api::Marker;
use crate::prelude::*;

#[derive(Debug, Deref, DerefMut, Resource)]
pub struct SweepTimer(Timer);

impl SweepTimer {
    pub fn new(interval: Duration) -> Self {
        SweepTimer(Timer::new(interval, TimerMode::Repeating))
    }
}

/// Ask for a sweep on the next frame instead of waiting for the timer.
#[derive(Clone, Copy, Debug, Default, Event)]
pub struct RequestSweep;

/// Outcome of one sweep
#[derive(Clone, Copy, Debug, Default, Event, Eq, PartialEq)]
pub struct SweepReport {
    /// Dangling markers that were deleted
    pub removed: usize,
    /// Markers in levels that aren't loaded, left alone
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Dangling {
    NoTile,
    NotASign,
    WrongKeyword,
}

pub(crate) fn sys_sweep(
    time: Res<Time>,
    mut res_timer: ResMut<SweepTimer>,
    mut evr_request: EventReader<RequestSweep>,
    res_registry: Res<MarkerTypeRegistry>,
    mut res_service: ResMut<MarkerService>,
    tiles: TileLookup,
    mut evw_report: EventWriter<SweepReport>,
) {
    let requested = evr_request.read().count() > 0;
    let due = res_timer.tick(time.delta()).just_finished();
    if !(requested || due) {
        return;
    }
    let report = sweep_markers(&res_registry, res_service.api_mut(), &tiles);
    evw_report.send(report);
}

/// Deletes every marker in the registry's sets that no longer has a matching sign.
pub fn sweep_markers(
    registry: &MarkerTypeRegistry,
    api: &mut dyn MarkerApi,
    tiles: &TileLookup,
) -> SweepReport {
    log::info!("Cleanup task running...");
    let mut report = SweepReport::default();

    for marker_type in registry.iter() {
        for marker in api.markers(marker_type.id()) {
            let dangling = match check_marker(&marker, marker_type, tiles) {
                Ok(None) => continue,
                Ok(Some(dangling)) => dangling,
                Err(e) => {
                    log::warn!(
                        "Skipping {} marker {}: {e}",
                        marker_type.id(),
                        marker.id().as_str()
                    );
                    report.skipped += 1;
                    continue;
                },
            };
            if api.delete_marker(marker_type.id(), marker.id()) {
                log::debug!(
                    "Removed {} marker {} at {} in [{}]: {dangling:?}",
                    marker.set_id(),
                    marker.id().as_str(),
                    marker.location().block_pos(),
                    marker.location().level()
                );
                report.removed += 1;
            } else {
                log::warn!(
                    "Could not remove dangling {} marker {}",
                    marker_type.id(),
                    marker.id().as_str()
                );
            }
        }
    }

    log::info!(
        "Cleanup removed {} dangling sign markers",
        report.removed
    );
    if report.skipped > 0 {
        log::warn!(
            "Cleanup skipped {} markers in unloaded levels",
            report.skipped
        );
    }
    report
}

fn check_marker(
    marker: &Marker,
    marker_type: &MarkerType,
    tiles: &TileLookup,
) -> Result<Option<Dangling>, LookupError> {
    let location = marker.location();
    let verdict = match tiles.tile_at(location.level(), location.block_pos())? {
        None => Some(Dangling::NoTile),
        Some(Tile::Other) => Some(Dangling::NotASign),
        Some(Tile::Sign(sign)) if !marker_type.matches(sign.first_line()) => {
            Some(Dangling::WrongKeyword)
        },
        Some(Tile::Sign(_)) => None,
    };
    Ok(verdict)
}
