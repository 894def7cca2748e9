use super::{Marker, MarkerApi, MarkerApiError, MarkerIcon, MarkerId, MarkerSetInfo, NewMarker};
use crate::prelude::*;

const DEFAULT_ICONS: [&str; 8] = [
    "default", "house", "coins", "portal", "sign", "pin", "tower", "wheat",
];

#[derive(Debug)]
struct MemorySet {
    info: MarkerSetInfo,
    markers: Vec<Marker>,
}

/// Marker service that lives in process memory.
///
/// Used by the standalone `dmsm run` harness and in tests.
#[derive(Debug, Default)]
pub struct InMemoryMarkerApi {
    sets: Vec<MemorySet>,
    icons: HashSet<String>,
    next_marker: u64,
    refuse_markers: bool,
    refuse_sets: bool,
}

impl InMemoryMarkerApi {
    pub fn with_default_icons() -> Self {
        DEFAULT_ICONS
            .iter()
            .fold(Self::default(), |api, icon| api.with_icon(icon))
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icons.insert(icon.to_string());
        self
    }

    /// Makes every [MarkerApi::create_marker] call fail
    pub fn refusing_markers(mut self) -> Self {
        self.refuse_markers = true;
        self
    }

    pub fn refusing_sets(mut self) -> Self {
        self.refuse_sets = true;
        self
    }

    pub fn marker_set_count(&self) -> usize {
        self.sets.len()
    }

    fn set(&self, id: &str) -> Option<&MemorySet> {
        self.sets.iter().find(|set| set.info.id() == id)
    }

    fn set_mut(&mut self, id: &str) -> Option<&mut MemorySet> {
        self.sets.iter_mut().find(|set| set.info.id() == id)
    }
}

impl MarkerApi for InMemoryMarkerApi {
    fn marker_set(&self, id: &str) -> Option<MarkerSetInfo> {
        self.set(id).map(|set| set.info.clone())
    }

    fn create_marker_set(
        &mut self,
        id: &str,
        label: &str,
        persistent: bool,
    ) -> Result<MarkerSetInfo, MarkerApiError> {
        if self.refuse_sets || self.set(id).is_some() {
            return Err(MarkerApiError::SetCreationRefused(id.to_string()));
        }
        let info = MarkerSetInfo::new(id, label, persistent);
        self.sets.push(MemorySet {
            info: info.clone(),
            markers: Vec::new(),
        });
        Ok(info)
    }

    fn marker_icon(&self, id: &str) -> Option<MarkerIcon> {
        self.icons
            .contains(id)
            .then(|| MarkerIcon(id.to_string()))
    }

    fn create_marker(&mut self, set_id: &str, marker: NewMarker) -> Option<Marker> {
        if self.refuse_markers {
            return None;
        }
        let id = MarkerId(format!("marker_{}", self.next_marker));
        let set = self.set_mut(set_id)?;
        let marker = Marker::new(id, set_id, marker);
        set.markers.push(marker.clone());
        self.next_marker += 1;
        Some(marker)
    }

    fn markers(&self, set_id: &str) -> Vec<Marker> {
        self.set(set_id)
            .map(|set| set.markers.clone())
            .unwrap_or_default()
    }

    fn delete_marker(&mut self, set_id: &str, marker_id: &MarkerId) -> bool {
        let Some(set) = self.set_mut(set_id) else {
            return false;
        };
        let before = set.markers.len();
        set.markers.retain(|marker| marker.id() != marker_id);
        set.markers.len() != before
    }
}
