//! Seam to the external map marker service.
//!
//! The service owns marker sets, icons and markers. We only ever ask it to find
//! or create sets, create markers, list them, and delete them.

mod memory;

use getset::{CopyGetters, Getters};
use thiserror::Error;

pub use memory::InMemoryMarkerApi;

use crate::prelude::*;

#[derive(Debug, Error)]
pub enum MarkerApiError {
    #[error("marker service refused to create marker set [{0}]")]
    SetCreationRefused(String),
}

#[derive(Clone, Debug, Deref, Eq, Hash, PartialEq)]
pub struct MarkerId(pub String);

#[derive(Clone, Debug, Deref, Eq, Hash, PartialEq)]
pub struct MarkerIcon(pub String);

#[derive(Clone, Debug, Eq, Getters, PartialEq)]
#[getset(get = "pub")]
pub struct MarkerSetInfo {
    id: String,
    label: String,
    persistent: bool,
}

impl MarkerSetInfo {
    pub fn new<S: Into<String>>(id: S, label: S, persistent: bool) -> Self {
        MarkerSetInfo {
            id: id.into(),
            label: label.into(),
            persistent,
        }
    }
}

/// Where a marker sits: a level (world) name and a point inside it.
#[derive(Clone, Debug, Getters, PartialEq)]
pub struct MarkerLocation {
    #[getset(get = "pub")]
    level: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MarkerLocation {
    pub fn new<S: Into<String>>(level: S, x: f64, y: f64, z: f64) -> Self {
        MarkerLocation {
            level: level.into(),
            x,
            y,
            z,
        }
    }

    pub fn from_block<S: Into<String>>(level: S, pos: IVec3) -> Self {
        Self::new(level, pos.x as f64, pos.y as f64, pos.z as f64)
    }

    /// Block the marker points at, each coordinate truncated toward zero.
    pub fn block_pos(&self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }

    pub fn is_block(&self, level: &str, pos: IVec3) -> bool {
        self.level == level && self.block_pos() == pos
    }
}

#[derive(Clone, CopyGetters, Debug, Getters, PartialEq)]
pub struct Marker {
    #[getset(get = "pub")]
    id: MarkerId,
    #[getset(get = "pub")]
    set_id: String,
    #[getset(get = "pub")]
    description: String,
    #[getset(get = "pub")]
    location: MarkerLocation,
    #[getset(get = "pub")]
    icon: Option<MarkerIcon>,
    #[getset(get_copy = "pub")]
    persistent: bool,
}

impl Marker {
    pub fn new<S: Into<String>>(id: MarkerId, set_id: S, marker: NewMarker) -> Self {
        let NewMarker {
            description,
            location,
            icon,
            persistent,
        } = marker;
        Marker {
            id,
            set_id: set_id.into(),
            description,
            location,
            icon,
            persistent,
        }
    }
}

/// Everything needed to ask the service for a new marker
#[derive(Clone, Debug, PartialEq)]
pub struct NewMarker {
    pub description: String,
    pub location: MarkerLocation,
    pub icon: Option<MarkerIcon>,
    pub persistent: bool,
}

pub trait MarkerApi: std::fmt::Debug + Send + Sync + 'static {
    fn marker_set(&self, id: &str) -> Option<MarkerSetInfo>;

    fn create_marker_set(
        &mut self,
        id: &str,
        label: &str,
        persistent: bool,
    ) -> Result<MarkerSetInfo, MarkerApiError>;

    /// Unknown icon ids resolve to `None`, which the service treats as its default icon.
    fn marker_icon(&self, id: &str) -> Option<MarkerIcon>;

    /// `None` means the service did not create anything.
    fn create_marker(&mut self, set_id: &str, marker: NewMarker) -> Option<Marker>;

    fn markers(&self, set_id: &str) -> Vec<Marker>;

    fn delete_marker(&mut self, set_id: &str, marker_id: &MarkerId) -> bool;

    fn find_or_create_marker_set(
        &mut self,
        id: &str,
        label: &str,
        persistent: bool,
    ) -> Result<MarkerSetInfo, MarkerApiError> {
        match self.marker_set(id) {
            Some(existing) => Ok(existing),
            None => self.create_marker_set(id, label, persistent),
        }
    }
}

/// The marker service, once it has announced itself ready.
///
/// Inserting this resource is what activates [crate::DmsmPlugin].
#[derive(Debug, Resource)]
pub struct MarkerService(Box<dyn MarkerApi>);

impl MarkerService {
    pub fn new<A: MarkerApi>(api: A) -> Self {
        MarkerService(Box::new(api))
    }

    pub fn api(&self) -> &dyn MarkerApi {
        self.0.as_ref()
    }

    pub fn api_mut(&mut self) -> &mut dyn MarkerApi {
        self.0.as_mut()
    }
}
