pub use bevy::prelude::{
    default, App, Commands, Component, Deref, DerefMut, Entity, Event, EventReader,
    EventWriter, IVec3, IntoSystemConfigs, IntoSystemSetConfigs, Plugin, PreUpdate, Query, Res,
    ResMut, Resource, SystemSet, Time, Timer, TimerMode, Update, Vec3, With, World,
};
pub use bevy::utils::{HashMap, HashSet};

pub use crate::host::{
    ChatMessage, Feedback, LoadedLevels, PendingBlockBreaks, PendingSignChanges, Permissions,
    Player, Sign, SignLine, TextColor, TileEntity,
};
pub use crate::marker_api::{MarkerApi, MarkerLocation, MarkerService};
pub use crate::registry::{MarkerType, MarkerTypeRegistry};
pub use crate::settings::DmsmSettings;
