//! The slice of the game host the sign marker plugin talks to: players and
//! their permissions, tile entities and signs, chat, and the two cancellable
//! changes we listen for.
//!
//! Sign edits and block breaks are queued by the host in
//! [PendingSignChanges] and [PendingBlockBreaks]. Handlers in
//! [DmsmSet::HandleEvents] may cancel or restyle them in place, then the
//! appliers in [DmsmSet::ApplyEvents] drain the queues and change the world.

use bevy::ecs::system::SystemParam;
use getset::Getters;
use thiserror::Error;

use crate::prelude::*;
use crate::DmsmSet;

#[derive(Debug)]
pub struct HostPlugin;

impl Plugin for HostPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadedLevels>()
            .init_resource::<PendingSignChanges>()
            .init_resource::<PendingBlockBreaks>()
            .add_event::<ChatMessage>()
            .add_event::<Feedback>()
            .add_systems(
                Update,
                (sys_apply_sign_changes, sys_apply_block_breaks).in_set(DmsmSet::ApplyEvents),
            );
    }
}

#[derive(Clone, Component, Debug, Getters)]
pub struct Player {
    #[getset(get = "pub")]
    name: String,
}

impl Player {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Player { name: name.into() }
    }
}

/// Permission nodes held by a player.
///
/// Nodes are dotted and hierarchical: holding `dmsm` grants `dmsm.plots`.
#[derive(Clone, Component, Debug, Default, Deref, DerefMut)]
pub struct Permissions(HashSet<String>);

impl Permissions {
    pub fn grants(&self, permission: &str) -> bool {
        let mut node = permission;
        loop {
            if self.0.contains(node) {
                return true;
            }
            match node.rfind('.') {
                Some(parent_end) => node = &node[..parent_end],
                None => return false,
            }
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Permissions(iter.into_iter().map(Into::into).collect())
    }
}

/// A block entity at an integer position in a named level
#[derive(Clone, Component, Debug, Getters, PartialEq)]
pub struct TileEntity {
    #[getset(get = "pub")]
    level: String,
    pub pos: IVec3,
}

impl TileEntity {
    pub fn new<S: Into<String>>(level: S, pos: IVec3) -> Self {
        TileEntity {
            level: level.into(),
            pos,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextColor {
    Aqua,
    DarkRed,
    Green,
    Red,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignLine {
    pub text: String,
    pub color: Option<TextColor>,
    pub bold: bool,
}

impl SignLine {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        SignLine {
            text: text.into(),
            ..default()
        }
    }
}

#[derive(Clone, Component, Debug, Default, PartialEq)]
pub struct Sign {
    pub lines: Vec<SignLine>,
}

impl Sign {
    pub fn from_text<S: AsRef<str>>(lines: &[S]) -> Self {
        Sign {
            lines: lines.iter().map(|line| SignLine::plain(line.as_ref())).collect(),
        }
    }

    /// Plain text of the first line, empty for a blank sign
    pub fn first_line(&self) -> &str {
        first_line(&self.lines)
    }
}

fn first_line(lines: &[SignLine]) -> &str {
    lines.first().map(|line| line.text.as_str()).unwrap_or_default()
}

/// A player or the world wants to change the text on a sign.
#[derive(Clone, Debug)]
pub struct SignChange {
    pub sign: Entity,
    /// Entity that caused the change, if any
    pub cause: Option<Entity>,
    pub lines: Vec<SignLine>,
    cancelled: bool,
}

impl SignChange {
    pub fn new(sign: Entity, cause: Option<Entity>, lines: Vec<SignLine>) -> Self {
        SignChange {
            sign,
            cause,
            lines,
            cancelled: false,
        }
    }

    pub fn first_line(&self) -> &str {
        first_line(&self.lines)
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Debug, Default, Deref, DerefMut, Resource)]
pub struct PendingSignChanges(Vec<SignChange>);

/// Blocks about to be broken in one level, all by the same cause.
#[derive(Clone, Debug)]
pub struct BlockBreak {
    pub level: String,
    pub positions: Vec<IVec3>,
    pub cause: Option<Entity>,
    cancelled: bool,
}

impl BlockBreak {
    pub fn new<S: Into<String>>(level: S, positions: Vec<IVec3>, cause: Option<Entity>) -> Self {
        BlockBreak {
            level: level.into(),
            positions,
            cause,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Debug, Default, Deref, DerefMut, Resource)]
pub struct PendingBlockBreaks(Vec<BlockBreak>);

/// Names of the levels that are currently loaded
#[derive(Debug, Default, Deref, DerefMut, Resource)]
pub struct LoadedLevels(HashSet<String>);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub color: TextColor,
}

#[derive(Clone, Debug, Event)]
pub struct ChatMessage {
    pub recipient: Entity,
    pub spans: Vec<TextSpan>,
}

impl ChatMessage {
    pub fn new(recipient: Entity) -> Self {
        ChatMessage {
            recipient,
            spans: Vec::new(),
        }
    }

    pub fn colored<S: Into<String>>(recipient: Entity, text: S, color: TextColor) -> Self {
        Self::new(recipient).with(text, color)
    }

    pub fn with<S: Into<String>>(mut self, text: S, color: TextColor) -> Self {
        self.spans.push(TextSpan {
            text: text.into(),
            color,
        });
        self
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeedbackKind {
    MarkerCreated,
    MarkerRemoved,
}

/// Request for a sound/particle flourish. Purely cosmetic, hosts may ignore it.
#[derive(Clone, Debug, Event)]
pub struct Feedback {
    pub recipient: Entity,
    pub kind: FeedbackKind,
    pub at: Vec3,
}

#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("level [{0}] is not loaded")]
    LevelNotLoaded(String),
}

#[derive(Clone, Copy, Debug)]
pub enum Tile<'a> {
    Sign(&'a Sign),
    Other,
}

/// Finds tile entities by level and position.
#[allow(missing_debug_implementations)]
#[derive(SystemParam)]
pub struct TileLookup<'w, 's> {
    levels: Res<'w, LoadedLevels>,
    tiles: Query<'w, 's, (&'static TileEntity, Option<&'static Sign>)>,
}

impl<'w, 's> TileLookup<'w, 's> {
    pub fn tile_at(&self, level: &str, pos: IVec3) -> Result<Option<Tile<'_>>, LookupError> {
        if !self.levels.contains(level) {
            return Err(LookupError::LevelNotLoaded(level.to_string()));
        }
        Ok(self
            .tiles
            .iter()
            .find(|(tile, _)| tile.level() == level && tile.pos == pos)
            .map(|(_, sign)| sign.map_or(Tile::Other, Tile::Sign)))
    }
}

fn sys_apply_sign_changes(
    mut commands: Commands,
    mut res_pending: ResMut<PendingSignChanges>,
    mut q_sign: Query<&mut Sign>,
) {
    for change in res_pending.drain(..) {
        if change.is_cancelled() {
            log::debug!("Sign change on {:?} was cancelled", change.sign);
            continue;
        }
        if let Ok(mut sign) = q_sign.get_mut(change.sign) {
            sign.lines = change.lines;
        } else if let Some(mut sign_commands) = commands.get_entity(change.sign) {
            sign_commands.insert(Sign {
                lines: change.lines,
            });
        }
    }
}

fn sys_apply_block_breaks(
    mut commands: Commands,
    mut res_pending: ResMut<PendingBlockBreaks>,
    q_tiles: Query<(Entity, &TileEntity)>,
) {
    for block_break in res_pending.drain(..) {
        if block_break.is_cancelled() {
            log::debug!(
                "Break of {:?} in [{}] was cancelled",
                block_break.positions,
                block_break.level
            );
            continue;
        }
        for (entity, tile) in q_tiles.iter() {
            if tile.level() == &block_break.level && block_break.positions.contains(&tile.pos) {
                commands.entity(entity).despawn();
            }
        }
    }
}
