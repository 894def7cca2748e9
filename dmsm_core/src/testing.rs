//! A tiny headless game host for exercising the plugin end to end.

use std::time::Duration;

use bevy::app::Last;
use tempfile::TempDir;

use crate::host::{BlockBreak, HostPlugin, SignChange};
use crate::marker_api::{InMemoryMarkerApi, Marker, NewMarker};
use crate::prelude::*;
use crate::sweep::{RequestSweep, SweepReport};
use crate::DmsmPlugin;

const TEST_CONFIG: &str = r#"
[plot]
keyword = "[plot]"
id = "plots"
label = "Plots"
icon = "house"

[shop]
keyword = "[shop]"
id = "shops"
label = "Shops"
icon = "coins"
"#;

#[derive(Debug, Default, Resource)]
struct ChatLog(Vec<(Entity, String)>);

#[derive(Debug, Default, Resource)]
struct FeedbackLog(Vec<Feedback>);

#[derive(Debug, Default, Resource)]
struct SweepLog(Vec<SweepReport>);

fn sys_record_outputs(
    mut evr_chat: EventReader<ChatMessage>,
    mut evr_feedback: EventReader<Feedback>,
    mut evr_sweep: EventReader<SweepReport>,
    mut res_chat: ResMut<ChatLog>,
    mut res_feedback: ResMut<FeedbackLog>,
    mut res_sweep: ResMut<SweepLog>,
) {
    res_chat
        .0
        .extend(evr_chat.read().map(|msg| (msg.recipient, msg.plain_text())));
    res_feedback.0.extend(evr_feedback.read().cloned());
    res_sweep.0.extend(evr_sweep.read().copied());
}

#[derive(Debug)]
pub struct TestServer {
    pub app: App,
    _config_dir: TempDir,
}

impl TestServer {
    /// Server whose marker service is ready and whose registry is built
    pub fn new() -> Self {
        Self::with_api(InMemoryMarkerApi::with_default_icons())
    }

    pub fn with_api(api: InMemoryMarkerApi) -> Self {
        let mut server = Self::without_service();
        server.insert_service(api);
        server.app.update();
        server
    }

    /// Server where the marker service hasn't shown up yet. Nothing is updated.
    pub fn without_service() -> Self {
        let config_dir = tempfile::tempdir().expect("temp dir should be creatable");
        let config_path = config_dir.path().join("dmsm.toml");
        std::fs::write(&config_path, TEST_CONFIG).expect("test config should be writable");

        let mut app = App::new();
        app.insert_resource(DmsmSettings::default().with_config_path(config_path))
            .init_resource::<ChatLog>()
            .init_resource::<FeedbackLog>()
            .init_resource::<SweepLog>()
            .add_plugins((HostPlugin, DmsmPlugin))
            .add_systems(Last, sys_record_outputs);
        app.world_mut()
            .resource_mut::<LoadedLevels>()
            .insert("world".to_string());
        TestServer {
            app,
            _config_dir: config_dir,
        }
    }

    pub fn insert_service(&mut self, api: InMemoryMarkerApi) {
        self.app.insert_resource(MarkerService::new(api));
    }

    pub fn spawn_player(&mut self, name: &str, permissions: &[&str]) -> Entity {
        self.app
            .world_mut()
            .spawn((
                Player::new(name),
                permissions.iter().copied().collect::<Permissions>(),
            ))
            .id()
    }

    /// Spawns a sign tile, loading its level if needed
    pub fn spawn_sign(&mut self, level: &str, pos: IVec3, text: &[&str]) -> Entity {
        self.app
            .world_mut()
            .resource_mut::<LoadedLevels>()
            .insert(level.to_string());
        self.app
            .world_mut()
            .spawn((TileEntity::new(level, pos), Sign::from_text(text)))
            .id()
    }

    /// Queues an edit as the host would, to be handled on the next update
    pub fn edit_sign(&mut self, sign: Entity, cause: Option<Entity>, text: &[&str]) {
        let lines = Sign::from_text(text).lines;
        self.app
            .world_mut()
            .resource_mut::<PendingSignChanges>()
            .push(SignChange::new(sign, cause, lines));
    }

    pub fn break_blocks(&mut self, level: &str, positions: &[IVec3], cause: Option<Entity>) {
        self.app
            .world_mut()
            .resource_mut::<PendingBlockBreaks>()
            .push(BlockBreak::new(level, positions.to_vec(), cause));
    }

    pub fn sign_text(&self, sign: Entity) -> Vec<String> {
        self.app
            .world()
            .get::<Sign>(sign)
            .map(|sign| sign.lines.iter().map(|line| line.text.clone()).collect())
            .unwrap_or_default()
    }

    /// Creates a marker straight through the service, bypassing any sign
    pub fn create_marker(&mut self, set_id: &str, level: &str, pos: IVec3) -> Marker {
        self.app
            .world_mut()
            .resource_mut::<MarkerService>()
            .api_mut()
            .create_marker(
                set_id,
                NewMarker {
                    description: String::new(),
                    location: MarkerLocation::from_block(level, pos),
                    icon: None,
                    persistent: false,
                },
            )
            .expect("marker set should exist")
    }

    pub fn markers(&self, set_id: &str) -> Vec<Marker> {
        self.app
            .world()
            .resource::<MarkerService>()
            .api()
            .markers(set_id)
    }

    pub fn request_sweep(&mut self) {
        self.app.world_mut().send_event(RequestSweep);
    }

    /// Runs one update with `delta` of game time passing
    pub fn advance(&mut self, delta: Duration) {
        self.app.world_mut().resource_mut::<Time>().advance_by(delta);
        self.app.update();
        self.app
            .world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::ZERO);
    }

    /// Every chat message sent so far, as recipient and plain text
    pub fn chat_log(&self) -> Vec<(Entity, String)> {
        self.app.world().resource::<ChatLog>().0.clone()
    }

    pub fn feedback_log(&self) -> Vec<Feedback> {
        self.app.world().resource::<FeedbackLog>().0.clone()
    }

    /// Sweep reports since the last call
    pub fn take_sweep_reports(&mut self) -> Vec<SweepReport> {
        std::mem::take(&mut self.app.world_mut().resource_mut::<SweepLog>().0)
    }
}
