use crate::host::{FeedbackKind, SignChange, TextColor};
use crate::marker_api::NewMarker;
use crate::prelude::*;

/// Offset from a block corner to its centre, where feedback is played
const BLOCK_CENTER: Vec3 = Vec3::splat(0.5);

pub(crate) fn sys_handle_sign_changes(
    mut res_pending: ResMut<PendingSignChanges>,
    res_registry: Res<MarkerTypeRegistry>,
    res_settings: Res<DmsmSettings>,
    mut res_service: ResMut<MarkerService>,
    q_tile: Query<&TileEntity>,
    q_player: Query<(&Player, Option<&Permissions>)>,
    mut evw_chat: EventWriter<ChatMessage>,
    mut evw_feedback: EventWriter<Feedback>,
) {
    for change in res_pending.iter_mut() {
        // Only players make markers
        let Some((actor, (player, permissions))) = change
            .cause
            .and_then(|cause| Some((cause, q_player.get(cause).ok()?)))
        else {
            continue;
        };
        let Some(marker_type) = res_registry.by_keyword(change.first_line()) else {
            continue;
        };

        let permission = res_settings.permission_for(marker_type.id());
        if !permissions.is_some_and(|permissions| permissions.grants(&permission)) {
            evw_chat.send(ChatMessage::colored(
                actor,
                "You do not have permission to create sign markers of that kind",
                TextColor::Red,
            ));
            log::info!(
                "Unauthorized player {} attempted to create a sign marker of type {}",
                player.name(),
                marker_type.id()
            );
            change.cancel();
            continue;
        }

        let Ok(tile) = q_tile.get(change.sign) else {
            log::warn!(
                "Sign {:?} edited by {} has no position, ignoring it",
                change.sign,
                player.name()
            );
            continue;
        };
        let new_marker = NewMarker {
            description: description(change),
            location: MarkerLocation::from_block(tile.level().as_str(), tile.pos),
            icon: marker_type.icon().clone(),
            persistent: res_settings.persistent_markers(),
        };

        match res_service
            .api_mut()
            .create_marker(marker_type.id(), new_marker)
        {
            Some(marker) => {
                evw_chat.send(
                    ChatMessage::new(actor)
                        .with(marker_type.label().as_str(), TextColor::Aqua)
                        .with(" sign marker created", TextColor::Green),
                );
                log::info!(
                    "{} created a {} sign marker {} at {} in [{}]",
                    player.name(),
                    marker_type.label(),
                    marker.id().as_str(),
                    tile.pos,
                    tile.level()
                );
                restyle(change);
                evw_feedback.send(Feedback {
                    recipient: actor,
                    kind: FeedbackKind::MarkerCreated,
                    at: tile.pos.as_vec3() + BLOCK_CENTER,
                });
            },
            None => {
                evw_chat.send(ChatMessage::colored(
                    actor,
                    "Could not create a sign marker",
                    TextColor::Red,
                ));
                log::error!(
                    "{} ran into an error creating a {} sign marker at {}",
                    player.name(),
                    marker_type.label(),
                    tile.pos
                );
            },
        }
    }
}

pub(crate) fn sys_handle_block_breaks(
    mut res_pending: ResMut<PendingBlockBreaks>,
    res_registry: Res<MarkerTypeRegistry>,
    res_settings: Res<DmsmSettings>,
    mut res_service: ResMut<MarkerService>,
    q_player: Query<(&Player, Option<&Permissions>)>,
    mut evw_chat: EventWriter<ChatMessage>,
    mut evw_feedback: EventWriter<Feedback>,
) {
    for block_break in res_pending.iter_mut() {
        let actor = block_break
            .cause
            .and_then(|cause| Some((cause, q_player.get(cause).ok()?)));
        for pos in block_break.positions.clone() {
            for marker_type in res_registry.iter() {
                let markers: Vec<_> = res_service
                    .api()
                    .markers(marker_type.id())
                    .into_iter()
                    .filter(|marker| marker.location().is_block(&block_break.level, pos))
                    .collect();
                for marker in markers {
                    let Some((entity, (player, permissions))) = actor else {
                        log::info!(
                            "{} sign marker at {} in [{}] avoided destruction",
                            marker_type.label(),
                            pos,
                            block_break.level
                        );
                        block_break.cancel();
                        continue;
                    };
                    let permission = res_settings.permission_for(marker_type.id());
                    if !permissions.is_some_and(|permissions| permissions.grants(&permission)) {
                        evw_chat.send(ChatMessage::colored(
                            entity,
                            format!(
                                "You do not have permission to remove {} sign markers",
                                marker_type.label()
                            ),
                            TextColor::Red,
                        ));
                        log::info!(
                            "Unauthorized player {} attempted to remove a marker at {} in [{}]",
                            player.name(),
                            pos,
                            block_break.level
                        );
                        block_break.cancel();
                        continue;
                    }

                    if !res_service
                        .api_mut()
                        .delete_marker(marker_type.id(), marker.id())
                    {
                        log::warn!(
                            "Marker {} was already gone when {} broke its block",
                            marker.id().as_str(),
                            player.name()
                        );
                        continue;
                    }
                    evw_chat.send(ChatMessage::colored(
                        entity,
                        "Successfully removed sign marker",
                        TextColor::Green,
                    ));
                    log::info!(
                        "Player {} removed a {} sign marker at {} in [{}]",
                        player.name(),
                        marker_type.label(),
                        pos,
                        block_break.level
                    );
                    evw_feedback.send(Feedback {
                        recipient: entity,
                        kind: FeedbackKind::MarkerRemoved,
                        at: pos.as_vec3(),
                    });
                }
            }
        }
    }
}

/// Every line after the keyword, joined with spaces
fn description(change: &SignChange) -> String {
    change
        .lines
        .iter()
        .skip(1)
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Marks a sign as live on the map
fn restyle(change: &mut SignChange) {
    for line in change.lines.iter_mut() {
        line.bold = true;
        line.color = Some(TextColor::DarkRed);
    }
}
