//! Routes each part of a heartbeat payload to its handler.

use tracing::{debug, info, warn};
use wander_types::{HeartbeatPart, HeartbeatPayload, MapObjects};

use crate::context::SessionContext;
use crate::inventory::{self, InventoryState};
use crate::session::SessionClient;

/// What the dispatcher leaves for the cycle engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatched {
    /// Every map-objects part, merged.
    pub map: MapObjects,
    /// Whether an inventory delta led to a full refresh.
    pub inventory_refreshed: bool,
    /// Kind tags of parts that were not understood.
    pub unknown: Vec<String>,
}

/// Handle every part of `payload` in server order.
pub async fn dispatch<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    payload: HeartbeatPayload,
) -> Dispatched {
    let mut out = Dispatched::default();

    for part in payload.parts {
        match part {
            HeartbeatPart::MapObjects(map) => out.map.merge(map),
            HeartbeatPart::HatchedEggs(hatched) => {
                if hatched.creature_ids.is_empty() {
                    continue;
                }
                info!(
                    highlight = true,
                    eggs = hatched.creature_ids.len(),
                    experience = hatched.experience,
                    candy = hatched.candy,
                    stardust = hatched.stardust,
                    "eggs hatched"
                );
                state.note_hatched(&hatched.creature_ids, ctx.catalog);
            }
            HeartbeatPart::BuddyCandy(buddy) => info!(
                species = %ctx.catalog.species_name(buddy.species),
                candy = buddy.candy,
                "buddy found candy"
            ),
            HeartbeatPart::InventoryDelta(delta) => {
                debug!(entries = delta.entries.len(), "inventory changed, refreshing");
                if let Err(err) = inventory::refresh(ctx, state).await {
                    warn!(error = %err, "inventory refresh after delta failed");
                    continue;
                }
                if ctx.config.triage.incubate {
                    inventory::incubate(ctx, state).await;
                }
                out.inventory_refreshed = true;
            }
            HeartbeatPart::Badges(badges) => {
                for award in &badges.awards {
                    info!(badge = %award.badge, level = award.level, "badge awarded");
                }
            }
            HeartbeatPart::PlayerProfile(profile) => {
                debug!(
                    item_storage = profile.item_storage,
                    creature_storage = profile.creature_storage,
                    team = ?profile.team,
                    "profile updated"
                );
                state.profile = profile;
            }
            HeartbeatPart::RemoteSettings(settings) => {
                debug!(hash = %settings.hash, "remote settings");
            }
            HeartbeatPart::Unknown { kind } => {
                warn!(%kind, "ignoring unknown heartbeat part");
                out.unknown.push(kind);
            }
        }
    }
    out
}
