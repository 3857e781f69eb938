//! Supervisor-owned inventory state and the network side of triage.
//!
//! [`InventoryState`] holds the latest [`Triage`] of the inventory plus the
//! worklists that outlive a single snapshot (pending favorites, hatches
//! waiting to be identified). The async functions in this module drain the
//! triage queues through the gateway, one paced call at a time.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};
use wander_inventory::{LevelUp, Triage, TriageRules, assign_incubators, triage};
use wander_types::{CreatureId, InventoryEntry, LandmarkId, PERFECT_SCORE, Profile};

use crate::catalog::Catalog;
use crate::context::{SessionContext, pause};
use crate::session::{SessionClient, TransportError};

/// Refreshes a hatch may stay unidentified before it is dropped.
const MAX_HATCH_MISSES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingHatch {
    id: CreatureId,
    misses: u8,
}

/// Inventory knowledge carried across cycles and sessions.
#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    /// Classified view of the latest snapshot.
    pub triage: Triage,
    /// Latest player profile.
    pub profile: Profile,
    favorites: Vec<CreatureId>,
    favorited: BTreeSet<CreatureId>,
    pending_hatches: Vec<PendingHatch>,
}

impl InventoryState {
    /// Empty state; the first refresh fills it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trainer level from the latest snapshot, 0 before the first one.
    pub fn level(&self) -> u32 {
        self.triage.stats.as_ref().map_or(0, |stats| stats.level)
    }

    /// Queue a creature for the favorite operation. Returns `false` if it
    /// is already queued or already favorited.
    pub fn queue_favorite(&mut self, id: CreatureId) -> bool {
        if self.favorited.contains(&id) || self.favorites.contains(&id) {
            return false;
        }
        self.favorites.push(id);
        true
    }

    /// Creatures waiting for the favorite operation.
    pub fn favorite_queue(&self) -> &[CreatureId] {
        &self.favorites
    }

    /// Hatched creatures not yet seen in a snapshot.
    pub fn pending_hatches(&self) -> Vec<CreatureId> {
        self.pending_hatches.iter().map(|hatch| hatch.id).collect()
    }

    /// Replace the triage with a new snapshot. Returns the level increase,
    /// if any.
    pub fn apply(
        &mut self,
        entries: &[InventoryEntry],
        rules: &TriageRules,
        catalog: &dyn Catalog,
    ) -> Option<LevelUp> {
        let mut next = triage(entries, rules, self.triage.stats.as_ref());
        if next.stats.is_none() {
            next.stats = self.triage.stats.take();
        }
        self.triage = next;

        self.favorited.retain(|id| self.triage.creature(*id).is_some());
        for creature in &self.triage.creatures {
            if creature.favorite {
                self.favorited.insert(creature.id);
            }
        }
        self.favorites.retain(|id| !self.favorited.contains(id));
        for id in self.triage.favorite.clone() {
            self.queue_favorite(id);
        }

        self.resolve_hatches(catalog);
        self.triage.level_up
    }

    /// Record hatch notifications, identifying what the current snapshot
    /// already knows and queueing the rest for the next refresh.
    pub fn note_hatched(&mut self, ids: &[CreatureId], catalog: &dyn Catalog) {
        for id in ids {
            if !self.announce_hatch(*id, catalog) {
                self.pending_hatches.push(PendingHatch {
                    id: *id,
                    misses: 0,
                });
            }
        }
    }

    fn resolve_hatches(&mut self, catalog: &dyn Catalog) {
        let pending = core::mem::take(&mut self.pending_hatches);
        for mut hatch in pending {
            if self.announce_hatch(hatch.id, catalog) {
                continue;
            }
            hatch.misses = hatch.misses.saturating_add(1);
            if hatch.misses >= MAX_HATCH_MISSES {
                warn!(creature = %hatch.id, "hatched creature never appeared in inventory");
            } else {
                self.pending_hatches.push(hatch);
            }
        }
    }

    fn announce_hatch(&self, id: CreatureId, catalog: &dyn Catalog) -> bool {
        let Some(creature) = self.triage.creature(id) else {
            return false;
        };
        info!(
            highlight = true,
            creature = %id,
            species = %catalog.species_name(creature.species),
            score = creature.score(),
            cp = creature.cp,
            "egg hatched"
        );
        true
    }

    /// Drop a transferred creature from the local view.
    pub fn forget_creature(&mut self, id: CreatureId) {
        let before = self.triage.creatures.len();
        self.triage.creatures.retain(|c| c.id != id);
        if self.triage.creatures.len() < before {
            self.triage.creature_total = self.triage.creature_total.saturating_sub(1);
        }
        self.triage.disposal.retain(|d| *d != id);
    }

    /// Record a successful deployment in the local view.
    pub fn mark_deployed(&mut self, id: CreatureId, stronghold: &LandmarkId) {
        for creature in &mut self.triage.creatures {
            if creature.id == id {
                creature.deployed_at = Some(stronghold.clone());
            }
        }
        for creature in self.triage.best.values_mut() {
            if creature.id == id {
                creature.deployed_at = Some(stronghold.clone());
            }
        }
    }

    /// Whether any owned creature currently defends a stronghold.
    pub fn has_deployed(&self) -> bool {
        self.triage
            .creatures
            .iter()
            .any(|c| c.deployed_at.is_some())
    }

    /// Log storage usage against the profile limits.
    pub fn log_summary(&self, catalog: &dyn Catalog) {
        info!(
            items = self.triage.item_total,
            item_storage = self.profile.item_storage,
            "{} / {} items",
            self.triage.item_total,
            self.profile.item_storage
        );
        info!(
            creatures = self.triage.creature_total,
            creature_storage = self.profile.creature_storage,
            balls = self.triage.balls.total(),
            "{} / {} creatures",
            self.triage.creature_total,
            self.profile.creature_storage
        );
        for creature in self.triage.best.values() {
            debug!(
                species = %catalog.species_name(creature.species),
                score = creature.score(),
                perfect = creature.score() == PERFECT_SCORE,
                favorite = creature.favorite,
                cp = creature.cp,
                "best of species"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Network side
// ---------------------------------------------------------------------------

/// Fetch a full snapshot and absorb it.
pub async fn refresh<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) -> Result<(), TransportError> {
    let entries = ctx.gateway.fetch_inventory().await?;
    absorb(ctx, state, &entries).await;
    Ok(())
}

/// Triage a snapshot already in hand and surface any level-up rewards.
pub async fn absorb<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    entries: &[InventoryEntry],
) {
    let rules = ctx.config.triage_rules();
    if let Some(level_up) = state.apply(entries, &rules, ctx.catalog) {
        info!(highlight = true, from = level_up.from, to = level_up.to, "level up");
        match ctx.gateway.fetch_level_rewards(level_up.to).await {
            Ok(rewards) => {
                for stack in &rewards.items {
                    info!(
                        outcome = "success",
                        item = %ctx.catalog.item_name(stack.item),
                        count = stack.count,
                        "level reward"
                    );
                }
                for item in &rewards.unlocked {
                    info!(item = %ctx.catalog.item_name(*item), "unlocked");
                }
            }
            Err(err) => warn!(error = %err, level = level_up.to, "failed to fetch level rewards"),
        }
    }
    state.log_summary(ctx.catalog);
}

/// Recycle surplus items. Returns how many items were discarded.
pub async fn recycle_trash<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) -> u32 {
    let trash = core::mem::take(&mut state.triage.trash);
    let mut recycled: u32 = 0;
    for (position, stack) in trash.iter().enumerate() {
        if position > 0 {
            pause(ctx.config.pacing.call_wait()).await;
        }
        match ctx.gateway.recycle_item(stack.item, stack.count).await {
            Ok(()) => {
                recycled = recycled.saturating_add(stack.count);
                state.triage.item_total = state.triage.item_total.saturating_sub(stack.count);
                info!(
                    outcome = "success",
                    item = %ctx.catalog.item_name(stack.item),
                    count = stack.count,
                    "recycled {}x {}",
                    stack.count,
                    ctx.catalog.item_name(stack.item)
                );
            }
            Err(err) => warn!(error = %err, item = ?stack.item, "recycle failed"),
        }
    }
    recycled
}

/// Transfer every creature on the disposal list. Returns how many left.
pub async fn dispose<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) -> u32 {
    let disposal = state.triage.disposal.clone();
    let mut freed: u32 = 0;
    for (position, id) in disposal.into_iter().enumerate() {
        if position > 0 {
            pause(ctx.config.pacing.call_wait()).await;
        }
        let species = state
            .triage
            .creature(id)
            .map(|c| ctx.catalog.species_name(c.species));
        match ctx.gateway.transfer_creature(id).await {
            Ok(()) => {
                freed = freed.saturating_add(1);
                state.forget_creature(id);
                info!(outcome = "success", creature = %id, species = ?species, "transferred");
            }
            Err(err) => warn!(error = %err, creature = %id, "transfer failed"),
        }
    }
    freed
}

/// Mark every queued creature as favorite.
pub async fn drain_favorites<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) {
    let queue = core::mem::take(&mut state.favorites);
    for (position, id) in queue.into_iter().enumerate() {
        if position > 0 {
            pause(ctx.config.pacing.call_wait()).await;
        }
        match ctx.gateway.set_favorite(id, true).await {
            Ok(()) => {
                state.favorited.insert(id);
                for creature in &mut state.triage.creatures {
                    if creature.id == id {
                        creature.favorite = true;
                    }
                }
                info!(highlight = true, creature = %id, "marked perfect creature as favorite");
            }
            Err(err) => {
                warn!(error = %err, creature = %id, "favorite failed, will retry");
                state.favorites.push(id);
            }
        }
    }
}

/// Put waiting eggs into free incubators, shortest eggs first.
pub async fn incubate<C: SessionClient>(ctx: SessionContext<'_, C>, state: &mut InventoryState) {
    let pairs = assign_incubators(&state.triage.eggs, &state.triage.incubators);
    for (position, (incubator, egg)) in pairs.into_iter().enumerate() {
        if position > 0 {
            pause(ctx.config.pacing.call_wait()).await;
        }
        match ctx.gateway.use_incubator(&incubator, egg).await {
            Ok(()) => {
                for slot in &mut state.triage.incubators {
                    if slot.id == incubator {
                        slot.egg = Some(egg);
                    }
                }
                for waiting in &mut state.triage.eggs {
                    if waiting.id == egg {
                        waiting.incubator = Some(incubator.clone());
                    }
                }
                info!(outcome = "success", %incubator, egg = %egg, "egg incubating");
            }
            Err(err) => warn!(error = %err, %incubator, "incubator use failed"),
        }
    }
}

/// Run every triage drain: trash, disposal, favorites, and incubation.
pub async fn housekeeping<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) {
    recycle_trash(ctx, state).await;
    dispose(ctx, state).await;
    drain_favorites(ctx, state).await;
    if ctx.config.triage.incubate {
        incubate(ctx, state).await;
    }
}

/// Try to make room in creature storage: refresh, then transfer surplus.
/// Returns `true` if at least one creature was transferred.
pub async fn free_space<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
) -> bool {
    if !ctx.config.triage_rules().scrap {
        warn!("creature storage full and scrapping is disabled");
        return false;
    }
    if let Err(err) = refresh(ctx, state).await {
        warn!(error = %err, "inventory refresh failed while freeing space");
        return false;
    }
    dispose(ctx, state).await > 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wander_types::{ItemKind, ItemStack, OwnedCreature, PlayerStats, SpeciesId};

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::config::BotConfig;
    use crate::session::Gateway;
    use crate::testing::{Call, ScriptedClient};

    fn creature(id: u64, ivs: u8, favorite: bool) -> OwnedCreature {
        OwnedCreature {
            id: CreatureId(id),
            species: SpeciesId(1),
            attack: ivs,
            defense: ivs,
            stamina: ivs,
            cp: 100,
            stamina_current: 10,
            stamina_max: 10,
            favorite,
            deployed_at: None,
        }
    }

    #[test]
    fn favorites_are_queued_once() {
        let mut state = InventoryState::new();
        let catalog = StaticCatalog::default();
        let entries = vec![InventoryEntry::Creature(creature(7, 15, false))];
        state.apply(&entries, &TriageRules::default(), &catalog);
        assert_eq!(state.favorite_queue(), &[CreatureId(7)]);
        assert!(!state.queue_favorite(CreatureId(7)));
        state.apply(&entries, &TriageRules::default(), &catalog);
        assert_eq!(state.favorite_queue(), &[CreatureId(7)]);
    }

    #[test]
    fn departed_creatures_leave_the_favorited_set() {
        let mut state = InventoryState::new();
        let catalog = StaticCatalog::default();
        let rules = TriageRules::default();
        state.apply(&[InventoryEntry::Creature(creature(7, 10, true))], &rules, &catalog);
        assert!(state.favorited.contains(&CreatureId(7)));

        state.apply(&[InventoryEntry::Creature(creature(8, 10, false))], &rules, &catalog);
        assert!(!state.favorited.contains(&CreatureId(7)));
        assert_eq!(state.favorited.len(), 0);
    }

    #[test]
    fn stats_survive_a_snapshot_without_them() {
        let mut state = InventoryState::new();
        let catalog = StaticCatalog::default();
        let stats = PlayerStats {
            level: 9,
            experience: 1,
            km_walked: 0.0,
        };
        state.apply(&[InventoryEntry::Stats(stats)], &TriageRules::default(), &catalog);
        state.apply(&[], &TriageRules::default(), &catalog);
        assert_eq!(state.level(), 9);
    }

    #[test]
    fn unknown_hatches_wait_then_drop() {
        let mut state = InventoryState::new();
        let catalog = StaticCatalog::default();
        state.note_hatched(&[CreatureId(3), CreatureId(4)], &catalog);
        assert_eq!(state.pending_hatches(), vec![CreatureId(3), CreatureId(4)]);

        let snapshot = vec![InventoryEntry::Creature(creature(3, 5, false))];
        state.apply(&snapshot, &TriageRules::default(), &catalog);
        assert_eq!(state.pending_hatches(), vec![CreatureId(4)]);

        state.apply(&snapshot, &TriageRules::default(), &catalog);
        assert!(state.pending_hatches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn housekeeping_drains_every_queue() {
        let client = ScriptedClient::default();
        let log = client.clone();
        let gateway = Gateway::new(client, 1_000);
        let mut config = BotConfig::default();
        config.account.allow_scrap = true;
        config.triage.scrap = true;
        config.triage.trash = vec![wander_inventory::TrashRule {
            item: ItemKind::Potion,
            keep: 2,
        }];
        let catalog = StaticCatalog::default();
        let ctx = SessionContext {
            gateway: &gateway,
            config: &config,
            catalog: &catalog,
        };

        let entries = vec![
            InventoryEntry::Item(ItemStack {
                item: ItemKind::Potion,
                count: 5,
            }),
            InventoryEntry::Creature(creature(1, 15, false)),
            InventoryEntry::Creature(creature(2, 3, false)),
        ];
        let mut state = InventoryState::new();
        absorb(ctx, &mut state, &entries).await;
        housekeeping(ctx, &mut state).await;

        let calls = log.calls();
        assert!(calls.contains(&Call::Recycle(ItemKind::Potion, 3)));
        assert!(calls.contains(&Call::Transfer(CreatureId(2))));
        assert!(calls.contains(&Call::Favorite(CreatureId(1), true)));
        assert!(state.favorite_queue().is_empty());
        assert!(state.triage.creature(CreatureId(2)).is_none());
    }
}
