//! The boundary to the remote service.
//!
//! Authentication, request signing, and the wire format belong to an
//! external transport. This module defines the small set of abstract
//! operations the engines consume ([`SessionClient`]), how a client is
//! obtained ([`Connector`]), and the [`Gateway`] every engine goes through.
//!
//! # Single request in flight
//!
//! The gateway holds the client behind a depth-one async mutex and keeps
//! it locked for the whole call, so at most one network operation is ever
//! outstanding. Each call is also bounded by the configured timeout; a
//! call that does not answer in time fails with
//! [`TransportError::Timeout`].

use core::future::Future;

use tokio::sync::Mutex;
use tokio::time::Duration;
use wander_types::{
    BallKind, BonusResult, CaptureResult, CatchableCreature, Coordinate, CreatureId,
    DeployResult, EncounterResult, HeartbeatPayload, IncubatorId, InventoryEntry, ItemKind,
    LandmarkId, LevelRewards, LootResult, Profile, StrongholdInfo, ThrowParameters,
};

use crate::config::Credentials;

/// Transport-level failures. All of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connectivity failure.
    #[error("network error: {0}")]
    Network(String),

    /// The service asked us to slow down.
    #[error("rate limited")]
    RateLimited,

    /// The call did not answer within the configured window.
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        /// Operation name.
        operation: &'static str,
        /// The timeout that elapsed.
        after_ms: u64,
    },

    /// Authentication was refused or the session expired.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Abstract operations of an authenticated session.
pub trait SessionClient: Send {
    /// Report the player's position.
    fn set_position(
        &mut self,
        at: Coordinate,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Request world state around the current position.
    fn heartbeat(&mut self) -> impl Future<Output = Result<HeartbeatPayload, TransportError>> + Send;

    /// Start an encounter with a catchable creature.
    fn encounter(
        &mut self,
        creature: &CatchableCreature,
    ) -> impl Future<Output = Result<EncounterResult, TransportError>> + Send;

    /// Throw one ball at an encountered creature.
    fn attempt_capture(
        &mut self,
        creature: &CatchableCreature,
        ball: BallKind,
        throw: ThrowParameters,
    ) -> impl Future<Output = Result<CaptureResult, TransportError>> + Send;

    /// Loot a landmark.
    fn loot_landmark(
        &mut self,
        landmark: &LandmarkId,
        at: Coordinate,
    ) -> impl Future<Output = Result<LootResult, TransportError>> + Send;

    /// Transfer an owned creature away.
    fn transfer_creature(
        &mut self,
        creature: CreatureId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Discard `count` items of one kind.
    fn recycle_item(
        &mut self,
        item: ItemKind,
        count: u32,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Put an egg into an incubator.
    fn use_incubator(
        &mut self,
        incubator: &IncubatorId,
        egg: CreatureId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Set or clear the favorite flag of an owned creature.
    fn set_favorite(
        &mut self,
        creature: CreatureId,
        favorite: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Fetch the player profile.
    fn fetch_profile(&mut self) -> impl Future<Output = Result<Profile, TransportError>> + Send;

    /// Fetch the rewards for reaching `level`.
    fn fetch_level_rewards(
        &mut self,
        level: u32,
    ) -> impl Future<Output = Result<LevelRewards, TransportError>> + Send;

    /// Fetch a full inventory snapshot.
    fn fetch_inventory(
        &mut self,
    ) -> impl Future<Output = Result<Vec<InventoryEntry>, TransportError>> + Send;

    /// Fetch stronghold details.
    fn fetch_stronghold(
        &mut self,
        stronghold: &LandmarkId,
        at: Coordinate,
    ) -> impl Future<Output = Result<StrongholdInfo, TransportError>> + Send;

    /// Deploy an owned creature to a stronghold.
    fn deploy_creature(
        &mut self,
        stronghold: &LandmarkId,
        creature: CreatureId,
    ) -> impl Future<Output = Result<DeployResult, TransportError>> + Send;

    /// Collect the defender bonus.
    fn collect_bonus(&mut self) -> impl Future<Output = Result<BonusResult, TransportError>> + Send;
}

/// Produces authenticated sessions.
pub trait Connector {
    /// The session type this connector yields.
    type Client: SessionClient;

    /// Log in and place the player at `start`.
    fn authenticate(
        &mut self,
        credentials: &Credentials,
        start: Coordinate,
    ) -> impl Future<Output = Result<Self::Client, TransportError>> + Send;
}

/// Serialized, time-bounded access to a [`SessionClient`].
#[derive(Debug)]
pub struct Gateway<C> {
    client: Mutex<C>,
    timeout_ms: u64,
}

impl<C: SessionClient> Gateway<C> {
    /// Wrap an authenticated client.
    pub fn new(client: C, timeout_ms: u64) -> Self {
        Self {
            client: Mutex::new(client),
            timeout_ms,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), call).await {
            Ok(result) => result,
            Err(_elapsed) => Err(TransportError::Timeout {
                operation,
                after_ms: self.timeout_ms,
            }),
        }
    }

    /// See [`SessionClient::set_position`].
    pub async fn set_position(&self, at: Coordinate) -> Result<(), TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("set_position", client.set_position(at)).await
    }

    /// See [`SessionClient::heartbeat`].
    pub async fn heartbeat(&self) -> Result<HeartbeatPayload, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("heartbeat", client.heartbeat()).await
    }

    /// See [`SessionClient::encounter`].
    pub async fn encounter(
        &self,
        creature: &CatchableCreature,
    ) -> Result<EncounterResult, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("encounter", client.encounter(creature)).await
    }

    /// See [`SessionClient::attempt_capture`].
    pub async fn attempt_capture(
        &self,
        creature: &CatchableCreature,
        ball: BallKind,
        throw: ThrowParameters,
    ) -> Result<CaptureResult, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("attempt_capture", client.attempt_capture(creature, ball, throw))
            .await
    }

    /// See [`SessionClient::loot_landmark`].
    pub async fn loot_landmark(
        &self,
        landmark: &LandmarkId,
        at: Coordinate,
    ) -> Result<LootResult, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("loot_landmark", client.loot_landmark(landmark, at))
            .await
    }

    /// See [`SessionClient::transfer_creature`].
    pub async fn transfer_creature(&self, creature: CreatureId) -> Result<(), TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("transfer_creature", client.transfer_creature(creature))
            .await
    }

    /// See [`SessionClient::recycle_item`].
    pub async fn recycle_item(&self, item: ItemKind, count: u32) -> Result<(), TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("recycle_item", client.recycle_item(item, count))
            .await
    }

    /// See [`SessionClient::use_incubator`].
    pub async fn use_incubator(
        &self,
        incubator: &IncubatorId,
        egg: CreatureId,
    ) -> Result<(), TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("use_incubator", client.use_incubator(incubator, egg))
            .await
    }

    /// See [`SessionClient::set_favorite`].
    pub async fn set_favorite(
        &self,
        creature: CreatureId,
        favorite: bool,
    ) -> Result<(), TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("set_favorite", client.set_favorite(creature, favorite))
            .await
    }

    /// See [`SessionClient::fetch_profile`].
    pub async fn fetch_profile(&self) -> Result<Profile, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("fetch_profile", client.fetch_profile()).await
    }

    /// See [`SessionClient::fetch_level_rewards`].
    pub async fn fetch_level_rewards(&self, level: u32) -> Result<LevelRewards, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("fetch_level_rewards", client.fetch_level_rewards(level))
            .await
    }

    /// See [`SessionClient::fetch_inventory`].
    pub async fn fetch_inventory(&self) -> Result<Vec<InventoryEntry>, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("fetch_inventory", client.fetch_inventory()).await
    }

    /// See [`SessionClient::fetch_stronghold`].
    pub async fn fetch_stronghold(
        &self,
        stronghold: &LandmarkId,
        at: Coordinate,
    ) -> Result<StrongholdInfo, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("fetch_stronghold", client.fetch_stronghold(stronghold, at))
            .await
    }

    /// See [`SessionClient::deploy_creature`].
    pub async fn deploy_creature(
        &self,
        stronghold: &LandmarkId,
        creature: CreatureId,
    ) -> Result<DeployResult, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("deploy_creature", client.deploy_creature(stronghold, creature))
            .await
    }

    /// See [`SessionClient::collect_bonus`].
    pub async fn collect_bonus(&self) -> Result<BonusResult, TransportError> {
        let mut client = self.client.lock().await;
        self.bounded("collect_bonus", client.collect_bonus()).await
    }
}
