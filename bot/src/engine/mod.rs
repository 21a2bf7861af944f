//! Core orchestration: the letsplay workflow, the multiplayer classifier,
//! and the picker state machine. Everything here is decoupled from Discord
//! and from the real external services through small trait seams so it can
//! be driven by test doubles.

pub mod classifier;
pub mod picker;
pub mod workflow;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::steam::{AppId, GameDetails};

/// Resolves a chat identity to a linked SteamID64.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// `None` means unknown, unlinked, or store failure — callers treat all
    /// three as "no usable identity".
    async fn steam_id_for(&self, discord_id: u64) -> Option<String>;
}

/// Read access to the game catalog: owned libraries and per-title details.
#[async_trait]
pub trait GameCatalog: Send + Sync {
    /// `Some(empty)` = private profile or no games; `None` = fetch failed.
    /// The workflow treats the two very differently.
    async fn owned_games(&self, steam_id: &str) -> Option<HashMap<AppId, String>>;

    async fn app_details(&self, appid: AppId) -> Option<GameDetails>;
}

/// One title offered to the group: display name plus optional artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCandidate {
    pub name: String,
    pub image_url: Option<String>,
}
