//! Client for the two Steam endpoints the bot consumes: the Web API's
//! owned-games listing and the storefront's per-title details.

pub mod ids;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::engine::GameCatalog;

/// Steam application id.
pub type AppId = u32;

const WEB_API_BASE_URL: &str = "https://api.steampowered.com";
const STORE_API_BASE_URL: &str = "https://store.steampowered.com";

/// Minimum spacing between consecutive storefront calls. The storefront has
/// undocumented rate limits and starts rejecting callers that hammer it.
pub const STORE_API_COOLDOWN: Duration = Duration::from_millis(250);

/// Hard ceiling on any single request so a stalled upstream cannot hang a
/// command forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-title storefront details, reduced to the fields the bot uses.
#[derive(Debug, Clone, Deserialize)]
pub struct GameDetails {
    pub name: String,
    pub header_image: Option<String>,
    #[serde(default)]
    pub categories: Vec<StoreCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreCategory {
    pub description: String,
}

#[derive(Deserialize)]
struct OwnedGamesEnvelope {
    response: OwnedGamesResponse,
}

/// A response without a games array means a private profile or an empty
/// library; the Web API does not distinguish the two.
#[derive(Deserialize, Default)]
#[serde(default)]
struct OwnedGamesResponse {
    games: Option<Vec<OwnedGame>>,
}

#[derive(Deserialize)]
struct OwnedGame {
    appid: AppId,
    name: String,
}

#[derive(Deserialize)]
struct AppDetailsEntry {
    success: bool,
    data: Option<GameDetails>,
}

/// Client for the Steam Web API and storefront API. Storefront calls go
/// through a shared cooldown gate so concurrent callers cannot exceed the
/// tolerated request rate.
pub struct SteamClient {
    http: reqwest::Client,
    api_key: String,
    last_store_call: Mutex<Option<Instant>>,
}

impl SteamClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build Steam HTTP client")?;
        Ok(Self {
            http,
            api_key,
            last_store_call: Mutex::new(None),
        })
    }

    /// Fetch the owned-game set for a SteamID64.
    ///
    /// Returns `Some(empty)` when the call succeeds but the profile is
    /// private or owns no games, and `None` when the call itself failed.
    /// Callers rely on that distinction to report players correctly.
    pub async fn owned_games(&self, steam_id: &str) -> Option<HashMap<AppId, String>> {
        let url = format!("{WEB_API_BASE_URL}/IPlayerService/GetOwnedGames/v1/");
        let result = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("steamid", steam_id),
                ("include_appinfo", "1"),
                ("format", "json"),
            ])
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, steam_id, "owned-games request failed");
                return None;
            }
        };

        // Capture the status before consuming the response.
        let status = resp.status();
        if !status.is_success() {
            match status.as_u16() {
                401 => warn!(steam_id, "owned-games returned 401, check the Steam API key"),
                403 => warn!(
                    steam_id,
                    "owned-games returned 403, profile may be private or the key restricted"
                ),
                _ => warn!(%status, steam_id, "owned-games returned an error status"),
            }
            return None;
        }

        match resp.json::<OwnedGamesEnvelope>().await {
            Ok(envelope) => Some(collect_owned_games(envelope)),
            Err(e) => {
                warn!(error = %e, steam_id, "failed to decode owned-games response");
                None
            }
        }
    }

    /// Fetch storefront details for one title, spacing calls by
    /// [`STORE_API_COOLDOWN`]. Returns `None` on any failure.
    pub async fn app_details(&self, appid: AppId) -> Option<GameDetails> {
        self.wait_for_store_cooldown().await;

        let url = format!("{STORE_API_BASE_URL}/api/appdetails");
        let resp = match self
            .http
            .get(&url)
            .query(&[("appids", appid.to_string())])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, appid, "app-details request failed");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, appid, "app-details returned an error status");
            return None;
        }

        match resp.json::<serde_json::Value>().await {
            Ok(body) => parse_app_details(appid, &body),
            Err(e) => {
                warn!(error = %e, appid, "failed to decode app-details response");
                None
            }
        }
    }

    /// Single-slot gate: the lock is held across the sleep, so concurrent
    /// callers queue up and every storefront call is spaced from the one
    /// before it.
    async fn wait_for_store_cooldown(&self) {
        let mut last = self.last_store_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < STORE_API_COOLDOWN {
                tokio::time::sleep(STORE_API_COOLDOWN - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl GameCatalog for SteamClient {
    async fn owned_games(&self, steam_id: &str) -> Option<HashMap<AppId, String>> {
        SteamClient::owned_games(self, steam_id).await
    }

    async fn app_details(&self, appid: AppId) -> Option<GameDetails> {
        SteamClient::app_details(self, appid).await
    }
}

/// Flatten the owned-games envelope into an appid → name map.
fn collect_owned_games(envelope: OwnedGamesEnvelope) -> HashMap<AppId, String> {
    envelope
        .response
        .games
        .unwrap_or_default()
        .into_iter()
        .map(|g| (g.appid, g.name))
        .collect()
}

/// Extract the details payload for `appid` from the storefront envelope.
/// The storefront keys the result by the stringified appid and flags
/// failures with `"success": false` instead of an error status.
fn parse_app_details(appid: AppId, body: &serde_json::Value) -> Option<GameDetails> {
    let entry = body.get(appid.to_string())?;
    let entry: AppDetailsEntry = serde_json::from_value(entry.clone()).ok()?;
    if !entry.success {
        return None;
    }
    entry.data
}
