//! Google Sheets roster store.
//!
//! The roster sheet has three positional columns: A = username, B = Discord
//! ID, C = SteamID64 (empty while unlinked). Row 1 is the header row. Rows
//! are pre-provisioned when a member joins the server; linking only ever
//! writes into an existing row.

pub mod auth;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::engine::IdentityStore;
use auth::{AccessToken, ServiceAccountKey, fetch_access_token};

const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One member row from the roster sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub username: String,
    pub discord_id: String,
    /// `None` when column C is missing or empty.
    pub steam_id: Option<String>,
}

/// Outcome of pre-provisioning a member row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    /// The member already had a row. A skip, not an error.
    AlreadyPresent,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Roster store backed by a Google Sheet. The access token is minted
/// lazily on first use and cached until it goes stale; the store instance
/// owns that state, nothing lives in module globals.
pub struct SheetsStore {
    http: reqwest::Client,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    worksheet_name: String,
    token: Mutex<Option<AccessToken>>,
}

impl SheetsStore {
    pub fn new(
        key: ServiceAccountKey,
        spreadsheet_id: String,
        worksheet_name: String,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build Sheets HTTP client")?;
        Ok(Self {
            http,
            key,
            spreadsheet_id,
            worksheet_name,
            token: Mutex::new(None),
        })
    }

    /// Resolve a member's linked SteamID64. Returns `None` for unknown
    /// members, unlinked members, and any store failure — resolution is
    /// deliberately silent so one bad lookup never aborts a whole workflow.
    pub async fn steam_id_for(&self, discord_id: u64) -> Option<String> {
        match self.read_rows().await {
            Ok(rows) => {
                let row_index = find_member_row(&rows, discord_id)?;
                rows[row_index].get(2).filter(|s| !s.is_empty()).cloned()
            }
            Err(e) => {
                warn!(error = %e, discord_id, "failed to read roster sheet");
                None
            }
        }
    }

    /// Write a SteamID64 into the member's pre-provisioned row. Members
    /// without a row get an error; rows are only created by
    /// [`SheetsStore::register_member`] when someone joins the server.
    pub async fn link_steam_id(&self, discord_id: u64, steam_id: &str) -> Result<(), String> {
        let rows = self.read_rows().await.map_err(|e| {
            warn!(error = %e, discord_id, "failed to read roster sheet for linking");
            "could not reach the roster sheet".to_string()
        })?;

        let Some(row_index) = find_member_row(&rows, discord_id) else {
            return Err("you are not in the roster sheet yet".to_string());
        };

        // Sheet rows are 1-based.
        let range = format!("{}!C{}", self.worksheet_name, row_index + 1);
        self.write_values(&range, json!({ "values": [[steam_id]] }))
            .await
            .map_err(|e| {
                warn!(error = %e, discord_id, "failed to write SteamID to roster sheet");
                "could not write to the roster sheet".to_string()
            })
    }

    /// Idempotently pre-provision a roster row for a member.
    pub async fn register_member(
        &self,
        username: &str,
        discord_id: u64,
    ) -> Result<RegisterOutcome, String> {
        let rows = self.read_rows().await.map_err(|e| {
            warn!(error = %e, discord_id, "failed to read roster sheet for registration");
            "could not reach the roster sheet".to_string()
        })?;

        if find_member_row(&rows, discord_id).is_some() {
            return Ok(RegisterOutcome::AlreadyPresent);
        }

        self.append_row(&[username.to_string(), discord_id.to_string(), String::new()])
            .await
            .map_err(|e| {
                warn!(error = %e, discord_id, "failed to append roster row");
                "could not write to the roster sheet".to_string()
            })?;
        Ok(RegisterOutcome::Added)
    }

    /// Best-effort dump of every member row. Returns an empty vec on any
    /// failure; the diagnostics command treats that the same as an empty
    /// sheet.
    pub async fn all_members(&self) -> Vec<MemberRow> {
        match self.read_rows().await {
            Ok(rows) => parse_member_rows(&rows),
            Err(e) => {
                warn!(error = %e, "failed to read roster sheet");
                Vec::new()
            }
        }
    }

    // ── HTTP plumbing ──────────────────────────────────────────────

    /// Return a usable bearer token, minting one lazily on first use and
    /// re-minting once the cached token has gone stale.
    async fn bearer(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && !token.is_expired()
        {
            return Ok(token.token.clone());
        }
        let token = fetch_access_token(&self.http, &self.key).await?;
        info!("minted Google Sheets access token");
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let token = self.bearer().await?;
        let url = format!(
            "{SHEETS_API_BASE_URL}/{}/values/{}!A:C",
            self.spreadsheet_id, self.worksheet_name
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .context("sheet read request failed")?
            .error_for_status()
            .context("sheet read rejected")?;
        let range: ValueRange = resp.json().await.context("failed to decode sheet values")?;
        Ok(range.values)
    }

    async fn write_values(&self, range: &str, body: serde_json::Value) -> Result<()> {
        let token = self.bearer().await?;
        let url = format!(
            "{SHEETS_API_BASE_URL}/{}/values/{}",
            self.spreadsheet_id, range
        );
        self.http
            .put(&url)
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .context("sheet write request failed")?
            .error_for_status()
            .context("sheet write rejected")?;
        Ok(())
    }

    async fn append_row(&self, row: &[String]) -> Result<()> {
        let token = self.bearer().await?;
        let url = format!(
            "{SHEETS_API_BASE_URL}/{}/values/{}!A:C:append",
            self.spreadsheet_id, self.worksheet_name
        );
        self.http
            .post(&url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .context("sheet append request failed")?
            .error_for_status()
            .context("sheet append rejected")?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SheetsStore {
    async fn steam_id_for(&self, discord_id: u64) -> Option<String> {
        SheetsStore::steam_id_for(self, discord_id).await
    }
}

/// Find the 0-based index of the row whose column B equals `discord_id`.
/// Row 0 is the header row and is never a match.
fn find_member_row(rows: &[Vec<String>], discord_id: u64) -> Option<usize> {
    let needle = discord_id.to_string();
    rows.iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.get(1).is_some_and(|id| *id == needle))
        .map(|(index, _)| index)
}

/// Parse raw sheet rows into member records, skipping the header row.
fn parse_member_rows(rows: &[Vec<String>]) -> Vec<MemberRow> {
    rows.iter()
        .skip(1)
        .map(|row| MemberRow {
            username: row.first().cloned().unwrap_or_default(),
            discord_id: row.get(1).cloned().unwrap_or_default(),
            steam_id: row.get(2).filter(|s| !s.is_empty()).cloned(),
        })
        .collect()
}
