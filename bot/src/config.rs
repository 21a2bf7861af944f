use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level bot configuration, loaded from gamenight.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub discord: DiscordSection,
    pub steam: SteamSection,
    pub sheets: SheetsSection,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct DiscordSection {
    pub token: String,
    /// Mentioned in contact-on-failure messages so members know who to ask.
    pub admin_user_id: u64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SteamSection {
    pub api_key: String,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct SheetsSection {
    /// Path to the Google service-account key file (JSON).
    pub credentials_file: String,
    pub spreadsheet_id: String,
    /// Worksheet tab name, case-sensitive.
    pub worksheet_name: String,
}

impl Default for SheetsSection {
    fn default() -> Self {
        Self {
            credentials_file: "service-account.json".into(),
            spreadsheet_id: String::new(),
            worksheet_name: "Members".into(),
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config: Self = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file {path}"))?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DISCORD_TOKEN") {
            self.discord.token = v;
        }
        if let Ok(v) = std::env::var("ADMIN_ID")
            && let Ok(id) = v.parse()
        {
            self.discord.admin_user_id = id;
        }
        if let Ok(v) = std::env::var("STEAM_API_KEY") {
            self.steam.api_key = v;
        }
        if let Ok(v) = std::env::var("CREDENTIALS_FILE") {
            self.sheets.credentials_file = v;
        }
        if let Ok(v) = std::env::var("SPREADSHEET_KEY") {
            self.sheets.spreadsheet_id = v;
        }
        if let Ok(v) = std::env::var("SHEET_NAME") {
            self.sheets.worksheet_name = v;
        }
    }

    /// Reject configurations the bot cannot possibly run with.
    fn validate(&self) -> anyhow::Result<()> {
        if self.discord.token.is_empty() {
            bail!("Discord token is not set (discord.token or DISCORD_TOKEN)");
        }
        if self.steam.api_key.is_empty() {
            bail!("Steam API key is not set (steam.api_key or STEAM_API_KEY)");
        }
        if self.sheets.spreadsheet_id.is_empty() {
            bail!("spreadsheet id is not set (sheets.spreadsheet_id or SPREADSHEET_KEY)");
        }
        Ok(())
    }
}
