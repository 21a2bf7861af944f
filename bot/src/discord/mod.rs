//! Discord surface: slash commands, gateway event handling, and the
//! interactive picker UI. Everything here renders core state into Discord
//! primitives; none of the game logic lives on this side of the seam.

pub mod commands;
pub mod events;
pub mod picker_ui;

use crate::sheets::SheetsStore;
use crate::steam::SteamClient;

/// Shared state handed to every command invocation.
pub struct BotData {
    pub store: SheetsStore,
    pub steam: SteamClient,
    /// Mentioned in contact-on-failure messages.
    pub admin_user_id: u64,
}

impl BotData {
    pub fn admin_mention(&self) -> String {
        format!("<@{}>", self.admin_user_id)
    }
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, BotData, Error>;
