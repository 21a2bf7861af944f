use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::sheets::RegisterOutcome;

use super::{BotData, Error};

/// Gateway events the bot reacts to outside of commands.
pub async fn handle_event(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "connected to Discord"
            );
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if new_member.user.bot {
                return Ok(());
            }
            let username = new_member.user.name.clone();
            let discord_id = new_member.user.id.get();
            match data.store.register_member(&username, discord_id).await {
                Ok(RegisterOutcome::Added) => {
                    info!(%username, discord_id, "added new member to the roster sheet");
                }
                Ok(RegisterOutcome::AlreadyPresent) => {
                    debug!(%username, discord_id, "member already in the roster sheet");
                }
                Err(reason) => {
                    warn!(%username, discord_id, %reason, "failed to add member to the roster sheet");
                }
            }
        }
        _ => {}
    }
    Ok(())
}
