use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use poise::{CreateReply, Modal};
use tracing::warn;

use crate::engine::workflow::{self, LetsPlayOutcome, Participant, ProgressReporter};
use crate::steam::ids;

use super::{BotData, Context, Error, picker_ui};

/// Discord caps message content at 2000 characters.
const MAX_MESSAGE_LENGTH: usize = 2000;
const TRUNCATION_MARKER: &str = "...\n(Message truncated due to length limit)";

/// Where to look up your SteamID64.
const STEAM_ID_HELP_URL: &str = "https://help.bethesda.net/#en/answer/49679";

const NO_COMMON_GAMES_MESSAGE: &str = "It looks like you don't have any common games among the \
    selected players with public profiles. Perhaps try different friends or consider playing a \
    popular multiplayer game!\n\nHere are some general suggestions for popular multiplayer games:\
    \n- Among Us\n- Fall Guys\n- Apex Legends\n- Valorant\n- Fortnite";

/// Pings the bot to check if it's online.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// Shows the roster sheet contents for debugging.
#[poise::command(slash_command)]
pub async fn roster(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let members = ctx.data().store.all_members().await;
    if members.is_empty() {
        ctx.say("The roster sheet is empty or could not be accessed.")
            .await?;
        return Ok(());
    }

    let mut reply = String::from("Current members in the roster sheet:\n");
    for member in &members {
        let steam_id = member.steam_id.as_deref().unwrap_or("N/A");
        reply.push_str(&format!(
            "- **{}** (Discord ID: `{}`, Steam ID: `{}`)\n",
            member.username, member.discord_id, steam_id
        ));
    }

    ctx.say(truncate_message(reply)).await?;
    Ok(())
}

#[derive(Debug, Modal)]
#[name = "Link Your Steam Account"]
struct SteamIdModal {
    #[name = "Your 17-Digit SteamID"]
    #[placeholder = "e.g., 76561198082726169"]
    #[min_length = 17]
    #[max_length = 17]
    steam_id: String,
    /// Prefilled pointer; Discord modals have no read-only fields.
    #[name = "How to find your SteamID (visit this link)"]
    help_link: Option<String>,
}

/// Link your Steam account to this Discord server so you can use the other functions.
#[poise::command(slash_command, rename = "link-steam")]
pub async fn link_steam(ctx: poise::ApplicationContext<'_, BotData, Error>) -> Result<(), Error> {
    let data = ctx.data;
    let user_id = ctx.interaction.user.id.get();

    if let Some(existing) = data.store.steam_id_for(user_id).await {
        send_ephemeral(
            poise::Context::Application(ctx),
            format!(
                "You are already linked with SteamID `{existing}`. If you want to change it, \
                 please contact {}.",
                data.admin_mention()
            ),
        )
        .await?;
        return Ok(());
    }

    let defaults = SteamIdModal {
        steam_id: String::new(),
        help_link: Some(STEAM_ID_HELP_URL.to_string()),
    };
    let Some(submitted) = SteamIdModal::execute_with_defaults(ctx, defaults).await? else {
        // Dismissed without submitting.
        return Ok(());
    };

    let entered = submitted.steam_id.trim().to_string();
    // Validate before touching the sheet; a malformed id never reaches it.
    if ids::validate_steam_id(&entered).is_err() {
        send_ephemeral(
            poise::Context::Application(ctx),
            format!(
                "That doesn't look like a valid 17-digit SteamID. Please ensure it starts with \
                 '{}' and is exactly {} digits long.",
                ids::STEAM_ID64_PREFIX,
                ids::STEAM_ID64_LENGTH
            ),
        )
        .await?;
        return Ok(());
    }

    match data.store.link_steam_id(user_id, &entered).await {
        Ok(()) => {
            send_ephemeral(
                poise::Context::Application(ctx),
                format!(
                    "Your SteamID (`{entered}`) has been successfully linked to this Discord \
                     server."
                ),
            )
            .await?;
        }
        Err(reason) => {
            send_ephemeral(
                poise::Context::Application(ctx),
                format!(
                    "Failed to link your SteamID: {reason}. Please try again or contact {} for \
                     assistance.",
                    data.admin_mention()
                ),
            )
            .await?;
        }
    }
    Ok(())
}

/// Finds common games among selected friends.
#[poise::command(slash_command, guild_only)]
pub async fn letsplay(
    ctx: Context<'_>,
    #[description = "First friend to include"] player2: serenity::Member,
    #[description = "Second friend to include (optional)"] player3: Option<serenity::Member>,
    #[description = "Third friend to include (optional)"] player4: Option<serenity::Member>,
    #[description = "Fourth friend to include (optional)"] player5: Option<serenity::Member>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let author = ctx.author();
    let mut participants = vec![Participant {
        discord_id: author.id.get(),
        name: author.name.clone(),
    }];
    for member in [Some(player2), player3, player4, player5]
        .into_iter()
        .flatten()
    {
        participants.push(Participant {
            discord_id: member.user.id.get(),
            name: member.user.name.clone(),
        });
    }

    let data = ctx.data();
    let mut progress = CommandProgress { ctx, status: None };
    let outcome =
        workflow::find_common_games(&data.store, &data.steam, &participants, &mut progress).await;

    match outcome {
        LetsPlayOutcome::NoUsableLibraries => {
            ctx.say("No players with public Steam profiles or games found to compare.")
                .await?;
        }
        LetsPlayOutcome::NotEnoughLibraries => {
            ctx.say(
                "To find common games, please ensure at least two selected players have public \
                 Steam profiles with games.",
            )
            .await?;
        }
        LetsPlayOutcome::NoCommonMultiplayer => {
            ctx.say(NO_COMMON_GAMES_MESSAGE).await?;
        }
        LetsPlayOutcome::Found { libraries, games } => {
            picker_ui::run_picker(ctx, libraries, games).await?;
        }
    }
    Ok(())
}

async fn send_ephemeral(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

/// Streams workflow progress into the invoking channel as followups,
/// editing the classification status message in place once it exists.
struct CommandProgress<'a> {
    ctx: Context<'a>,
    status: Option<poise::ReplyHandle<'a>>,
}

impl CommandProgress<'_> {
    async fn send(&self, content: String) {
        if let Err(e) = self.ctx.say(content).await {
            warn!(error = %e, "failed to send progress message");
        }
    }
}

#[async_trait]
impl ProgressReporter for CommandProgress<'_> {
    async fn missing_links(&mut self, names: &[String]) {
        self.send(format!(
            "Could not find Steam IDs for: {}. Please ensure they have linked their Steam \
             accounts with /link-steam.",
            names.join(", ")
        ))
        .await;
    }

    async fn library_fetch_failed(&mut self, name: &str, steam_id: &str) {
        self.send(format!(
            "Failed to fetch games for {name} (SteamID: `{steam_id}`). The Steam API might be \
             down, or there's an issue with the key. This player will be excluded from the \
             common games search."
        ))
        .await;
    }

    async fn private_or_empty(&mut self, names: &[String]) {
        self.send(format!(
            "Note: Could not retrieve games for {} because their Steam profiles are likely \
             private or have no games. They will be excluded from the common games search.",
            names.join(", ")
        ))
        .await;
    }

    async fn classification_started(&mut self, total: usize) {
        let content = format!(
            "Found {total} common games. Now checking for multiplayer status (this may take a \
             moment)..."
        );
        match self.ctx.say(content).await {
            Ok(handle) => self.status = Some(handle),
            Err(e) => warn!(error = %e, "failed to send classification status"),
        }
    }

    async fn classification_progress(&mut self, checked: usize, total: usize) {
        let content = format!(
            "Found {total} common games. Checking for multiplayer status... ({checked}/{total} \
             checked)"
        );
        match &self.status {
            Some(handle) => {
                if let Err(e) = handle
                    .edit(self.ctx, CreateReply::default().content(content))
                    .await
                {
                    warn!(error = %e, "failed to edit classification status");
                }
            }
            // The initial notice never made it out; fall back to sending.
            None => match self.ctx.say(content).await {
                Ok(handle) => self.status = Some(handle),
                Err(e) => warn!(error = %e, "failed to send classification status"),
            },
        }
    }
}

/// Cut a reply down to Discord's message limit, reserving room for the
/// truncation marker so the marker itself cannot push it over.
fn truncate_message(mut text: String) -> String {
    if text.len() <= MAX_MESSAGE_LENGTH {
        return text;
    }
    let mut cut = MAX_MESSAGE_LENGTH - TRUNCATION_MARKER.len();
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}
