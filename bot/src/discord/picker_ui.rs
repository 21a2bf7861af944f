//! Renders a picker session into a Discord message with two buttons and
//! drives it from component interactions until the session dies.

use poise::CreateReply;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::engine::GameCandidate;
use crate::engine::picker::{self, PickerDenied, PickerSession, PickerState};

use super::{Context, Error};

/// Send the results message and drive its picker session until the
/// inactivity timeout expires it.
pub async fn run_picker(
    ctx: Context<'_>,
    libraries: usize,
    games: Vec<GameCandidate>,
) -> Result<(), Error> {
    let names = games
        .iter()
        .map(|game| format!("- {}", game.name))
        .collect::<Vec<_>>()
        .join("\n");
    let content =
        format!("🎉 **Common MULTIPLAYER games found for {libraries} players:**\n{names}");

    // Scope the custom ids to this invocation so parallel runs in the same
    // channel cannot capture each other's clicks.
    let invocation = ctx.id();
    let pick_id = format!("{invocation}-pick");
    let reroll_id = format!("{invocation}-reroll");

    let mut session = PickerSession::new(games);

    let handle = ctx
        .send(
            CreateReply::default()
                .content(content)
                .components(vec![controls_row(&pick_id, &reroll_id, session.state())]),
        )
        .await?;
    let mut message = handle.into_message().await?;

    // Each pass waits for one click; the timeout restarts per pass, so the
    // session expires after 300 seconds of inactivity, not 300 seconds total.
    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .message_id(message.id)
        .timeout(picker::SESSION_TIMEOUT)
        .await
    {
        if press.data.custom_id == pick_id {
            let result = session.pick(&mut rand::thread_rng()).cloned();
            match result {
                Ok(game) => {
                    let embed = selection_embed(
                        format!("🎲 Let's play: {}!", game.name),
                        &game,
                        reroll_footer(session.rerolls_left()),
                        serenity::Colour::BLUE,
                    );
                    let row = controls_row(&pick_id, &reroll_id, session.state());
                    respond_update(&ctx, &press, embed, row).await;
                }
                Err(denied) => respond_notice(&ctx, &press, pick_denial_text(denied)).await,
            }
        } else if press.data.custom_id == reroll_id {
            let result = session.reroll(&mut rand::thread_rng()).cloned();
            match result {
                Ok(game) => {
                    let embed = selection_embed(
                        format!("🎲 Re-rolled: {}!", game.name),
                        &game,
                        reroll_footer(session.rerolls_left()),
                        serenity::Colour::DARK_GREEN,
                    );
                    let row = controls_row(&pick_id, &reroll_id, session.state());
                    respond_update(&ctx, &press, embed, row).await;
                }
                Err(denied) => {
                    respond_notice(&ctx, &press, reroll_denial_text(denied)).await;
                    if denied == PickerDenied::OutOfRerolls {
                        // A click got through on a control that should
                        // already be disabled; disable it on the message now.
                        update_controls(&ctx, &mut message, &pick_id, &reroll_id, session.state())
                            .await;
                    }
                }
            }
        }
    }

    // Collector timed out: the session is over, kill the buttons.
    session.expire();
    update_controls(&ctx, &mut message, &pick_id, &reroll_id, session.state()).await;
    info!("picker session timed out");
    Ok(())
}

fn reroll_footer(rerolls_left: u8) -> String {
    if rerolls_left == 0 {
        "No more re-rolls left.".to_string()
    } else {
        format!("{rerolls_left} re-rolls left.")
    }
}

/// Embed for the currently selected title, with the header image when the
/// storefront had one.
fn selection_embed(
    title: String,
    game: &GameCandidate,
    footer: String,
    colour: serenity::Colour,
) -> serenity::CreateEmbed {
    let embed = serenity::CreateEmbed::new()
        .title(title)
        .colour(colour)
        .footer(serenity::CreateEmbedFooter::new(footer));
    match &game.image_url {
        Some(url) => embed.image(url),
        None => embed.description("No image available for this game."),
    }
}

/// Both picker buttons, disabled flags derived from the session state:
/// picking is only open before the first pick, re-rolling only while a
/// selection is live with budget left.
fn controls_row(pick_id: &str, reroll_id: &str, state: PickerState) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(pick_id)
            .label("Pick a random game for us!")
            .style(serenity::ButtonStyle::Primary)
            .disabled(state != PickerState::Idle),
        serenity::CreateButton::new(reroll_id)
            .label("Re-roll game")
            .style(serenity::ButtonStyle::Secondary)
            .disabled(state != PickerState::Selected),
    ])
}

fn pick_denial_text(denied: PickerDenied) -> &'static str {
    match denied {
        PickerDenied::NoCandidates => "No games available to pick from.",
        PickerDenied::AlreadyPicked => "A game has already been picked for this session.",
        PickerDenied::SessionExpired => "This picker session has expired.",
        PickerDenied::NothingPicked | PickerDenied::OutOfRerolls => {
            "That action isn't available right now."
        }
    }
}

fn reroll_denial_text(denied: PickerDenied) -> &'static str {
    match denied {
        PickerDenied::OutOfRerolls => "You have no re-rolls left for this session.",
        PickerDenied::NothingPicked => "Pick a game first before re-rolling.",
        PickerDenied::NoCandidates => "No games available to re-roll from.",
        PickerDenied::SessionExpired => "This picker session has expired.",
        PickerDenied::AlreadyPicked => "That action isn't available right now.",
    }
}

/// Swap the selection embed and controls onto the picker message.
async fn respond_update(
    ctx: &Context<'_>,
    press: &serenity::ComponentInteraction,
    embed: serenity::CreateEmbed,
    row: serenity::CreateActionRow,
) {
    let response = serenity::CreateInteractionResponse::UpdateMessage(
        serenity::CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(vec![row]),
    );
    if let Err(e) = press.create_response(ctx.serenity_context(), response).await {
        warn!(error = %e, "failed to update picker message");
    }
}

/// Private notice to the clicker; the picker message is left untouched.
async fn respond_notice(ctx: &Context<'_>, press: &serenity::ComponentInteraction, text: &str) {
    let response = serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(true),
    );
    if let Err(e) = press.create_response(ctx.serenity_context(), response).await {
        warn!(error = %e, "failed to send picker notice");
    }
}

/// Re-render the button row on the persistent message for the given state.
async fn update_controls(
    ctx: &Context<'_>,
    message: &mut serenity::Message,
    pick_id: &str,
    reroll_id: &str,
    state: PickerState,
) {
    let builder =
        serenity::EditMessage::new().components(vec![controls_row(pick_id, reroll_id, state)]);
    if let Err(e) = message.edit(ctx.serenity_context(), builder).await {
        warn!(error = %e, "failed to update picker controls");
    }
}
