use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gamenight_bot::config::BotConfig;
use gamenight_bot::discord::{self, BotData};
use gamenight_bot::sheets::SheetsStore;
use gamenight_bot::sheets::auth::ServiceAccountKey;
use gamenight_bot::steam::SteamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("GAMENIGHT_CONFIG").unwrap_or_else(|_| "gamenight.toml".to_string());
    let config = BotConfig::load(&config_path)?;

    let key = ServiceAccountKey::from_file(&config.sheets.credentials_file)?;
    let store = SheetsStore::new(
        key,
        config.sheets.spreadsheet_id.clone(),
        config.sheets.worksheet_name.clone(),
    )?;
    let steam = SteamClient::new(config.steam.api_key.clone())?;
    let admin_user_id = config.discord.admin_user_id;

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::ping(),
                discord::commands::roster(),
                discord::commands::link_steam(),
                discord::commands::letsplay(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("global slash commands synced");
                Ok(BotData {
                    store,
                    steam,
                    admin_user_id,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord.token, intents)
        .framework(framework)
        .await
        .context("failed to build Discord client")?;

    info!("gamenight bot starting");
    client.start().await.context("Discord client error")?;
    Ok(())
}
