mod events;

use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use vesper_core::gateway::GatewayNotifier;
use vesper_core::{Data, Error};
use vesper_database::{Database, MIGRATOR};
use vesper_database::impls::notification_log::purge_older_than;
use vesper_notify::config::{
    DEFAULT_DELAY_SECONDS, DEFAULT_MAX_DELAY_SECONDS, DEFAULT_MIN_DELAY_SECONDS, DelayBounds,
};
use vesper_notify::engine::TransitionEngine;
use vesper_utils::time::now_unix_secs;

const DEFAULT_LOG_RETENTION_DAYS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let token = env::var("DISCORD_TOKEN")?;
    let database_url = env::var("DATABASE_URL")?;
    let command_guild_id = match env::var("DISCORD_GUILD_ID") {
        Ok(raw) => Some(raw.parse::<u64>()?),
        Err(_) => None,
    };

    let bounds = DelayBounds::new(
        env_u64("MIN_DELAY_SECONDS", DEFAULT_MIN_DELAY_SECONDS),
        env_u64("MAX_DELAY_SECONDS", DEFAULT_MAX_DELAY_SECONDS),
        env_u64("DEFAULT_DELAY_SECONDS", DEFAULT_DELAY_SECONDS),
    );
    bounds.validate()?;
    info!(
        min_seconds = bounds.min_seconds,
        max_seconds = bounds.max_seconds,
        default_seconds = bounds.default_seconds,
        "notification delay bounds configured"
    );

    let retention_days = env_u64("LOG_RETENTION_DAYS", DEFAULT_LOG_RETENTION_DAYS).max(1);

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    info!("PostgreSQL connection established.");

    let db = Database::new(db_pool);

    let auto_run_migrations = env_bool("AUTO_RUN_MIGRATIONS", true);
    if auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_VOICE_STATES;

    // Filled during framework setup so the shutdown path can drain timers.
    let notifier_slot: Arc<OnceLock<Arc<TransitionEngine<GatewayNotifier>>>> =
        Arc::new(OnceLock::new());
    let notifier_setup_slot = Arc::clone(&notifier_slot);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vesper_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(vesper_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            let db = db.clone();
            Box::pin(async move {
                info!("Vesper is watching the evening channels.");

                match command_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }
                }

                let notifier = TransitionEngine::new(
                    Arc::new(GatewayNotifier::new(ctx.http.clone(), db.clone())),
                    bounds,
                );
                let _ = notifier_setup_slot.set(Arc::clone(&notifier));

                spawn_retention_task(db.clone(), retention_days);

                Ok(Data {
                    db,
                    notifier,
                    bounds,
                })
            })
        })
        .build();

    info!("Vesper is connecting...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            if let Some(notifier) = notifier_slot.get() {
                notifier.shutdown().await;
            }
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Purge ledger rows past the retention window, once at startup and then daily.
fn spawn_retention_task(db: Database, retention_days: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(86_400));
        loop {
            interval.tick().await;

            let cutoff = now_unix_secs().saturating_sub(retention_days * 86_400);
            match purge_older_than(&db, cutoff).await {
                Ok(deleted) if deleted > 0 => {
                    info!(deleted, retention_days, "purged old notification log rows");
                }
                Ok(_) => {}
                Err(source) => {
                    error!(?source, "notification log retention purge failed");
                }
            }
        }
    });
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, "command error");

            let embed = serenity::CreateEmbed::new()
                .title("Command Error")
                .description("Something went wrong while running this command.")
                .color(vesper_utils::embed::DEFAULT_EMBED_COLOR);

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!("Usage: `!{}`", ctx.command().qualified_name);
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "connected to the gateway"
            );
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            events::voice_state::handle_voice_state_update(data, old.as_ref(), new).await;
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            events::voice_state::seed_guild_presence(data, guild).await;
        }
        _ => {}
    }

    Ok(())
}
