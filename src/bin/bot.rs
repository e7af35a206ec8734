use anyhow::Result;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::model::id::UserId;
use serenity::prelude::*;
use std::sync::{Arc, OnceLock};

use rolecall::commands::handle_message;
use rolecall::config::Config;
use rolecall::error::StartupError;
use rolecall::gateway::SerenityGateway;
use rolecall::reconciler::{reconcile_and_log, ReactionEvent, ReactionKind};
use rolecall::roles::RoleStore;

struct Handler {
    store: Arc<RoleStore>,
    bot_id: OnceLock<UserId>,
}

impl Handler {
    fn new(store: RoleStore) -> Self {
        Handler {
            store: Arc::new(store),
            bot_id: OnceLock::new(),
        }
    }

    async fn handle_reaction(&self, ctx: Context, reaction: Reaction, kind: ReactionKind) {
        let Some(&bot_id) = self.bot_id.get() else {
            warn!("Reaction received before ready, ignoring");
            return;
        };
        let Some(event) = ReactionEvent::from_reaction(&reaction) else {
            debug!("Ignoring reaction outside a guild");
            return;
        };

        let gateway = SerenityGateway::new(ctx.http.clone());
        reconcile_and_log(&gateway, &self.store, bot_id, kind, &event).await;
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let gateway = SerenityGateway::new(ctx.http.clone());
        handle_message(
            &gateway,
            &self.store,
            msg.author.bot,
            msg.channel_id,
            &msg.content,
        )
        .await;
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        self.handle_reaction(ctx, add_reaction, ReactionKind::Add).await;
    }

    async fn reaction_remove(&self, ctx: Context, removed_reaction: Reaction) {
        self.handle_reaction(ctx, removed_reaction, ReactionKind::Remove)
            .await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        if self.bot_id.set(ready.user.id).is_err() {
            debug!("Bot ID already recorded, keeping it");
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Could not listen for SIGTERM: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Could not listen for CTRL-C: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Could not listen for CTRL-C: {}", e);
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for CTRL-C: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    info!("Starting role bot...");

    let store = RoleStore::new(&config.guild_config_path, &config.roles_config_path);
    let handler = Handler::new(store);

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {}", e);
            StartupError::Session(e)
        })?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, closing gateway connection");
        shard_manager.lock().await.shutdown_all().await;
    });

    info!("Bot is now running. Press CTRL-C to exit.");
    info!("Gateway intents: {:?}", intents);

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {:?}", why);
        return Err(StartupError::Session(why).into());
    }

    info!("Gateway connection closed");
    Ok(())
}
