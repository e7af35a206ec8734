//! # Feature: Reaction Roles
//!
//! Grants a role when a member reacts to a role message with the matching
//! emoji, and revokes it when the reaction is removed.
//!
//! Config and registry are re-read on every event. Unrelated reactions in the
//! roles channel are the common case and are ignored without logging noise.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Registry reads no longer wait behind a running publish
//! - 1.0.0: Initial add/remove reconciliation with first-match lookup

use crate::error::{ConfigError, RemoteCallError};
use crate::gateway::{emoji_api_name, RoleGateway};
use crate::roles::RoleStore;
use log::{debug, error, info};
use serenity::model::channel::Reaction;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Add,
    Remove,
}

/// The parts of a reaction event the reconciler looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    /// Unicode emoji, or `name:id` for custom emoji.
    pub emoji: String,
}

impl ReactionEvent {
    /// `None` for reactions outside a guild or without a reacting user.
    pub fn from_reaction(reaction: &Reaction) -> Option<Self> {
        Some(ReactionEvent {
            guild_id: reaction.guild_id?,
            channel_id: reaction.channel_id,
            message_id: reaction.message_id,
            user_id: reaction.user_id?,
            emoji: emoji_api_name(&reaction.emoji),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    IgnoredOwnReaction,
    IgnoredChannel,
    NoMatch,
    Granted(RoleId),
    Revoked(RoleId),
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("error reading config: {0}")]
    Config(#[from] ConfigError),

    #[error("error getting guild roles: {0}")]
    ListRoles(#[source] RemoteCallError),

    #[error("role {name:?} does not exist in guild {guild_id}")]
    RoleNotFound { guild_id: GuildId, name: String },

    #[error("error updating role {role_id} for user {user_id}: {source}")]
    UpdateRole {
        role_id: RoleId,
        user_id: UserId,
        #[source]
        source: RemoteCallError,
    },
}

/// Applies one reaction event. At most one grant or revoke is issued.
pub async fn reconcile_reaction(
    gateway: &dyn RoleGateway,
    store: &RoleStore,
    bot_id: UserId,
    kind: ReactionKind,
    event: &ReactionEvent,
) -> Result<Outcome, ReconcileError> {
    if event.user_id == bot_id {
        return Ok(Outcome::IgnoredOwnReaction);
    }

    let (config, registry) = store.snapshot().await?;

    if event.channel_id.to_string() != config.roles_channel_id.trim() {
        return Ok(Outcome::IgnoredChannel);
    }

    let Some(entry) = registry.find_entry(&event.message_id.to_string(), &event.emoji) else {
        debug!(
            "No role bound to {} on message {}",
            event.emoji, event.message_id
        );
        return Ok(Outcome::NoMatch);
    };

    let roles = gateway
        .guild_roles(event.guild_id)
        .await
        .map_err(ReconcileError::ListRoles)?;
    let role_id = roles
        .iter()
        .find(|role| role.name == entry.name)
        .map(|role| role.id)
        .ok_or_else(|| ReconcileError::RoleNotFound {
            guild_id: event.guild_id,
            name: entry.name.clone(),
        })?;

    let update_err = |source| ReconcileError::UpdateRole {
        role_id,
        user_id: event.user_id,
        source,
    };
    match kind {
        ReactionKind::Add => {
            info!("Adding role {} to user {}", entry.name, event.user_id);
            gateway
                .grant_role(event.guild_id, event.user_id, role_id)
                .await
                .map_err(update_err)?;
            Ok(Outcome::Granted(role_id))
        }
        ReactionKind::Remove => {
            info!("Removing role {} from user {}", entry.name, event.user_id);
            gateway
                .revoke_role(event.guild_id, event.user_id, role_id)
                .await
                .map_err(update_err)?;
            Ok(Outcome::Revoked(role_id))
        }
    }
}

/// Handler-boundary wrapper: logs failures and never propagates them.
pub async fn reconcile_and_log(
    gateway: &dyn RoleGateway,
    store: &RoleStore,
    bot_id: UserId,
    kind: ReactionKind,
    event: &ReactionEvent,
) {
    if let Err(e) = reconcile_reaction(gateway, store, bot_id, kind, event).await {
        error!("Reaction {:?} on message {} failed: {}", kind, event.message_id, e);
    }
}
