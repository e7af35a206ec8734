//! Remote calls the bot issues against Discord, behind [`RoleGateway`] so the
//! publish and reconcile flows can run against an in-memory recorder in tests.

use crate::error::RemoteCallError;
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, EmojiId, GuildId, MessageId, RoleId, UserId};
use std::sync::Arc;

/// A guild role as needed for name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
}

#[async_trait]
pub trait RoleGateway: Send + Sync {
    /// Posts `content` and returns the new message's ID.
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, RemoteCallError>;

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), RemoteCallError>;

    async fn guild_roles(&self, guild_id: GuildId) -> Result<Vec<GuildRole>, RemoteCallError>;

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RemoteCallError>;

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RemoteCallError>;
}

/// [`RoleGateway`] backed by serenity's REST client.
#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        SerenityGateway { http }
    }
}

#[async_trait]
impl RoleGateway for SerenityGateway {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, RemoteCallError> {
        let message = channel_id.say(&self.http, content).await?;
        Ok(message.id)
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), RemoteCallError> {
        let reaction = parse_emoji(emoji)?;
        self.http
            .create_reaction(channel_id.0, message_id.0, &reaction)
            .await?;
        Ok(())
    }

    async fn guild_roles(&self, guild_id: GuildId) -> Result<Vec<GuildRole>, RemoteCallError> {
        let roles = self.http.get_guild_roles(guild_id.0).await?;
        Ok(roles
            .into_iter()
            .map(|role| GuildRole {
                id: role.id,
                name: role.name,
            })
            .collect())
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RemoteCallError> {
        self.http
            .add_member_role(guild_id.0, user_id.0, role_id.0, Some("Reaction role"))
            .await?;
        Ok(())
    }

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RemoteCallError> {
        self.http
            .remove_member_role(guild_id.0, user_id.0, role_id.0, Some("Reaction role"))
            .await?;
        Ok(())
    }
}

/// Parses a snowflake stored as a string in the config files.
pub fn parse_id(kind: &'static str, value: &str) -> Result<u64, RemoteCallError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| RemoteCallError::InvalidId {
            kind,
            value: value.to_string(),
        })
}

/// Converts a configured emoji into a reaction.
///
/// Unicode emoji are used as-is. Custom emoji are written `name:id`, with an
/// optional `a:` prefix for animated ones.
pub fn parse_emoji(emoji: &str) -> Result<ReactionType, RemoteCallError> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(RemoteCallError::InvalidEmoji(emoji.to_string()));
    }

    let (animated, rest) = match emoji.strip_prefix("a:") {
        Some(rest) if rest.contains(':') => (true, rest),
        _ => (false, emoji),
    };

    match rest.rsplit_once(':') {
        Some((name, id)) => {
            let id = id
                .parse::<u64>()
                .map_err(|_| RemoteCallError::InvalidEmoji(emoji.to_string()))?;
            Ok(ReactionType::Custom {
                animated,
                id: EmojiId(id),
                name: Some(name.to_string()),
            })
        }
        None => Ok(ReactionType::Unicode(emoji.to_string())),
    }
}

/// The `name:id` / unicode form that config entries are matched against.
pub fn emoji_api_name(reaction: &ReactionType) -> String {
    match reaction {
        ReactionType::Unicode(unicode) => unicode.clone(),
        ReactionType::Custom { id, name, .. } => {
            format!("{}:{}", name.as_deref().unwrap_or_default(), id.0)
        }
        other => other.as_data(),
    }
}
