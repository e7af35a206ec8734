//! # Feature: Role Message Publishing
//!
//! Posts one announcement per configured role message into the roles channel,
//! writes the resulting message IDs back to the registry, and seeds each
//! message with the bot's own reactions.
//!
//! Every step is best-effort forward progress: a failure stops the remaining
//! work but nothing already sent is undone. Publishing again sends fresh
//! copies of every message.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Write guard released before reactions; unparseable channel IDs get their own error
//! - 1.0.0: Initial publish sequence with registry write-back

use crate::error::{ConfigError, RemoteCallError};
use crate::gateway::{parse_id, RoleGateway};
use crate::roles::RoleStore;
use log::{error, info};
use serenity::model::id::{ChannelId, MessageId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("error reading config: {0}")]
    Config(#[source] ConfigError),

    #[error("error saving roles config: {0}")]
    Save(#[source] ConfigError),

    #[error("invalid roles channel: {0}")]
    Channel(#[source] RemoteCallError),

    #[error("error creating role message {index}: {source}")]
    Send {
        index: usize,
        #[source]
        source: RemoteCallError,
    },

    #[error("error adding reaction {emoji} to message {message_id}: {source}")]
    Reaction {
        message_id: MessageId,
        emoji: String,
        #[source]
        source: RemoteCallError,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub messages_sent: usize,
    pub reactions_added: usize,
}

/// Runs the full publish sequence against `gateway`.
///
/// The store guard is held from loading the registry until it is saved, so
/// concurrent publishes cannot overwrite each other's message IDs. Reactions
/// are added after the guard is released.
pub async fn publish_role_messages(
    gateway: &dyn RoleGateway,
    store: &RoleStore,
) -> Result<PublishReport, PublishError> {
    let guard = store.lock().await;

    let config = store.load_guild_config().await.map_err(PublishError::Config)?;
    let mut registry = store.load_registry().await.map_err(PublishError::Config)?;
    info!("Creating role messages in channel {}", config.roles_channel_id);

    let channel = ChannelId(
        parse_id("channel", &config.roles_channel_id)
            .map_err(PublishError::Channel)?,
    );

    let mut report = PublishReport::default();
    let mut sent = Vec::with_capacity(registry.items.len());
    let mut send_error = None;

    for (index, item) in registry.items.iter_mut().enumerate() {
        match gateway.send_message(channel, &item.render()).await {
            Ok(message_id) => {
                info!("Created role message {} ({} roles)", message_id, item.roles.len());
                item.message_id = message_id.to_string();
                sent.push((message_id, item.roles.clone()));
                report.messages_sent += 1;
            }
            Err(source) => {
                send_error = Some(PublishError::Send { index, source });
                break;
            }
        }
    }

    // Persist whatever was sent, even if a later send failed.
    store.save_registry(&registry).await.map_err(PublishError::Save)?;
    info!("Roles config saved");
    drop(guard);

    if let Some(e) = send_error {
        return Err(e);
    }

    for (message_id, roles) in sent {
        for role in roles {
            info!("Adding reaction {} to message {}", role.emoji, message_id);
            gateway
                .add_reaction(channel, message_id, &role.emoji)
                .await
                .map_err(|source| PublishError::Reaction {
                    message_id,
                    emoji: role.emoji.clone(),
                    source,
                })?;
            report.reactions_added += 1;
        }
    }

    info!(
        "Published {} role message(s) with {} reaction(s)",
        report.messages_sent, report.reactions_added
    );
    Ok(report)
}

/// Handler-boundary wrapper: logs the outcome and never fails.
pub async fn publish_and_log(gateway: &dyn RoleGateway, store: &RoleStore) {
    if let Err(e) = publish_role_messages(gateway, store).await {
        error!("Role message publish aborted: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{Call, RecordingGateway};
    use crate::roles::fixtures::*;
    use crate::roles::{RoleEntry, RoleMessage, RolesRegistry};

    const TWO_MESSAGES: &str = r#"{
        "items": [
            { "messageId": "", "roles": [
                { "roleName": "Red", "roleEmote": "🔴" },
                { "roleName": "Blue", "roleEmote": "🔵" }
            ] },
            { "messageId": "", "roles": [
                { "roleName": "Cat", "roleEmote": "cat:77" }
            ] }
        ]
    }"#;

    #[tokio::test]
    async fn test_publish_single_message_scenario() {
        let (_dir, store) = store_with(RED_CONFIG, RED_ROLES_UNPUBLISHED).await;
        let gateway = RecordingGateway {
            message_ids: vec![500],
            ..Default::default()
        };

        let report = publish_role_messages(&gateway, &store).await.unwrap();
        assert_eq!(
            report,
            PublishReport {
                messages_sent: 1,
                reactions_added: 1
            }
        );

        let registry = store.load_registry().await.unwrap();
        assert_eq!(
            registry,
            RolesRegistry {
                items: vec![RoleMessage {
                    message_id: "500".to_string(),
                    roles: vec![RoleEntry {
                        name: "Red".to_string(),
                        emoji: "🔴".to_string(),
                    }],
                }],
            }
        );

        assert_eq!(
            gateway.calls(),
            vec![
                Call::Send(ChannelId(100), "React to choose a role:\n🔴 - Red\n".to_string()),
                Call::React(ChannelId(100), MessageId(500), "🔴".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_issues_sends_then_reactions_in_order() {
        let (_dir, store) = store_with(RED_CONFIG, TWO_MESSAGES).await;
        let gateway = RecordingGateway {
            message_ids: vec![1, 2],
            ..Default::default()
        };

        publish_role_messages(&gateway, &store).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2 + 3);
        assert!(matches!(calls[0], Call::Send(..)));
        assert!(matches!(calls[1], Call::Send(..)));
        assert_eq!(
            calls[2..],
            [
                Call::React(ChannelId(100), MessageId(1), "🔴".to_string()),
                Call::React(ChannelId(100), MessageId(1), "🔵".to_string()),
                Call::React(ChannelId(100), MessageId(2), "cat:77".to_string()),
            ]
        );

        let registry = store.load_registry().await.unwrap();
        let ids: Vec<_> = registry.items.iter().map(|i| i.message_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(registry.total_roles(), 3);
    }

    #[tokio::test]
    async fn test_partial_send_failure_persists_successful_ids() {
        let (_dir, store) = store_with(RED_CONFIG, TWO_MESSAGES).await;
        let gateway = RecordingGateway {
            message_ids: vec![1, 2],
            fail_send_at: Some(1),
            ..Default::default()
        };

        let result = publish_role_messages(&gateway, &store).await;
        assert!(matches!(result, Err(PublishError::Send { index: 1, .. })));

        let registry = store.load_registry().await.unwrap();
        assert_eq!(registry.items[0].message_id, "1");
        assert_eq!(registry.items[1].message_id, "");

        // No reactions once a send has failed.
        assert!(gateway
            .calls()
            .iter()
            .all(|call| matches!(call, Call::Send(..))));
    }

    #[tokio::test]
    async fn test_reaction_failure_stops_remaining_reactions() {
        let (_dir, store) = store_with(RED_CONFIG, TWO_MESSAGES).await;
        let gateway = RecordingGateway {
            message_ids: vec![1, 2],
            fail_reaction_at: Some(0),
            ..Default::default()
        };

        let result = publish_role_messages(&gateway, &store).await;
        assert!(matches!(result, Err(PublishError::Reaction { .. })));

        let reactions = gateway
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::React(..)))
            .count();
        assert_eq!(reactions, 1);

        // Message IDs were persisted before the reaction step.
        let registry = store.load_registry().await.unwrap();
        assert_eq!(registry.items[1].message_id, "2");
    }

    #[tokio::test]
    async fn test_malformed_registry_sends_nothing() {
        let (_dir, store) = store_with(RED_CONFIG, "{ \"items\": [ oops").await;
        let gateway = RecordingGateway::default();

        let result = publish_role_messages(&gateway, &store).await;
        assert!(matches!(result, Err(PublishError::Config(ConfigError::Parse { .. }))));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_channel_is_channel_error() {
        let (_dir, store) =
            store_with(r#"{ "rolesChannelId": "roles" }"#, RED_ROLES_UNPUBLISHED).await;
        let gateway = RecordingGateway {
            message_ids: vec![1],
            ..Default::default()
        };

        let result = publish_role_messages(&gateway, &store).await;
        assert!(matches!(
            result,
            Err(PublishError::Channel(RemoteCallError::InvalidId { kind: "channel", .. }))
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_republish_sends_duplicates() {
        let (_dir, store) = store_with(RED_CONFIG, RED_ROLES_UNPUBLISHED).await;
        let gateway = RecordingGateway {
            message_ids: vec![10, 11],
            ..Default::default()
        };

        publish_role_messages(&gateway, &store).await.unwrap();
        publish_role_messages(&gateway, &store).await.unwrap();

        let sends = gateway
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Send(..)))
            .count();
        assert_eq!(sends, 2);
        let registry = store.load_registry().await.unwrap();
        assert_eq!(registry.items[0].message_id, "11");
    }
}
