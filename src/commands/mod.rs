//! # Text Commands
//!
//! Plain-text commands matched against the whole message body. Matching is
//! exact and case-sensitive; anything else is ordinary chat and ignored.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Message dispatch moved out of the binary into [`handle_message`]
//! - 1.0.0: Initial `;create-role-messages`, `comp?` and `no comp` commands

pub mod quick;

use crate::gateway::RoleGateway;
use crate::publisher::publish_and_log;
use crate::roles::RoleStore;
use log::{error, info};
use serenity::model::id::ChannelId;

/// Publishes the role-selection messages.
pub const CREATE_ROLE_MESSAGES: &str = ";create-role-messages";
pub const COMP_REQUEST: &str = "comp?";
pub const NO_COMP: &str = "no comp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCommand {
    CreateRoleMessages,
    CompRequest,
    NoComp,
}

impl TextCommand {
    pub fn parse(content: &str) -> Option<Self> {
        match content {
            CREATE_ROLE_MESSAGES => Some(TextCommand::CreateRoleMessages),
            COMP_REQUEST => Some(TextCommand::CompRequest),
            NO_COMP => Some(TextCommand::NoComp),
            _ => None,
        }
    }

    /// Canned reply, for commands that only answer in the channel.
    pub fn reply(self) -> Option<&'static str> {
        match self {
            TextCommand::CreateRoleMessages => None,
            TextCommand::CompRequest => Some(quick::comp_request()),
            TextCommand::NoComp => Some(quick::no_comp()),
        }
    }
}

/// Dispatches one incoming message. Bot authors and non-commands are ignored.
///
/// Returns the command that ran, if any. Failures are logged, never returned.
pub async fn handle_message(
    gateway: &dyn RoleGateway,
    store: &RoleStore,
    author_is_bot: bool,
    channel_id: ChannelId,
    content: &str,
) -> Option<TextCommand> {
    if author_is_bot {
        return None;
    }

    let command = TextCommand::parse(content)?;
    info!("Processing command {:?} in channel {}", command, channel_id);

    match command.reply() {
        Some(reply) => {
            if let Err(why) = gateway.send_message(channel_id, reply).await {
                error!("Failed to send reply: {}", why);
            }
        }
        None => publish_and_log(gateway, store).await,
    }

    Some(command)
}
