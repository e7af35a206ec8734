//! # Role Registry
//!
//! JSON-backed configuration for the role-selection messages: the guild config
//! naming the roles channel, and the registry mapping each announcement message
//! to the roles it offers.
//!
//! Files are re-read on every call; nothing is cached, so edits on disk apply to
//! the next event without a restart. Writes to the registry go through
//! [`RoleStore`], which serializes them behind a single mutex.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Readers no longer wait on the write guard
//! - 1.0.0: Initial JSON-backed guild config and roles registry

use crate::error::ConfigError;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

/// Header line of every role announcement message.
pub const ROLE_MESSAGE_HEADER: &str = "React to choose a role:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    pub roles_channel_id: String,
}

/// One selectable role and the emoji that toggles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    #[serde(rename = "roleName")]
    pub name: String,
    #[serde(rename = "roleEmote")]
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMessage {
    /// Empty until the message has been published.
    #[serde(default)]
    pub message_id: String,
    pub roles: Vec<RoleEntry>,
}

impl RoleMessage {
    /// Announcement text: the header, then one `<emoji> - <name>` line per role.
    pub fn render(&self) -> String {
        let mut text = format!("{}\n", ROLE_MESSAGE_HEADER);
        for role in &self.roles {
            text.push_str(&format!("{} - {}\n", role.emoji, role.name));
        }
        text
    }

    /// First entry using `emoji`. Later duplicates are never reached.
    pub fn find_by_emoji(&self, emoji: &str) -> Option<&RoleEntry> {
        self.roles.iter().find(|role| role.emoji == emoji)
    }

    pub fn is_published(&self) -> bool {
        !self.message_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesRegistry {
    pub items: Vec<RoleMessage>,
}

impl RolesRegistry {
    /// Looks up the role bound to `emoji` on the message `message_id`.
    ///
    /// Only the first message with that ID is considered, and within it only
    /// the first entry with that emoji. Unpublished messages never match.
    pub fn find_entry(&self, message_id: &str, emoji: &str) -> Option<&RoleEntry> {
        if message_id.is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|item| item.message_id == message_id)
            .and_then(|item| item.find_by_emoji(emoji))
    }

    pub fn total_roles(&self) -> usize {
        self.items.iter().map(|item| item.roles.len()).sum()
    }
}

/// Reads and deserializes a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes `value` with 4-space indentation and writes it to `path`.
///
/// The JSON is written to a sibling `.tmp` file first and renamed over the
/// target, so readers see either the old or the new document.
pub async fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let tmp_path = temp_path_for(path);
    tokio::fs::write(&tmp_path, &buf).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Owns the paths of the two config files and the registry write guard.
pub struct RoleStore {
    guild_config_path: PathBuf,
    roles_path: PathBuf,
    guard: Mutex<()>,
}

impl RoleStore {
    pub fn new(guild_config_path: impl Into<PathBuf>, roles_path: impl Into<PathBuf>) -> Self {
        RoleStore {
            guild_config_path: guild_config_path.into(),
            roles_path: roles_path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Holds the single-writer guard, e.g. across a load-modify-save cycle.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().await
    }

    pub async fn load_guild_config(&self) -> Result<GuildConfig, ConfigError> {
        let config: GuildConfig = load_json(&self.guild_config_path).await?;
        debug!("Guild config loaded from {}", self.guild_config_path.display());
        Ok(config)
    }

    pub async fn load_registry(&self) -> Result<RolesRegistry, ConfigError> {
        let registry: RolesRegistry = load_json(&self.roles_path).await?;
        debug!(
            "Roles registry loaded from {} ({} messages)",
            self.roles_path.display(),
            registry.items.len()
        );
        Ok(registry)
    }

    /// Callers mutating the registry should hold [`RoleStore::lock`].
    pub async fn save_registry(&self, registry: &RolesRegistry) -> Result<(), ConfigError> {
        save_json(&self.roles_path, registry).await
    }

    /// Loads both files without taking the write guard. Saves replace the file
    /// by rename, so a reader sees either the old or the new registry.
    pub async fn snapshot(&self) -> Result<(GuildConfig, RolesRegistry), ConfigError> {
        let config = self.load_guild_config().await?;
        let registry = self.load_registry().await?;
        Ok((config, registry))
    }
}
