use crate::error::StartupError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_GUILD_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_ROLES_CONFIG_PATH: &str = "config/roles.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub guild_config_path: PathBuf,
    pub roles_config_path: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        let discord_token = env::var("DISCORD_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(StartupError::MissingToken)?;

        Ok(Config {
            discord_token,
            guild_config_path: env::var("GUILD_CONFIG_PATH")
                .unwrap_or_else(|_| DEFAULT_GUILD_CONFIG_PATH.to_string())
                .into(),
            roles_config_path: env::var("ROLES_CONFIG_PATH")
                .unwrap_or_else(|_| DEFAULT_ROLES_CONFIG_PATH.to_string())
                .into(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Both cases share process-wide env vars, so they run in one test.
    #[test]
    fn test_config_from_env() {
        env::remove_var("DISCORD_TOKEN");
        assert!(matches!(Config::from_env(), Err(StartupError::MissingToken)));

        env::set_var("DISCORD_TOKEN", "   ");
        assert!(matches!(Config::from_env(), Err(StartupError::MissingToken)));

        env::set_var("DISCORD_TOKEN", "test_discord_token");
        env::remove_var("GUILD_CONFIG_PATH");
        env::remove_var("ROLES_CONFIG_PATH");
        env::remove_var("LOG_LEVEL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.discord_token, "test_discord_token");
        assert_eq!(config.guild_config_path, PathBuf::from("config/config.json"));
        assert_eq!(config.roles_config_path, PathBuf::from("config/roles.json"));
        assert_eq!(config.log_level, "info");

        env::set_var("ROLES_CONFIG_PATH", "/tmp/roles.json");
        let config = Config::from_env().unwrap();
        assert_eq!(config.roles_config_path, PathBuf::from("/tmp/roles.json"));

        env::remove_var("DISCORD_TOKEN");
        env::remove_var("ROLES_CONFIG_PATH");
    }
}
