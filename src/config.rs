use std::{fmt, path::Path};

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use chrono::Duration;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{login::issue_token, register::do_register, token::TokenKeys},
    live::{chat::chat_socket, relay::notify_socket},
    results::create::do_create_result,
    state::{AppState, tx_commit},
    teams::{create::do_create_team, join::do_join_team, rating::get_team_rating},
    tournaments::{
        create::do_create_tournament,
        manage::{do_delete_tournament, do_update_tournament},
        view::list_tournaments,
    },
};

/// Server settings. Read from an optional TOML file, then overridden by the
/// environment.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bind: String,
    /// SQLite database file. `:memory:` gives a database that lives only as
    /// long as the process.
    pub database_url: String,
    pub secret_key: Option<String>,
    pub access_token_expire_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            database_url: "tourney.db".to_string(),
            secret_key: None,
            access_token_expire_minutes: 30,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    InvalidVar { name: &'static str, value: String },
    MissingSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "could not read config file: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config file: {e}"),
            ConfigError::InvalidVar { name, value } => {
                write!(f, "invalid value for `{name}`: {value:?}")
            }
            ConfigError::MissingSecret => write!(
                f,
                "no token secret configured; set `SECRET_KEY` or \
                 `secret_key` in the config file"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_toml(
                &std::fs::read_to_string(path).map_err(ConfigError::Read)?,
            )?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        toml::from_str(src).map_err(ConfigError::Parse)
    }

    /// Applies `DATABASE_URL`, `SECRET_KEY`, `BIND_ADDR` and
    /// `ACCESS_TOKEN_EXPIRE_MINUTES`, as returned by `var`.
    pub fn apply_env(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = var("SECRET_KEY") {
            self.secret_key = Some(secret);
        }
        if let Some(bind) = var("BIND_ADDR") {
            self.bind = bind;
        }
        if let Some(minutes) = var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.access_token_expire_minutes = match minutes.parse() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                        value: minutes,
                    });
                }
            };
        }
        Ok(())
    }

    pub fn token_keys(&self) -> Result<TokenKeys, ConfigError> {
        match self.secret_key.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(TokenKeys::new(
                secret.as_bytes(),
                Duration::minutes(self.access_token_expire_minutes),
            )),
            _ => Err(ConfigError::MissingSecret),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/register", post(do_register))
        .route("/token", post(issue_token))
        .route(
            "/tournaments/",
            post(do_create_tournament).get(list_tournaments),
        )
        .route(
            "/tournaments/:tid",
            put(do_update_tournament).delete(do_delete_tournament),
        )
        .route("/teams/create", post(do_create_team))
        .route("/teams/join/:team_id", post(do_join_team))
        .route("/teams/:team_id/rating", get(get_team_rating))
        .route("/results/", post(do_create_result))
        .route("/ws/notify", get(notify_socket))
        .route("/ws/chat", get(chat_socket))
        .layer(middleware::from_fn(tx_commit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let mut settings = Settings::default();
        settings.apply_env(|_| None).unwrap();

        assert_eq!(settings.bind, "127.0.0.1:8000");
        assert_eq!(settings.database_url, "tourney.db");
        assert_eq!(settings.access_token_expire_minutes, 30);
        assert!(matches!(
            settings.token_keys(),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::from_toml(
            r#"
            bind = "0.0.0.0:9000"
            database_url = "file.db"
            secret_key = "from-file"
            "#,
        )
        .unwrap();

        let env = HashMap::from([
            ("SECRET_KEY", "from-env"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
        ]);
        settings
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.database_url, "file.db");
        assert_eq!(settings.secret_key.as_deref(), Some("from-env"));
        assert_eq!(settings.access_token_expire_minutes, 5);
        assert_eq!(
            settings.token_keys().unwrap().expiry(),
            Duration::minutes(5)
        );
    }

    #[test]
    fn bad_expiry_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|name| {
                (name == "ACCESS_TOKEN_EXPIRE_MINUTES").then(|| "soon".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_toml("colour = \"blue\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
