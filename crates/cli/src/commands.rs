//! CLI commands

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokenward_core::{AuthSnapshot, Claims, CredentialStore, decode_claims};
use tokenward_frontend_common::{AuthStore, RefreshOutcome};
use tracing::info;

use crate::config::{self, Settings};

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a new access token and print its claims
    Refresh,

    /// GET an authenticated endpoint, refreshing the token as needed
    Get {
        /// Path relative to the base URL, e.g. /users/me
        path: String,
    },

    /// Decode a token locally and print its claims
    Decode {
        /// The access token (defaults to the stored credential)
        token: Option<String>,
    },

    /// Store a credential issued by a login flow
    SignIn {
        /// The access token
        token: String,
    },

    /// Remove the stored credential
    SignOut,

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Output file path
        #[arg(default_value = "tokenward.toml")]
        output: PathBuf,
    },

    /// Print the effective configuration
    Show,
}

impl Commands {
    pub async fn execute(self, settings: Settings) -> Result<()> {
        match self {
            Commands::Refresh => {
                let store = mounted_store(&settings).await?;
                print_json(&session_json(&store.snapshot()))
            }
            Commands::Get { path } => {
                let store = mounted_store(&settings).await?;
                let body: Value = store.dispatch().client().get(&path).await?;
                print_json(&body)
            }
            Commands::Decode { token } => {
                let token = match token {
                    Some(token) => token,
                    None => stored_token(&settings)?,
                };
                let claims = decode_claims(&token)?;
                print_json(&claims_json(&claims))
            }
            Commands::SignIn { token } => {
                let auth = settings.auth_config()?;
                let claims = store_credential(
                    settings.credential_store()?.as_ref(),
                    &auth.credential_key,
                    &token,
                )?;
                info!(key = %auth.credential_key, user_id = claims.id, "credential stored");
                print_json(&claims_json(&claims))
            }
            Commands::SignOut => {
                let auth = settings.auth_config()?;
                settings.credential_store()?.remove(&auth.credential_key)?;
                info!(key = %auth.credential_key, "stored credential removed");
                Ok(())
            }
            Commands::Config { command } => command.execute(&settings),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, settings: &Settings) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                if output.exists() {
                    bail!("{} already exists", output.display());
                }
                config::generate_default_config(&output)?;
                println!("Generated configuration at: {}", output.display());
                Ok(())
            }
            ConfigCommands::Show => {
                let auth = settings.auth_config()?;
                print!("{}", toml::to_string_pretty(&auth)?);
                Ok(())
            }
        }
    }
}

async fn mounted_store(settings: &Settings) -> Result<Arc<AuthStore>> {
    let store = AuthStore::from_config(settings.auth_config()?, settings.credential_store()?)?;
    match store.mount().await {
        RefreshOutcome::Refreshed(_) => Ok(store),
        RefreshOutcome::Rejected { status, message } => {
            bail!("token refresh rejected ({status}), sign in again: {message}")
        }
        RefreshOutcome::Stale { reason } => bail!("token refresh failed: {reason}"),
    }
}

/// Validate and persist a token under `key`
fn store_credential(store: &dyn CredentialStore, key: &str, token: &str) -> Result<Claims> {
    let claims = decode_claims(token)?;
    store.set(key, token)?;
    Ok(claims)
}

fn stored_token(settings: &Settings) -> Result<String> {
    let auth = settings.auth_config()?;
    match settings.credential_store()?.get(&auth.credential_key)? {
        Some(token) => Ok(token),
        None => bail!("no stored credential under {:?}, run sign-in first", auth.credential_key),
    }
}

fn claims_json(claims: &Claims) -> Value {
    json!({
        "id": claims.id,
        "email": claims.email,
        "iat": claims.iat,
        "exp": claims.exp,
        "expires_at": DateTime::<Utc>::from_timestamp(claims.exp, 0).map(|t| t.to_rfc3339()),
        "expired": claims.is_expired(),
    })
}

fn session_json(snapshot: &AuthSnapshot) -> Value {
    json!({
        "status": snapshot.status,
        "token": snapshot.token,
        "claims": claims_json(&snapshot.claims),
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
