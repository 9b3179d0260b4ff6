use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL; in-memory stores are used when absent.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// JSON array of pokemons inserted at startup, if set.
    pub seed_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pokedex-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pokedex-users".into()),
        };
        let seed_file = std::env::var("POKEMON_SEED_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self {
            database_url,
            jwt,
            seed_file,
        })
    }
}
