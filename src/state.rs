use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::{
    jwt::JwtKeys,
    repo::{MemoryUserStore, PgUserStore, UserStore},
};
use crate::config::AppConfig;
use crate::pokemons::repo::{MemoryPokemonStore, PgPokemonStore, PokemonStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub pokemons: Arc<dyn PokemonStore>,
    pub jwt: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let jwt = JwtKeys::new(&config.jwt).context("invalid JWT configuration")?;

        let Some(database_url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set; using in-memory stores, data will not persist");
            return Ok(Self::from_parts(
                Arc::new(MemoryUserStore::new()),
                Arc::new(MemoryPokemonStore::new()),
                jwt,
                config,
            ));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("database migrations applied");

        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgPokemonStore::new(db)),
            jwt,
            config,
        ))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        pokemons: Arc<dyn PokemonStore>,
        jwt: JwtKeys,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            pokemons,
            jwt,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
            seed_file: None,
        });
        let jwt = JwtKeys::new(&config.jwt).expect("test jwt config");
        Self::from_parts(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryPokemonStore::new()),
            jwt,
            config,
        )
    }
}
