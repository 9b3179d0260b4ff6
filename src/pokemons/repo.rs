use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;

use super::dto::{Pokemon, PokemonFilter, PokemonPatch};
use super::repo_types::PokemonRow;
use crate::error::StoreError;

#[async_trait]
pub trait PokemonStore: Send + Sync {
    /// Returns one page of matches ordered by id, plus the total match count.
    async fn list(
        &self,
        filter: &PokemonFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Pokemon>, i64), StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Pokemon>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the id is taken.
    async fn create(&self, pokemon: &Pokemon) -> Result<(), StoreError>;

    /// Returns `false` when the id is unknown or the patch changes nothing.
    async fn update(&self, id: i32, patch: &PokemonPatch) -> Result<bool, StoreError>;

    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

pub struct PgPokemonStore {
    db: PgPool,
}

impl PgPokemonStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Wraps a user-supplied fragment for ILIKE substring matching.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl PokemonStore for PgPokemonStore {
    async fn list(
        &self,
        filter: &PokemonFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Pokemon>, i64), StoreError> {
        let name = filter.name.as_deref().map(like_pattern);
        let kind = filter.kind.as_deref().map(like_pattern);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM pokemons
            WHERE ($1::text IS NULL OR name->>'french' ILIKE $1)
              AND ($2::text IS NULL OR EXISTS (SELECT 1 FROM unnest("type") AS t WHERE t ILIKE $2))
            "#,
        )
        .bind(&name)
        .bind(&kind)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, PokemonRow>(
            r#"
            SELECT id, name, "type", base, image
            FROM pokemons
            WHERE ($1::text IS NULL OR name->>'french' ILIKE $1)
              AND ($2::text IS NULL OR EXISTS (SELECT 1 FROM unnest("type") AS t WHERE t ILIKE $2))
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&name)
        .bind(&kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok((rows.into_iter().map(Pokemon::from).collect(), total))
    }

    async fn get(&self, id: i32) -> Result<Option<Pokemon>, StoreError> {
        let row = sqlx::query_as::<_, PokemonRow>(
            r#"SELECT id, name, "type", base, image FROM pokemons WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Pokemon::from))
    }

    async fn create(&self, pokemon: &Pokemon) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pokemons (id, name, "type", base, image)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(pokemon.id)
        .bind(Json(&pokemon.name))
        .bind(&pokemon.types)
        .bind(Json(&pokemon.base))
        .bind(&pokemon.image)
        .execute(&self.db)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update(&self, id: i32, patch: &PokemonPatch) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pokemons
            SET name    = COALESCE($2, name),
                "type"  = COALESCE($3, "type"),
                base    = COALESCE($4, base),
                image   = COALESCE($5, image)
            WHERE id = $1
              AND (name, "type", base, image) IS DISTINCT FROM
                  (COALESCE($2, name), COALESCE($3, "type"), COALESCE($4, base), COALESCE($5, image))
            "#,
        )
        .bind(id)
        .bind(patch.name.as_ref().map(Json))
        .bind(patch.types.as_ref())
        .bind(patch.base.as_ref().map(Json))
        .bind(patch.image.as_deref())
        .execute(&self.db)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pokemons WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-process store used by tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryPokemonStore {
    pokemons: RwLock<BTreeMap<i32, Pokemon>>,
}

impl MemoryPokemonStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn is_match(p: &Pokemon, filter: &PokemonFilter) -> bool {
    let name_ok = filter
        .name
        .as_deref()
        .map_or(true, |n| contains_ci(&p.name.french, n));
    let kind_ok = filter
        .kind
        .as_deref()
        .map_or(true, |k| p.types.iter().any(|t| contains_ci(t, k)));
    name_ok && kind_ok
}

#[async_trait]
impl PokemonStore for MemoryPokemonStore {
    async fn list(
        &self,
        filter: &PokemonFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Pokemon>, i64), StoreError> {
        let pokemons = self.pokemons.read().await;
        let hits: Vec<&Pokemon> = pokemons.values().filter(|p| is_match(p, filter)).collect();
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: i32) -> Result<Option<Pokemon>, StoreError> {
        Ok(self.pokemons.read().await.get(&id).cloned())
    }

    async fn create(&self, pokemon: &Pokemon) -> Result<(), StoreError> {
        let mut pokemons = self.pokemons.write().await;
        if pokemons.contains_key(&pokemon.id) {
            return Err(StoreError::UniqueViolation("pokemons_pkey".into()));
        }
        pokemons.insert(pokemon.id, pokemon.clone());
        Ok(())
    }

    async fn update(&self, id: i32, patch: &PokemonPatch) -> Result<bool, StoreError> {
        let mut pokemons = self.pokemons.write().await;
        Ok(pokemons
            .get_mut(&id)
            .map_or(false, |existing| patch.apply(existing)))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.pokemons.write().await.remove(&id).is_some())
    }
}
