use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use super::{dto::Pokemon, repo::PokemonStore};
use crate::error::StoreError;

/// Inserts every pokemon from a JSON array file, skipping ids already present.
/// Returns how many were inserted.
pub async fn seed_from_file(store: &dyn PokemonStore, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("read seed file {}", path.display()))?;
    let pokemons: Vec<Pokemon> = serde_json::from_slice(&raw)
        .with_context(|| format!("parse seed file {}", path.display()))?;
    seed(store, &pokemons).await
}

pub async fn seed(store: &dyn PokemonStore, pokemons: &[Pokemon]) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for pokemon in pokemons {
        if let Err(reason) = pokemon.validate() {
            warn!(pokemon_id = pokemon.id, %reason, "skipping invalid seed entry");
            continue;
        }
        match store.create(pokemon).await {
            Ok(()) => inserted += 1,
            Err(StoreError::UniqueViolation(_)) => {}
            Err(e) => return Err(e).context("insert seed pokemon"),
        }
    }
    info!(inserted, total = pokemons.len(), "pokemon seed applied");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemons::{dto::sample, repo::MemoryPokemonStore};

    #[tokio::test]
    async fn seed_skips_existing_and_invalid() {
        let store = MemoryPokemonStore::new();
        store.create(&sample(1, "Bulbizarre", &["Grass"])).await.unwrap();

        let mut invalid = sample(2, "Herbizarre", &["Grass"]);
        invalid.image.clear();

        let inserted = seed(
            &store,
            &[
                sample(1, "Doublon", &["Grass"]),
                invalid,
                sample(3, "Florizarre", &["Grass", "Poison"]),
            ],
        )
        .await
        .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(store.get(1).await.unwrap().unwrap().name.french, "Bulbizarre");
        assert!(store.get(2).await.unwrap().is_none());
        assert!(store.get(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seed_from_missing_file_fails() {
        let store = MemoryPokemonStore::new();
        let err = seed_from_file(&store, Path::new("/nonexistent/pokemons.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("read seed file"));
    }
}
