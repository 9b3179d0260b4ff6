use sqlx::{types::Json, FromRow};

use super::dto::{BaseStats, Pokemon, PokemonName};

/// Row shape of the `pokemons` table.
#[derive(Debug, FromRow)]
pub struct PokemonRow {
    pub id: i32,
    pub name: Json<PokemonName>,
    #[sqlx(rename = "type")]
    pub types: Vec<String>,
    pub base: Json<BaseStats>,
    pub image: String,
}

impl From<PokemonRow> for Pokemon {
    fn from(r: PokemonRow) -> Self {
        Self {
            id: r.id,
            name: r.name.0,
            types: r.types,
            base: r.base.0,
            image: r.image,
        }
    }
}
