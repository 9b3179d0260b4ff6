use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{ListQuery, Pokemon, PokemonPage, PokemonPatch, PAGE_SIZE};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, StoreError},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemons", get(list_pokemons))
        .route("/pokemons/:id", get(get_pokemon))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemons", post(create_pokemon))
        .route("/pokemons/:id", put(update_pokemon).delete(delete_pokemon))
}

#[instrument(skip(state))]
pub async fn list_pokemons(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PokemonPage>, AppError> {
    let Query(q) = query?;
    let (results, total) = state
        .pokemons
        .list(&q.filter(), PAGE_SIZE, q.offset())
        .await?;
    Ok(Json(PokemonPage { results, total }))
}

#[instrument(skip(state))]
pub async fn get_pokemon(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Pokemon>, AppError> {
    let Path(id) = id?;
    state
        .pokemons
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Pokemon not found".into()))
}

#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn create_pokemon(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<Pokemon>, JsonRejection>,
) -> Result<(StatusCode, &'static str), AppError> {
    let Json(pokemon) = body?;
    pokemon.validate().map_err(AppError::Validation)?;

    match state.pokemons.create(&pokemon).await {
        Ok(()) => {}
        Err(StoreError::UniqueViolation(_)) => {
            warn!(pokemon_id = pokemon.id, "pokemon id already exists");
            return Err(AppError::Conflict("Pokemon id already exists".into()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(pokemon_id = pokemon.id, "pokemon created");
    Ok((StatusCode::CREATED, "Pokemon created successfully"))
}

#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn update_pokemon(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<PokemonPatch>, JsonRejection>,
) -> Result<&'static str, AppError> {
    let Path(id) = id?;
    let Json(patch) = body?;
    patch.validate().map_err(AppError::Validation)?;

    if !state.pokemons.update(id, &patch).await? {
        return Err(AppError::NotFound(
            "Pokemon not found or no changes made".into(),
        ));
    }
    info!(pokemon_id = id, "pokemon updated");
    Ok("Pokemon updated successfully")
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_pokemon(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<&'static str, AppError> {
    let Path(id) = id?;
    if !state.pokemons.delete(id).await? {
        return Err(AppError::NotFound("Pokemon not found".into()));
    }
    info!(pokemon_id = id, "pokemon deleted");
    Ok("Pokemon deleted successfully")
}
