use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict};
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    entity::ingredients::{ActiveModel, Column, Entity as Ingredients, Model as IngredientModel},
    error::{AppError, AppResult},
    models::Ingredient,
    state::AppState,
};

pub const LOOKUP_LIMIT: usize = 10;

/// Autocomplete lookup: names starting with `query` come first, then names
/// that merely contain it, each tier in name order. At most
/// [`LOOKUP_LIMIT`] entries.
pub async fn lookup(state: &AppState, query: &str) -> AppResult<Vec<Ingredient>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    // SQLite's lower() folds ASCII only; non-ASCII needles are matched here.
    if !needle.is_ascii() && state.orm.get_database_backend() == DbBackend::Sqlite {
        let candidates = Ingredients::find()
            .order_by_asc(Column::Name)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(ingredient_from_entity);
        return Ok(rank_matches(candidates, &needle).collect());
    }

    let escaped = escape_like(&needle);
    let prefix = || like_pattern(format!("{escaped}%"));
    let lowered = || Expr::expr(Func::lower(Expr::col(Column::Name)));

    let mut found: Vec<Ingredient> = Ingredients::find()
        .filter(lowered().like(prefix()))
        .order_by_asc(Column::Name)
        .limit(LOOKUP_LIMIT as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ingredient_from_entity)
        .collect();

    if found.len() < LOOKUP_LIMIT {
        let contained = Ingredients::find()
            .filter(lowered().like(like_pattern(format!("%{escaped}%"))))
            .filter(lowered().not_like(prefix()))
            .order_by_asc(Column::Name)
            .limit((LOOKUP_LIMIT - found.len()) as u64)
            .all(&state.orm)
            .await?;
        found.extend(contained.into_iter().map(ingredient_from_entity));
    }

    Ok(found)
}

fn like_pattern(pattern: String) -> LikeExpr {
    LikeExpr::new(pattern).escape('\\')
}

/// Escape LIKE wildcards so user input only matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Stable two-tier ranking over name-ordered candidates. Candidates that do
/// not contain `needle` at all are dropped.
pub fn rank_matches<I>(candidates: I, needle: &str) -> impl Iterator<Item = Ingredient>
where
    I: IntoIterator<Item = Ingredient>,
{
    let needle = needle.to_lowercase();
    let (mut prefixed, contained): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .partition(|item| item.name.to_lowercase().starts_with(&needle));
    prefixed.extend(contained);
    prefixed.into_iter().take(LOOKUP_LIMIT)
}

pub async fn list_ingredients(state: &AppState, name: Option<&str>) -> AppResult<Vec<Ingredient>> {
    if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
        return lookup(state, name).await;
    }

    let items = Ingredients::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ingredient_from_entity)
        .collect();
    Ok(items)
}

pub async fn get_ingredient(state: &AppState, id: Uuid) -> AppResult<Ingredient> {
    Ingredients::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(ingredient_from_entity)
        .ok_or(AppError::NotFound("ingredient"))
}

/// Bulk-load `(name, measurement_unit)` pairs. Names already in the catalog
/// are skipped. Returns the number of rows inserted.
pub async fn load_catalog<C, I>(db: &C, entries: I) -> AppResult<u64>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = (String, String)>,
{
    let mut inserted = 0;
    for (name, measurement_unit) in entries {
        let name = name.trim().to_string();
        let measurement_unit = measurement_unit.trim().to_string();
        if name.is_empty() || measurement_unit.is_empty() {
            tracing::warn!(%name, "skipping incomplete catalog entry");
            continue;
        }

        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            measurement_unit: Set(measurement_unit),
        };
        inserted += Ingredients::insert(active)
            .on_conflict(OnConflict::column(Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    tracing::info!(inserted, "ingredient catalog loaded");
    Ok(inserted)
}

pub(crate) fn ingredient_from_entity(model: IngredientModel) -> Ingredient {
    Ingredient {
        id: model.id,
        name: model.name,
        measurement_unit: model.measurement_unit,
    }
}
