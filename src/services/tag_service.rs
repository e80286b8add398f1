use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::tags::CreateTagRequest,
    entity::tags::{ActiveModel, Column, Entity as Tags, Model as TagModel},
    error::{AppError, AppResult},
    models::Tag,
    state::AppState,
};

const MAX_NAME_LEN: usize = 200;

pub async fn list_tags(state: &AppState) -> AppResult<Vec<Tag>> {
    let tags = Tags::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(tag_from_entity)
        .collect();
    Ok(tags)
}

pub async fn get_tag(state: &AppState, id: Uuid) -> AppResult<Tag> {
    Tags::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(tag_from_entity)
        .ok_or(AppError::NotFound("tag"))
}

pub async fn create_tag(state: &AppState, payload: CreateTagRequest) -> AppResult<Tag> {
    let name = payload.name.trim().to_string();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "tag name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    let color = normalize_color(&payload.color)?;
    validate_slug(&payload.slug)?;

    let taken = Tags::find()
        .filter(
            Condition::any()
                .add(Column::Name.eq(name.clone()))
                .add(Column::Color.eq(color.clone()))
                .add(Column::Slug.eq(payload.slug.clone())),
        )
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation(
            "tag name, color and slug must be unique".into(),
        ));
    }

    let tag = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        color: Set(color),
        slug: Set(payload.slug),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        AppError::on_unique_violation(
            err,
            AppError::Validation("tag name, color and slug must be unique".into()),
        )
    })?;

    tracing::info!(tag_id = %tag.id, slug = %tag.slug, "tag created");
    Ok(tag_from_entity(tag))
}

/// Accepts `#RRGGBB` (any case) and returns it upper-cased.
pub fn normalize_color(color: &str) -> AppResult<String> {
    let hex = color
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| AppError::Validation(format!("{color:?} is not a #RRGGBB color")))?;
    Ok(format!("#{}", hex.to_ascii_uppercase()))
}

pub fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && slug.chars().count() <= MAX_NAME_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::Validation(format!("{slug:?} is not a valid slug")));
    }
    Ok(())
}

pub(crate) fn tag_from_entity(model: TagModel) -> Tag {
    Tag {
        id: model.id,
        name: model.name,
        color: model.color,
        slug: model.slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_normalized() {
        assert_eq!(normalize_color("#e26c2d").unwrap(), "#E26C2D");
    }

    #[test]
    fn malformed_colors_are_rejected() {
        for bad in ["e26c2d", "#e26c2", "#zzzzzz", "#e26c2d0", ""] {
            assert!(
                matches!(normalize_color(bad), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn slug_charset() {
        assert!(validate_slug("breakfast_2-go").is_ok());
        assert!(validate_slug("with space").is_err());
        assert!(validate_slug("").is_err());
    }
}
