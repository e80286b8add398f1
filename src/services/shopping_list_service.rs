use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::{
        ingredients::{self, Entity as Ingredients},
        recipe_ingredients::{self, Entity as RecipeIngredients},
    },
    error::AppResult,
    models::{ShoppingLine, ShoppingReport},
    services::relation_service,
};

/// Merge the ingredient lines of every recipe in the user's shopping list.
/// Read-only; an empty list yields an empty report.
pub async fn shopping_list_report<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<ShoppingReport> {
    let recipe_ids = relation_service::list_shopping_list_recipe_ids(db, user_id).await?;
    if recipe_ids.is_empty() {
        return Ok(ShoppingReport::default());
    }

    let lines = RecipeIngredients::find()
        .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.clone()))
        .find_also_related(Ingredients)
        .order_by_asc(ingredients::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(line, ingredient)| {
            ingredient.map(|ingredient| ShoppingLine {
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: line.amount,
            })
        });

    let report = ShoppingReport {
        items: aggregate_lines(lines),
    };
    tracing::debug!(
        %user_id,
        recipes = recipe_ids.len(),
        lines = report.items.len(),
        "shopping list aggregated"
    );
    Ok(report)
}

/// Group lines by `(name, measurement_unit)` and sum their amounts. Groups
/// keep the order in which they first appear.
pub fn aggregate_lines<I>(lines: I) -> Vec<ShoppingLine>
where
    I: IntoIterator<Item = ShoppingLine>,
{
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut merged: Vec<ShoppingLine> = Vec::new();

    for line in lines {
        let key = (line.name.clone(), line.measurement_unit.clone());
        match index.get(&key) {
            Some(&pos) => merged[pos].amount += line.amount,
            None => {
                index.insert(key, merged.len());
                merged.push(line);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: f64) -> ShoppingLine {
        ShoppingLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn same_name_and_unit_are_summed() {
        let merged = aggregate_lines(vec![
            line("Salt", "g", 5.0),
            line("Flour", "g", 200.0),
            line("Salt", "g", 10.0),
        ]);
        assert_eq!(merged, vec![line("Salt", "g", 15.0), line("Flour", "g", 200.0)]);
    }

    #[test]
    fn different_units_stay_apart() {
        let merged = aggregate_lines(vec![line("Milk", "ml", 200.0), line("Milk", "cup", 1.0)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate_lines(Vec::new()).is_empty());
    }

    #[test]
    fn report_renders_one_entry_per_line() {
        let report = ShoppingReport {
            items: vec![line("Salt", "g", 15.0), line("Milk", "ml", 2.5)],
        };
        assert_eq!(report.render(), "Salt (g) — 15;\n\nMilk (ml) — 2.5;\n\n");
    }
}
