//! Shopping list aggregation.
//!
//! Every ingredient line of every recipe in a user's shopping list is grouped
//! by `(ingredient name, measurement unit)` and summed. Grouping is by display
//! identity rather than ingredient id, so two ingredient rows sharing a name
//! and unit still merge into one line.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use foodgram_core::{Amount, UserId};

use super::ServiceError;
use crate::db::RecipeRepository;
use crate::db::recipes::ShoppingLine;

/// One aggregated shopping list line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: Amount,
}

/// Group lines by `(name, unit)` and sum their amounts.
///
/// The result is ordered by name, then unit. The sum does not depend on the
/// order of `lines`.
#[must_use]
pub fn aggregate(lines: impl IntoIterator<Item = ShoppingLine>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), Decimal> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(Decimal::ZERO) += line.amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListItem {
            name,
            measurement_unit,
            amount: Amount::from_total(total),
        })
        .collect()
}

/// Render items as CSV records `name,amount,unit`, without a header row.
#[must_use]
pub fn render_csv(items: &[ShoppingListItem]) -> String {
    let mut csv = String::new();
    for item in items {
        let _ = writeln!(
            csv,
            "{},{},{}",
            csv_field(&item.name),
            item.amount,
            csv_field(&item.measurement_unit)
        );
    }
    csv
}

/// Quote a field containing a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Shopping list service.
pub struct ShoppingListService<'a> {
    recipes: RecipeRepository<'a>,
}

impl<'a> ShoppingListService<'a> {
    /// Create a new shopping list service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            recipes: RecipeRepository::new(pool),
        }
    }

    /// Aggregated shopping list of `actor`. Empty when nothing is in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip_all, fields(actor = %actor))]
    pub async fn items(&self, actor: UserId) -> Result<Vec<ShoppingListItem>, ServiceError> {
        let lines = self.recipes.shopping_lines(actor).await?;
        let items = aggregate(lines);
        tracing::debug!(items = items.len(), "Aggregated shopping list");
        Ok(items)
    }

    /// Aggregated shopping list of `actor` as CSV.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn csv(&self, actor: UserId) -> Result<String, ServiceError> {
        Ok(render_csv(&self.items(actor).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i64) -> ShoppingLine {
        ShoppingLine {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            amount: Decimal::from(amount),
        }
    }

    #[test]
    fn test_two_recipes_merge() {
        // recipe A: flour 100 g, sugar 50 g; recipe B: flour 200 g, egg 2 pc
        let items = aggregate([
            line("flour", "g", 100),
            line("sugar", "g", 50),
            line("flour", "g", 200),
            line("egg", "pc", 2),
        ]);

        assert_eq!(render_csv(&items), "egg,2,pc\nflour,300,g\nsugar,50,g\n");
    }

    #[test]
    fn test_order_does_not_matter() {
        let forward = aggregate([line("flour", "g", 100), line("flour", "g", 200)]);
        let backward = aggregate([line("flour", "g", 200), line("flour", "g", 100)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_same_name_different_unit_stays_apart() {
        let items = aggregate([line("salt", "g", 5), line("salt", "pinch", 1)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_fractional_amounts() {
        let items = aggregate([
            ShoppingLine {
                name: "milk".to_owned(),
                measurement_unit: "l".to_owned(),
                amount: Decimal::new(250, 3),
            },
            ShoppingLine {
                name: "milk".to_owned(),
                measurement_unit: "l".to_owned(),
                amount: Decimal::new(25, 2),
            },
        ]);
        assert_eq!(render_csv(&items), "milk,0.5,l\n");
    }

    #[test]
    fn test_empty_list() {
        let items = aggregate(Vec::new());
        assert!(items.is_empty());
        assert_eq!(render_csv(&items), "");
    }

    #[test]
    fn test_fields_are_quoted() {
        let items = aggregate([line("salt, coarse", "\"pinch\"", 1)]);
        assert_eq!(render_csv(&items), "\"salt, coarse\",1,\"\"\"pinch\"\"\"\n");
    }
}
