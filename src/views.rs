//! Derived views over the in-memory collections. Everything here is a pure
//! function recomputed per request; the inputs are small and nothing is
//! cached.

use time::{Date, Duration};

use crate::domain::{
    new_id, parse_ymd, Category, GroceryItem, InventoryItem, Recipe, WasteRecord,
};

/// Calendar window for the expiring-soon view.
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

/// Items whose expiry date is on or before today + 7 days. Warranty entries
/// never qualify regardless of date; unparseable dates are skipped.
pub fn expiring_soon<'a>(inventory: &'a [InventoryItem], today: Date) -> Vec<&'a InventoryItem> {
    let cutoff = today + Duration::days(EXPIRY_WINDOW_DAYS);
    inventory
        .iter()
        .filter(|item| item.category != Category::Warranty)
        .filter(|item| matches!(parse_ymd(&item.expiry_date), Some(d) if d <= cutoff))
        .collect()
}

/// Items at or below their low-stock threshold.
pub fn low_stock(inventory: &[InventoryItem]) -> Vec<&InventoryItem> {
    inventory
        .iter()
        .filter(|item| item.quantity <= item.min_stock())
        .collect()
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub category: Category,
    pub value: f64,
}

/// Item counts per category, zero buckets dropped.
pub fn stock_by_category(inventory: &[InventoryItem]) -> Vec<CategorySlice> {
    Category::ALL
        .iter()
        .map(|&category| CategorySlice {
            category,
            value: inventory.iter().filter(|i| i.category == category).count() as f64,
        })
        .filter(|slice| slice.value > 0.0)
        .collect()
}

/// Wasted quantity per category, zero buckets dropped. A record with a
/// zero or missing quantity still counts as one wasted unit.
pub fn waste_by_category(waste: &[WasteRecord]) -> Vec<CategorySlice> {
    Category::ALL
        .iter()
        .map(|&category| CategorySlice {
            category,
            value: waste
                .iter()
                .filter(|w| w.category == category)
                .map(|w| if w.quantity > 0.0 { w.quantity } else { 1.0 })
                .sum(),
        })
        .filter(|slice| slice.value > 0.0)
        .collect()
}

/// Auto-suggested grocery entries: the union of low-stock names and names
/// of items already expired (strictly before today), minus anything the
/// saved list already carries under a case-insensitive name match. When a
/// name is both expired and low on stock, the expired reason wins.
pub fn suggest_groceries(
    inventory: &[InventoryItem],
    saved: &[GroceryItem],
    today: Date,
) -> Vec<GroceryItem> {
    let expired: Vec<&InventoryItem> = inventory
        .iter()
        .filter(|item| matches!(parse_ymd(&item.expiry_date), Some(d) if d < today))
        .collect();

    let mut names: Vec<&str> = Vec::new();
    for item in low_stock(inventory).iter().chain(expired.iter()) {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(&item.name)) {
            names.push(&item.name);
        }
    }

    names
        .into_iter()
        .filter(|name| {
            !saved
                .iter()
                .any(|entry| entry.name.eq_ignore_ascii_case(name))
        })
        .map(|name| {
            let inv = inventory.iter().find(|i| i.name == name);
            let is_expired = expired.iter().any(|i| i.name == name);
            GroceryItem {
                id: format!("suggest_{}_{}", name.replace(' ', "_"), new_id()),
                name: name.to_string(),
                qty: inv.map(|i| i.min_stock()).unwrap_or(2.0),
                unit: inv.map(|i| i.unit.clone()).unwrap_or_else(|| "pcs".into()),
                reason: if is_expired {
                    "Auto: Expired".into()
                } else {
                    "Auto: Low Stock".into()
                },
            }
        })
        .collect()
}

/// Consumes a cooked recipe from the inventory.
///
/// Matching strategy (no exact-match guarantee exists between recipe
/// ingredient names and inventory names): an ingredient claims the first
/// not-yet-consumed item whose name matches case-insensitively by substring
/// in either direction. The claimed item is decremented by the leading
/// number of the ingredient's free-text amount, defaulting to 1 when none
/// parses, and removed once its quantity reaches zero. Returns the names of
/// the items that were decremented.
pub fn cook_recipe(inventory: &mut Vec<InventoryItem>, recipe: &Recipe) -> Vec<String> {
    let mut consumed_ids: Vec<String> = Vec::new();
    let mut consumed_names: Vec<String> = Vec::new();

    for ingredient in &recipe.ingredients {
        let wanted = ingredient.name.to_lowercase();
        let found = inventory.iter_mut().find(|item| {
            if consumed_ids.contains(&item.id) {
                return false;
            }
            let have = item.name.to_lowercase();
            have.contains(&wanted) || wanted.contains(&have)
        });
        if let Some(item) = found {
            item.quantity = (item.quantity - leading_amount(&ingredient.amount)).max(0.0);
            consumed_ids.push(item.id.clone());
            consumed_names.push(item.name.clone());
        }
    }

    inventory.retain(|item| item.quantity > 0.0 || !consumed_ids.contains(&item.id));
    consumed_names
}

/// Leading number of a free-text amount like "2 cups" or "1.5 l"; 1 when
/// the amount does not start with a number.
fn leading_amount(amount: &str) -> f64 {
    let numeric: String = amount
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok().filter(|n: &f64| *n > 0.0).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecipeIngredient;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 08 - 25);

    fn item(name: &str, category: Category, quantity: f64, expiry: &str) -> InventoryItem {
        InventoryItem {
            id: new_id(),
            name: name.into(),
            category,
            quantity,
            unit: "pcs".into(),
            purchase_date: "2026-08-20".into(),
            expiry_date: expiry.into(),
            min_stock_level: Some(2.0),
        }
    }

    #[test]
    fn expiring_soon_boundary_is_inclusive_at_seven_days() {
        let inventory = vec![
            item("Milk", Category::Dairy, 1.0, "2026-09-01"), // today + 7
            item("Rice", Category::Grains, 1.0, "2026-09-02"), // today + 8
        ];
        let soon = expiring_soon(&inventory, TODAY);
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].name, "Milk");
    }

    #[test]
    fn expiring_soon_never_includes_warranty_items() {
        let inventory = vec![item("Blender", Category::Warranty, 1.0, "2026-08-26")];
        assert!(expiring_soon(&inventory, TODAY).is_empty());
    }

    #[test]
    fn expiring_soon_skips_unparseable_dates() {
        let inventory = vec![item("Jam", Category::Pantry, 1.0, "unknown")];
        assert!(expiring_soon(&inventory, TODAY).is_empty());
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        let inventory = vec![
            item("Eggs", Category::Dairy, 2.0, "2099-01-01"),
            item("Flour", Category::Grains, 3.0, "2099-01-01"),
        ];
        let low = low_stock(&inventory);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Eggs");
    }

    #[test]
    fn stock_by_category_drops_zero_buckets() {
        let inventory = vec![
            item("Milk", Category::Dairy, 1.0, "2099-01-01"),
            item("Cheese", Category::Dairy, 1.0, "2099-01-01"),
            item("Apple", Category::Fruits, 1.0, "2099-01-01"),
        ];
        let slices = stock_by_category(&inventory);
        assert_eq!(slices.len(), 2);
        assert!(slices
            .iter()
            .any(|s| s.category == Category::Dairy && s.value == 2.0));
        assert!(slices.iter().all(|s| s.value > 0.0));
    }

    #[test]
    fn waste_counts_zero_quantity_as_one_unit() {
        let waste = vec![
            WasteRecord {
                id: new_id(),
                item_name: "Milk".into(),
                date: "2026-08-24".into(),
                quantity: 0.0,
                category: Category::Dairy,
            },
            WasteRecord {
                id: new_id(),
                item_name: "Yogurt".into(),
                date: "2026-08-24".into(),
                quantity: 2.0,
                category: Category::Dairy,
            },
        ];
        let slices = waste_by_category(&waste);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].value, 3.0);
    }

    #[test]
    fn low_stock_item_is_suggested_with_low_stock_reason() {
        let inventory = vec![item("Milk", Category::Dairy, 1.0, "2099-01-01")];
        let suggestions = suggest_groceries(&inventory, &[], TODAY);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "Milk");
        assert_eq!(suggestions[0].reason, "Auto: Low Stock");
        assert_eq!(suggestions[0].qty, 2.0);
    }

    #[test]
    fn expired_reason_takes_precedence_over_low_stock() {
        // Low on stock and already expired: one suggestion, expired reason.
        let inventory = vec![item("Milk", Category::Dairy, 1.0, "2026-08-20")];
        let suggestions = suggest_groceries(&inventory, &[], TODAY);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].reason, "Auto: Expired");
    }

    #[test]
    fn expiry_today_is_not_expired_for_suggestions() {
        let inventory = vec![item("Milk", Category::Dairy, 5.0, "2026-08-25")];
        assert!(suggest_groceries(&inventory, &[], TODAY).is_empty());
    }

    #[test]
    fn saved_list_suppresses_suggestions_case_insensitively() {
        let inventory = vec![item("Milk", Category::Dairy, 1.0, "2099-01-01")];
        let saved = vec![GroceryItem {
            id: "g1".into(),
            name: "MILK".into(),
            qty: 1.0,
            unit: "l".into(),
            reason: "Manual".into(),
        }];
        assert!(suggest_groceries(&inventory, &saved, TODAY).is_empty());
    }

    fn recipe(ingredients: Vec<(&str, &str)>) -> Recipe {
        Recipe {
            id: new_id(),
            title: "Test".into(),
            ingredients: ingredients
                .into_iter()
                .map(|(name, amount)| RecipeIngredient {
                    name: name.into(),
                    amount: amount.into(),
                })
                .collect(),
            instructions: vec![],
            prep_time: "10 min".into(),
            matching_items: vec![],
        }
    }

    #[test]
    fn cook_decrements_by_leading_amount_and_matches_substrings() {
        let mut inventory = vec![
            item("Whole Milk", Category::Dairy, 3.0, "2099-01-01"),
            item("Eggs", Category::Dairy, 6.0, "2099-01-01"),
        ];
        let consumed = cook_recipe(&mut inventory, &recipe(vec![("milk", "2 cups"), ("egg", "3")]));
        assert_eq!(consumed, vec!["Whole Milk".to_string(), "Eggs".to_string()]);
        assert_eq!(inventory[0].quantity, 1.0);
        assert_eq!(inventory[1].quantity, 3.0);
    }

    #[test]
    fn cook_removes_items_that_reach_zero() {
        let mut inventory = vec![item("Butter", Category::Dairy, 1.0, "2099-01-01")];
        cook_recipe(&mut inventory, &recipe(vec![("butter", "1 stick")]));
        assert!(inventory.is_empty());
    }

    #[test]
    fn cook_defaults_to_one_when_amount_has_no_number() {
        let mut inventory = vec![item("Salt", Category::Pantry, 5.0, "2099-01-01")];
        cook_recipe(&mut inventory, &recipe(vec![("salt", "a pinch")]));
        assert_eq!(inventory[0].quantity, 4.0);
    }

    #[test]
    fn cook_consumes_each_item_at_most_once() {
        let mut inventory = vec![item("Milk", Category::Dairy, 5.0, "2099-01-01")];
        let consumed = cook_recipe(
            &mut inventory,
            &recipe(vec![("milk", "1"), ("milk foam", "1")]),
        );
        assert_eq!(consumed.len(), 1);
        assert_eq!(inventory[0].quantity, 4.0);
    }

    #[test]
    fn cook_leaves_unmatched_ingredients_alone() {
        let mut inventory = vec![item("Rice", Category::Grains, 2.0, "2099-01-01")];
        let consumed = cook_recipe(&mut inventory, &recipe(vec![("saffron", "1 g")]));
        assert!(consumed.is_empty());
        assert_eq!(inventory[0].quantity, 2.0);
    }
}
