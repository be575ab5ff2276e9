//! Recipe search query from the current inventory

use crate::model::Ingredient;

const SEPARATOR: &str = ", ";

/// Ingredient names joined for a recipe search
///
/// `None` when there is nothing to search with, which callers show as
/// "no ingredients available".
pub fn ingredient_query(snapshot: &[Ingredient]) -> Option<String> {
    let names: Vec<&str> = snapshot
        .iter()
        .map(|i| i.name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names.join(SEPARATOR))
    }
}
