//! Menu catalog store.
//!
//! The catalog is one JSON document (category name -> ordered item list)
//! stored wholesale in the `documents` table. Every mutation loads the
//! document, edits it in memory, and writes the entire thing back.
//! Last writer wins under concurrent admins; there is no merge and no
//! optimistic-lock check. Call sites only see load/add/delete, so the
//! overwrite primitive can be swapped later without touching them.
//!
//! Items carry a generated, immutable id; `name` stays the delete/edit key,
//! so renaming an item (delete old + add new) changes its identity.
//!
//! Categories are keyed in a sorted map, so listings come back in
//! lexicographic category order rather than menu-card order. Tab ordering
//! is a presentation concern; the storefront keeps its own display list.
//! Within a category, items keep their insertion order.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, DbState};
use crate::error::StoreError;

/// Bundled first-run menu, mirroring the printed ZahMon menu card.
const DEFAULT_MENU_JSON: &str = include_str!("default_menu.json");

/// The full menu: category name -> ordered item list.
pub type Catalog = BTreeMap<String, Vec<MenuItem>>;

/// A single menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Admin form payload for a new (or re-created) menu entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub price: f64,
    pub image: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse the bundled default menu, assigning fresh ids to every item.
fn default_catalog() -> Result<Catalog, StoreError> {
    let seed: BTreeMap<String, Vec<NewMenuItem>> = serde_json::from_str(DEFAULT_MENU_JSON)?;
    Ok(seed
        .into_iter()
        .map(|(category, items)| {
            let items = items
                .into_iter()
                .map(|item| MenuItem {
                    id: Uuid::new_v4().to_string(),
                    name: item.name,
                    price: item.price,
                    image: item.image,
                    description: item.description,
                })
                .collect();
            (category, items)
        })
        .collect())
}

/// Load the catalog document.
///
/// First-run bootstrap: when no catalog document exists yet, the bundled
/// default menu is written back exactly once and returned.
pub fn load(db: &DbState) -> Result<Catalog, StoreError> {
    let conn = db.lock()?;
    if let Some(raw) = db::get_document(&conn, db::MENU_DOC_KEY)? {
        return Ok(serde_json::from_str(&raw)?);
    }

    let catalog = default_catalog()?;
    save(&conn, &catalog)?;
    info!(categories = catalog.len(), "Seeded default menu catalog");
    Ok(catalog)
}

/// Persist the entire catalog as one document overwrite.
fn save(conn: &Connection, catalog: &Catalog) -> Result<(), StoreError> {
    let raw = serde_json::to_string(catalog)
        .map_err(|e| StoreError::persistence(format!("catalog encode: {e}")))?;
    db::put_document(conn, db::MENU_DOC_KEY, &raw)
}

fn validate_new_item(item: &NewMenuItem) -> Result<(), StoreError> {
    if item.name.trim().is_empty() {
        return Err(StoreError::validation("Item name is required"));
    }
    if item.image.trim().is_empty() {
        return Err(StoreError::validation("Image URL is required"));
    }
    if !item.price.is_finite() || item.price < 0.0 {
        return Err(StoreError::validation("Price must be a non-negative number"));
    }
    Ok(())
}

/// Append an item to a category (creating the category when new), assign a
/// generated id, and persist the whole catalog.
pub fn add_item(
    db: &DbState,
    category: &str,
    new_item: NewMenuItem,
) -> Result<MenuItem, StoreError> {
    validate_new_item(&new_item)?;
    let category = category.trim();
    if category.is_empty() {
        return Err(StoreError::validation("Category is required"));
    }

    let mut catalog = load(db)?;
    let item = MenuItem {
        id: Uuid::new_v4().to_string(),
        name: new_item.name.trim().to_string(),
        price: new_item.price,
        image: new_item.image.trim().to_string(),
        description: new_item.description,
    };
    catalog
        .entry(category.to_string())
        .or_default()
        .push(item.clone());

    let conn = db.lock()?;
    save(&conn, &catalog)?;
    info!(category, item = %item.name, id = %item.id, "Menu item added");
    Ok(item)
}

/// Remove every item in `category` whose name matches, then persist the
/// whole catalog. A missing category or name is a no-op.
pub fn delete_item(db: &DbState, category: &str, name: &str) -> Result<(), StoreError> {
    let mut catalog = load(db)?;
    let Some(items) = catalog.get_mut(category) else {
        return Ok(());
    };

    let before = items.len();
    items.retain(|item| item.name != name);
    if items.len() == before {
        return Ok(());
    }

    let conn = db.lock()?;
    save(&conn, &catalog)?;
    info!(category, item = %name, removed = before - catalog[category].len(), "Menu item deleted");
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_state;

    fn burger(name: &str) -> NewMenuItem {
        NewMenuItem {
            name: name.to_string(),
            price: 140.0,
            image: "/images/burger/classic.jpg".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_first_load_seeds_default_catalog_once() {
        let db = test_state();

        let first = load(&db).expect("first load");
        assert!(!first.is_empty(), "seed catalog should not be empty");
        assert!(first.contains_key("burger"));

        // Second load reads the persisted document; ids are stable.
        let second = load(&db).expect("second load");
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_item_appends_and_persists() {
        let db = test_state();
        load(&db).unwrap();

        let added = add_item(&db, "burger", burger("Double Trouble Burger")).unwrap();
        assert!(!added.id.is_empty());

        let catalog = load(&db).unwrap();
        let names: Vec<_> = catalog["burger"].iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.last(), Some(&"Double Trouble Burger"));
    }

    #[test]
    fn test_add_item_creates_new_category() {
        let db = test_state();

        add_item(&db, "desserts", burger("Chocolate Lava Cake")).unwrap();

        let catalog = load(&db).unwrap();
        assert_eq!(catalog["desserts"].len(), 1);
    }

    #[test]
    fn test_add_item_rejects_bad_input() {
        let db = test_state();

        let err = add_item(&db, "burger", burger("")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let mut no_image = burger("Burger");
        no_image.image = String::new();
        let err = add_item(&db, "burger", no_image).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let mut negative = burger("Burger");
        negative.price = -1.0;
        let err = add_item(&db, "burger", negative).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = add_item(&db, "  ", burger("Burger")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_delete_item_empties_category_and_readd_gets_new_identity() {
        let db = test_state();

        let original = add_item(&db, "desserts", burger("Faluda")).unwrap();
        delete_item(&db, "desserts", "Faluda").unwrap();

        let catalog = load(&db).unwrap();
        assert!(catalog["desserts"].is_empty());

        // Re-adding the same name creates a fresh entry, not the old one.
        let recreated = add_item(&db, "desserts", burger("Faluda")).unwrap();
        assert_ne!(original.id, recreated.id);
    }

    #[test]
    fn test_delete_item_removes_all_matching_names() {
        let db = test_state();

        add_item(&db, "desserts", burger("Faluda")).unwrap();
        add_item(&db, "desserts", burger("Faluda")).unwrap();
        add_item(&db, "desserts", burger("Kheer")).unwrap();

        delete_item(&db, "desserts", "Faluda").unwrap();

        let catalog = load(&db).unwrap();
        let names: Vec<_> = catalog["desserts"].iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Kheer"]);
    }

    #[test]
    fn test_categories_list_in_lexicographic_order() {
        let db = test_state();
        add_item(&db, "soups", burger("Thai Soup")).unwrap();
        add_item(&db, "appetizers", burger("Spring Roll")).unwrap();

        let listed: Vec<_> = load(&db).unwrap().into_keys().collect();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }

    #[test]
    fn test_delete_item_missing_category_is_noop() {
        let db = test_state();
        load(&db).unwrap();

        delete_item(&db, "no_such_category", "Anything").unwrap();
        delete_item(&db, "burger", "No Such Item").unwrap();
    }
}
