use serde_json::Value;
use tracing::warn;

use crate::catalog::{self, Catalog, MenuItem, NewMenuItem};
use crate::commands::{begin_flight, UiGuards};
use crate::db::DbState;
use crate::events::{self, StoreEvents};

/// Re-read the catalog and fan the snapshot out to every consumer.
/// A failed snapshot read never fails the mutation that preceded it; the
/// next subscription tick reconciles.
fn push_catalog_snapshot(app: &tauri::AppHandle, events: &StoreEvents, db: &DbState) {
    match catalog::load(db) {
        Ok(snapshot) => events::push_catalog(app, events, snapshot),
        Err(e) => warn!(error = %e, "catalog snapshot after mutation failed"),
    }
}

/// Full catalog for the storefront and admin menu tabs.
/// Seeds the bundled default menu on first run.
#[tauri::command]
pub async fn menu_get(db: tauri::State<'_, DbState>) -> Result<Catalog, String> {
    catalog::load(&db).map_err(|e| e.to_string())
}

/// Admin "add item" form. Single-flight: a second save while one is being
/// persisted is rejected rather than queued.
#[tauri::command]
pub async fn menu_add_item(
    category: String,
    item: NewMenuItem,
    app: tauri::AppHandle,
    db: tauri::State<'_, DbState>,
    events: tauri::State<'_, StoreEvents>,
    guards: tauri::State<'_, UiGuards>,
) -> Result<MenuItem, String> {
    let _flight = begin_flight(&guards.saving_item, "A menu item is already being saved")?;

    let added = catalog::add_item(&db, &category, item).map_err(|e| e.to_string())?;
    push_catalog_snapshot(&app, &events, &db);
    Ok(added)
}

/// Admin "delete item" button. Also the first half of an edit, which is
/// delete-old then add-new.
#[tauri::command]
pub async fn menu_delete_item(
    category: String,
    name: String,
    app: tauri::AppHandle,
    db: tauri::State<'_, DbState>,
    events: tauri::State<'_, StoreEvents>,
) -> Result<Value, String> {
    catalog::delete_item(&db, &category, &name).map_err(|e| e.to_string())?;
    push_catalog_snapshot(&app, &events, &db);
    Ok(serde_json::json!({ "success": true }))
}
