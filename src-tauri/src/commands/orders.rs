use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::cart::CartState;
use crate::commands::{begin_flight, UiGuards};
use crate::db::DbState;
use crate::error::StoreError;
use crate::events::{self, StoreEvents};
use crate::orders::{self, Order, OrderDraft, OrderItem, PaymentMethod};

/// Checkout form payload; the item snapshots come from the cart, not the
/// caller, so the UI cannot submit prices the shopper never saw.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub location: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub trx_id: Option<String>,
}

/// The checkout flow: snapshot the cart, validate, persist the order,
/// then (and only then) clear the cart. On any failure the cart is left
/// untouched so the shopper can retry.
pub(crate) fn checkout(
    db: &DbState,
    cart: &CartState,
    payload: CheckoutPayload,
) -> Result<Order, StoreError> {
    let items: Vec<OrderItem> = cart
        .snapshot()
        .into_iter()
        .map(|line| OrderItem {
            name: line.name,
            quantity: line.quantity,
            price: line.price,
        })
        .collect();

    let draft = OrderDraft {
        items,
        location: payload.location,
        phone: payload.phone,
        payment_method: payload.payment_method,
        trx_id: payload.trx_id,
    };

    let order = orders::place_order(db, draft)?;

    // The write is durable; clearing the cart exactly once comes after.
    cart.clear();
    Ok(order)
}

fn push_orders_snapshot(app: &tauri::AppHandle, events: &StoreEvents, db: &DbState) {
    match orders::get_all(db) {
        Ok(snapshot) => events::push_orders(app, events, snapshot),
        Err(e) => warn!(error = %e, "order snapshot after mutation failed"),
    }
}

/// Place the shopper's order. Single-flight app-wide: a second submission
/// from any window is rejected while one is still being persisted.
#[tauri::command]
pub async fn order_place(
    payload: CheckoutPayload,
    app: tauri::AppHandle,
    db: tauri::State<'_, DbState>,
    cart: tauri::State<'_, CartState>,
    events: tauri::State<'_, StoreEvents>,
    guards: tauri::State<'_, UiGuards>,
) -> Result<Order, String> {
    let _flight = begin_flight(&guards.placing_order, "Your order is already being placed")?;

    let order = checkout(&db, &cart, payload).map_err(|e| e.to_string())?;
    push_orders_snapshot(&app, &events, &db);
    Ok(order)
}

/// The live queue for the admin console, newest first.
#[tauri::command]
pub async fn order_get_all(db: tauri::State<'_, DbState>) -> Result<Vec<Order>, String> {
    orders::get_all(&db).map_err(|e| e.to_string())
}

/// Admin "mark done": removes the order from the queue. Idempotent.
#[tauri::command]
pub async fn order_complete(
    order_id: String,
    app: tauri::AppHandle,
    db: tauri::State<'_, DbState>,
    events: tauri::State<'_, StoreEvents>,
) -> Result<Value, String> {
    orders::complete_order(&db, &order_id).map_err(|e| e.to_string())?;
    push_orders_snapshot(&app, &events, &db);
    Ok(serde_json::json!({ "success": true }))
}

/// Admin "clear all live orders". Deletions are independent; a partial
/// failure surfaces as one aggregate error and the queue stays partially
/// cleared.
#[tauri::command]
pub async fn orders_clear_all(
    app: tauri::AppHandle,
    db: tauri::State<'_, DbState>,
    events: tauri::State<'_, StoreEvents>,
) -> Result<Value, String> {
    let result = orders::clear_all(&db);
    // Even a partial clear changed the queue; let consumers see it.
    push_orders_snapshot(&app, &events, &db);

    let cleared = result.map_err(|e| e.to_string())?;
    Ok(serde_json::json!({ "success": true, "cleared": cleared }))
}

// ===========================================================================
// Tests
// ===========================================================================
