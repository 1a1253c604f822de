//! Live order queue.
//!
//! Each order is its own document (one row), so concurrent shoppers never
//! contend the way concurrent admin catalog edits do. Orders snapshot item
//! name/quantity/price at placement time; later menu price changes do not
//! touch placed orders. "Completing" an order deletes it -- the queue keeps
//! no history, matching the storefront's observed behavior.

use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbState;
use crate::error::StoreError;

/// Flat fee added to every order at placement time.
pub const DELIVERY_FEE: f64 = 60.0;

/// Minimum digits for a valid Bangladeshi phone number.
pub const MIN_PHONE_DIGITS: usize = 11;

/// How the shopper pays. A label only; there is no payment integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bkash,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bkash => "bkash",
        }
    }

    fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "bkash" => Ok(PaymentMethod::Bkash),
            other => Err(StoreError::persistence(format!(
                "unknown payment method in store: {other}"
            ))),
        }
    }
}

/// A snapshotted line inside an order, decoupled from the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// A placed order as persisted and as shown on the admin console.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub location: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub trx_id: Option<String>,
    pub status: String,
    pub placed_at: i64,
}

/// Checkout form payload, validated before anything is written.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub location: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub trx_id: Option<String>,
}

fn validate_draft(draft: &OrderDraft) -> Result<(), StoreError> {
    if draft.items.is_empty() {
        return Err(StoreError::validation("Your cart is empty"));
    }
    if draft.location.trim().is_empty() {
        return Err(StoreError::validation("Delivery location is required"));
    }
    let digits = draft.phone.chars().filter(char::is_ascii_digit).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(StoreError::validation(
            "A valid phone number (at least 11 digits) is required",
        ));
    }
    if draft.payment_method == PaymentMethod::Bkash
        && draft
            .trx_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        return Err(StoreError::validation(
            "bKash transaction ID is required for bKash payments",
        ));
    }
    Ok(())
}

/// Validate the draft and append one order document to the queue.
///
/// Does not mutate the catalog or the cart; the caller clears the cart
/// only after this resolves successfully.
pub fn place_order(db: &DbState, draft: OrderDraft) -> Result<Order, StoreError> {
    validate_draft(&draft)?;

    let subtotal: f64 = draft
        .items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum();

    let order = Order {
        id: Uuid::new_v4().to_string(),
        items: draft.items,
        subtotal,
        delivery_fee: DELIVERY_FEE,
        total: subtotal + DELIVERY_FEE,
        location: draft.location.trim().to_string(),
        phone: draft.phone.trim().to_string(),
        payment_method: draft.payment_method,
        trx_id: draft.trx_id.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        status: "pending".to_string(),
        placed_at: Utc::now().timestamp_millis(),
    };

    let items_json = serde_json::to_string(&order.items)
        .map_err(|e| StoreError::persistence(format!("order items encode: {e}")))?;

    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO orders (id, items, subtotal, delivery_fee, total,
                             location, phone, payment_method, trx_id, status, placed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            order.id,
            items_json,
            order.subtotal,
            order.delivery_fee,
            order.total,
            order.location,
            order.phone,
            order.payment_method.as_str(),
            order.trx_id,
            order.status,
            order.placed_at,
        ],
    )?;

    info!(order_id = %order.id, total = order.total, "Order placed");
    Ok(order)
}

/// The live queue, newest first.
pub fn get_all(db: &DbState) -> Result<Vec<Order>, StoreError> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(
        "SELECT id, items, subtotal, delivery_fee, total,
                location, phone, payment_method, trx_id, status, placed_at
         FROM orders
         ORDER BY placed_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let items_raw: String = row.get(1)?;
        let method_raw: String = row.get(7)?;
        Ok((
            Order {
                id: row.get(0)?,
                items: Vec::new(),
                subtotal: row.get(2)?,
                delivery_fee: row.get(3)?,
                total: row.get(4)?,
                location: row.get(5)?,
                phone: row.get(6)?,
                payment_method: PaymentMethod::Cash,
                trx_id: row.get(8)?,
                status: row.get(9)?,
                placed_at: row.get(10)?,
            },
            items_raw,
            method_raw,
        ))
    })?;

    let mut orders = Vec::new();
    for row in rows {
        let (mut order, items_raw, method_raw) = row?;
        order.items = serde_json::from_str(&items_raw)?;
        order.payment_method = PaymentMethod::parse(&method_raw)?;
        orders.push(order);
    }
    Ok(orders)
}

/// Delete one order from the queue. Deleting an id that no longer exists
/// is a success; the admin's "mark done" must not fail on a double click.
pub fn complete_order(db: &DbState, id: &str) -> Result<(), StoreError> {
    let conn = db.lock()?;
    let removed = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
    if removed > 0 {
        info!(order_id = %id, "Order completed (removed from queue)");
    }
    Ok(())
}

/// Delete every order, one document at a time with no transaction.
///
/// A failure partway through leaves a partially-cleared queue; that state
/// is tolerated and reported as a single aggregate error.
pub fn clear_all(db: &DbState) -> Result<usize, StoreError> {
    let conn = db.lock()?;
    let ids: Vec<String> = {
        let mut stmt = conn.prepare("SELECT id FROM orders")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };

    let total = ids.len();
    let mut failed = 0usize;
    for id in &ids {
        if let Err(e) = conn.execute("DELETE FROM orders WHERE id = ?1", params![id]) {
            warn!(order_id = %id, error = %e, "Failed to delete order during clear");
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(StoreError::persistence(format!(
            "Failed to clear {failed} of {total} orders"
        )));
    }

    info!(cleared = total, "All orders cleared");
    Ok(total)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_state;

    fn draft(items: Vec<OrderItem>) -> OrderDraft {
        OrderDraft {
            items,
            location: "Table 4".to_string(),
            phone: "01617005530".to_string(),
            payment_method: PaymentMethod::Cash,
            trx_id: None,
        }
    }

    fn burger_x2() -> Vec<OrderItem> {
        vec![OrderItem {
            name: "Classic Chicken Burger".to_string(),
            quantity: 2,
            price: 140.0,
        }]
    }

    #[test]
    fn test_place_order_computes_total_with_delivery_fee() {
        let db = test_state();

        let order = place_order(&db, draft(burger_x2())).unwrap();
        assert_eq!(order.subtotal, 280.0);
        assert_eq!(order.total, 2.0 * 140.0 + 60.0);
        assert_eq!(order.status, "pending");
        assert!(!order.id.is_empty());
    }

    #[test]
    fn test_place_order_rejects_empty_cart() {
        let db = test_state();
        let err = place_order(&db, draft(vec![])).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(get_all(&db).unwrap().is_empty());
    }

    #[test]
    fn test_place_order_rejects_missing_location() {
        let db = test_state();
        let mut d = draft(burger_x2());
        d.location = "   ".to_string();
        let err = place_order(&db, d).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(get_all(&db).unwrap().is_empty());
    }

    #[test]
    fn test_place_order_rejects_short_phone() {
        let db = test_state();
        let mut d = draft(burger_x2());
        d.phone = "0161700".to_string();
        let err = place_order(&db, d).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(get_all(&db).unwrap().is_empty());
    }

    #[test]
    fn test_bkash_requires_trx_id() {
        let db = test_state();

        let mut missing = draft(burger_x2());
        missing.payment_method = PaymentMethod::Bkash;
        let err = place_order(&db, missing).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(get_all(&db).unwrap().is_empty());

        let mut ok = draft(burger_x2());
        ok.payment_method = PaymentMethod::Bkash;
        ok.trx_id = Some("9HT4X2K1MB".to_string());
        let order = place_order(&db, ok).unwrap();
        assert_eq!(order.trx_id.as_deref(), Some("9HT4X2K1MB"));
    }

    #[test]
    fn test_cash_order_ignores_blank_trx_id() {
        let db = test_state();
        let mut d = draft(burger_x2());
        d.trx_id = Some("   ".to_string());
        let order = place_order(&db, d).unwrap();
        assert_eq!(order.trx_id, None);
    }

    #[test]
    fn test_queue_is_newest_first() {
        let db = test_state();

        let first = place_order(&db, draft(burger_x2())).unwrap();
        let second = place_order(&db, draft(burger_x2())).unwrap();

        let queue = get_all(&db).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].id, second.id);
        assert_eq!(queue[1].id, first.id);
    }

    #[test]
    fn test_order_roundtrips_item_snapshots() {
        let db = test_state();

        let placed = place_order(&db, draft(burger_x2())).unwrap();
        let queue = get_all(&db).unwrap();
        assert_eq!(queue[0].items, placed.items);
        assert_eq!(queue[0].payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn test_complete_order_removes_and_is_idempotent() {
        let db = test_state();

        let order = place_order(&db, draft(burger_x2())).unwrap();
        complete_order(&db, &order.id).unwrap();
        assert!(get_all(&db).unwrap().is_empty());

        // Completing an order that no longer exists is not an error.
        complete_order(&db, &order.id).unwrap();
        complete_order(&db, "never-existed").unwrap();
    }

    #[test]
    fn test_clear_all_empties_queue() {
        let db = test_state();

        for _ in 0..3 {
            place_order(&db, draft(burger_x2())).unwrap();
        }

        let cleared = clear_all(&db).unwrap();
        assert_eq!(cleared, 3);
        assert!(get_all(&db).unwrap().is_empty());

        // Clearing an empty queue succeeds with zero deletions.
        assert_eq!(clear_all(&db).unwrap(), 0);
    }
}
