//! Push-based projections of the catalog and the order queue.
//!
//! Consumers observe snapshots instead of polling: after every successful
//! mutation the command layer publishes a fresh snapshot on a broadcast
//! channel and mirrors it as a Tauri event for mounted webviews. Dropping
//! a receiver tears down that subscription; the publisher never blocks on
//! dead consumers, and a write that finishes after its caller went away is
//! still visible to every remaining subscriber.

use tauri::Emitter;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::orders::Order;

/// Webview event carrying the full catalog after a menu mutation.
pub const CATALOG_EVENT: &str = "catalog_updated";
/// Webview event carrying the full queue after an order mutation.
pub const ORDERS_EVENT: &str = "orders_updated";

const CHANNEL_CAPACITY: usize = 32;

/// Tauri managed state holding the snapshot publishers.
pub struct StoreEvents {
    catalog_tx: broadcast::Sender<Catalog>,
    orders_tx: broadcast::Sender<Vec<Order>>,
}

impl StoreEvents {
    pub fn new() -> Self {
        let (catalog_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (orders_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            catalog_tx,
            orders_tx,
        }
    }

    pub fn subscribe_catalog(&self) -> broadcast::Receiver<Catalog> {
        self.catalog_tx.subscribe()
    }

    pub fn subscribe_orders(&self) -> broadcast::Receiver<Vec<Order>> {
        self.orders_tx.subscribe()
    }

    /// Publish a catalog snapshot. Having no live subscribers is fine.
    pub fn publish_catalog(&self, snapshot: Catalog) {
        let _ = self.catalog_tx.send(snapshot);
    }

    /// Publish an order-queue snapshot. Having no live subscribers is fine.
    pub fn publish_orders(&self, snapshot: Vec<Order>) {
        let _ = self.orders_tx.send(snapshot);
    }
}

impl Default for StoreEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Log every published catalog snapshot until the publisher closes.
async fn pump_catalog(mut rx: broadcast::Receiver<Catalog>) {
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                let items: usize = snapshot.values().map(Vec::len).sum();
                info!(categories = snapshot.len(), items, "catalog snapshot published");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "catalog audit feed lagged; resuming from latest");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Log the queue depth of every published order snapshot.
async fn pump_orders(mut rx: broadcast::Receiver<Vec<Order>>) {
    loop {
        match rx.recv().await {
            Ok(snapshot) => info!(pending = snapshot.len(), "order queue snapshot published"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "order audit feed lagged; resuming from latest");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Start the backend-side audit subscriber: a background task per channel
/// that mirrors what the webviews see into the structured log. Runs until
/// the publishers drop.
pub fn start_audit_log(events: &StoreEvents) {
    tauri::async_runtime::spawn(pump_catalog(events.subscribe_catalog()));
    tauri::async_runtime::spawn(pump_orders(events.subscribe_orders()));
}

/// Fan a catalog snapshot out to webviews and broadcast subscribers.
pub fn push_catalog(app: &tauri::AppHandle, events: &StoreEvents, snapshot: Catalog) {
    let _ = app.emit(CATALOG_EVENT, &snapshot);
    events.publish_catalog(snapshot);
}

/// Fan an order-queue snapshot out to webviews and broadcast subscribers.
pub fn push_orders(app: &tauri::AppHandle, events: &StoreEvents, snapshot: Vec<Order>) {
    let _ = app.emit(ORDERS_EVENT, &snapshot);
    events.publish_orders(snapshot);
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_subscriber_receives_published_snapshot() {
        let events = StoreEvents::new();
        let mut rx = events.subscribe_catalog();

        let mut snapshot: Catalog = BTreeMap::new();
        snapshot.insert("soups".to_string(), vec![]);
        events.publish_catalog(snapshot.clone());

        assert_eq!(rx.recv().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_every_mounted_subscriber_sees_the_update() {
        let events = StoreEvents::new();
        let mut rx_a = events.subscribe_orders();
        let mut rx_b = events.subscribe_orders();

        events.publish_orders(vec![]);

        assert_eq!(rx_a.recv().await.unwrap(), vec![]);
        assert_eq!(rx_b.recv().await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_break_publishing() {
        let events = StoreEvents::new();

        let rx = events.subscribe_catalog();
        drop(rx);

        // Unmounted consumer: publishing keeps working for the rest.
        events.publish_catalog(BTreeMap::new());

        let mut rx2 = events.subscribe_catalog();
        events.publish_catalog(BTreeMap::new());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_audit_pump_drains_until_publisher_closes() {
        let events = StoreEvents::new();
        let handle = tokio::spawn(pump_orders(events.subscribe_orders()));

        events.publish_orders(vec![]);
        events.publish_orders(vec![]);

        // Dropping the publisher closes the channel and ends the task.
        drop(events);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("pump should stop once the channel closes")
            .expect("pump task should not panic");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let events = StoreEvents::new();
        events.publish_catalog(BTreeMap::new());
        events.publish_orders(vec![]);
    }
}
