//! Session-local shopping cart.
//!
//! The cart lives purely in memory for the lifetime of the app window and
//! is never written to the document store. At most one line exists per
//! distinct item name; lines keep their insertion order. The checkout
//! command clears the cart exactly once, after the order write resolves.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One cart line: an item name with its unit price and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub price: f64,
    pub image: String,
    pub quantity: u32,
}

/// Tauri managed state holding the shopper's in-progress selection.
#[derive(Default)]
pub struct CartState {
    lines: Mutex<Vec<CartLine>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item: bump the quantity of an existing line, or append a new
    /// line with quantity 1.
    pub fn add(&self, name: &str, price: f64, image: &str) {
        let mut lines = self.lines.lock().unwrap();
        match lines.iter_mut().find(|l| l.name == name) {
            Some(line) => line.quantity += 1,
            None => lines.push(CartLine {
                name: name.to_string(),
                price,
                image: image.to_string(),
                quantity: 1,
            }),
        }
    }

    /// Decrement a line's quantity, dropping the line at quantity 1.
    /// An absent name is a no-op.
    pub fn remove(&self, name: &str) {
        let mut lines = self.lines.lock().unwrap();
        if let Some(pos) = lines.iter().position(|l| l.name == name) {
            if lines[pos].quantity <= 1 {
                lines.remove(pos);
            } else {
                lines[pos].quantity -= 1;
            }
        }
    }

    /// Remove a line entirely, regardless of quantity.
    pub fn delete(&self, name: &str) {
        let mut lines = self.lines.lock().unwrap();
        lines.retain(|l| l.name != name);
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    /// Sum of all line quantities (the navbar badge).
    pub fn count(&self) -> u32 {
        self.lines.lock().unwrap().iter().map(|l| l.quantity).sum()
    }

    /// Sum of price x quantity across all lines.
    pub fn subtotal(&self) -> f64 {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.price * f64::from(l.quantity))
            .sum()
    }

    /// Copy of the current lines, in insertion order.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap().is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
