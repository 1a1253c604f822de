use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, CartState};

/// What the cart page and navbar badge render from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u32,
    pub subtotal: f64,
}

fn view(cart: &CartState) -> CartView {
    CartView {
        lines: cart.snapshot(),
        count: cart.count(),
        subtotal: cart.subtotal(),
    }
}

/// A menu card's "add" payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

#[tauri::command]
pub fn cart_get(cart: tauri::State<'_, CartState>) -> CartView {
    view(&cart)
}

#[tauri::command]
pub fn cart_add_item(item: CartItemPayload, cart: tauri::State<'_, CartState>) -> CartView {
    cart.add(&item.name, item.price, &item.image);
    view(&cart)
}

#[tauri::command]
pub fn cart_remove_item(name: String, cart: tauri::State<'_, CartState>) -> CartView {
    cart.remove(&name);
    view(&cart)
}

#[tauri::command]
pub fn cart_delete_item(name: String, cart: tauri::State<'_, CartState>) -> CartView {
    cart.delete(&name);
    view(&cart)
}

#[tauri::command]
pub fn cart_clear(cart: tauri::State<'_, CartState>) -> CartView {
    cart.clear();
    view(&cart)
}
