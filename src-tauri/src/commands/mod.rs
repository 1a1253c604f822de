//! IPC command handlers, grouped per store.
//!
//! Commands are the action boundary: every store error is converted to a
//! user-visible string here and nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};

pub mod auth;
pub mod cart;
pub mod menu;
pub mod orders;

/// Tauri managed state with one in-flight flag per double-submit-prone form.
#[derive(Default)]
pub struct UiGuards {
    pub placing_order: AtomicBool,
    pub saving_item: AtomicBool,
}

/// RAII handle for a single-flight flag; releases the flag on drop.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Claim a single-flight flag, rejecting re-entrant submissions while a
/// previous one is still being persisted.
pub(crate) fn begin_flight<'a>(
    flag: &'a AtomicBool,
    busy_message: &str,
) -> Result<FlightGuard<'a>, String> {
    if flag.swap(true, Ordering::SeqCst) {
        return Err(busy_message.to_string());
    }
    Ok(FlightGuard(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_guard_blocks_second_entry_until_released() {
        let flag = AtomicBool::new(false);

        let guard = begin_flight(&flag, "busy").expect("first entry");
        assert_eq!(begin_flight(&flag, "busy").unwrap_err(), "busy");

        drop(guard);
        begin_flight(&flag, "busy").expect("flag released after drop");
    }
}
