//! ZahMon Cafe & Restaurant - Tauri v2 Backend
//!
//! Registers all IPC command handlers the React storefront and admin
//! console call via `@tauri-apps/api/core::invoke()`. Three stores back
//! the UI: the session-local cart, the catalog document, and the live
//! order queue, plus the admin gate guarding the console routes.

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod cart;
mod catalog;
mod commands;
mod db;
mod error;
mod events;
mod orders;

/// Where the rolling log files land. Follows the platform data dir
/// conventions without needing an app handle, since logging comes up
/// before the Tauri builder runs.
fn log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join("zahmon").join("logs")
}

pub fn run() {
    // Initialize structured logging (console + rolling file)
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,zahmon_pos_lib=debug"));

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "zahmon");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the app; dropping it would
    // stop flushing the file appender.
    std::mem::forget(_guard);

    info!(
        "Starting ZahMon v{} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIMESTAMP")
    );

    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            let app_data_dir = app
                .path()
                .app_data_dir()
                .expect("Failed to get app data dir");

            let db_state = db::init(&app_data_dir).expect("Failed to initialize database");

            // First run: make sure the console has a password to check
            // against and the storefront has a menu to paint.
            auth::ensure_password_seeded(&db_state).expect("Failed to seed admin credentials");
            if let Err(e) = catalog::load(&db_state) {
                warn!(error = %e, "catalog warm-up failed; first menu_get will retry");
            }

            let store_events = events::StoreEvents::new();
            events::start_audit_log(&store_events);

            app.manage(db_state);
            app.manage(cart::CartState::new());
            app.manage(store_events);
            app.manage(commands::UiGuards::default());

            info!("Stores initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Admin gate
            commands::auth::auth_login,
            commands::auth::auth_logout,
            commands::auth::auth_is_admin,
            // Cart
            commands::cart::cart_get,
            commands::cart::cart_add_item,
            commands::cart::cart_remove_item,
            commands::cart::cart_delete_item,
            commands::cart::cart_clear,
            // Catalog
            commands::menu::menu_get,
            commands::menu::menu_add_item,
            commands::menu::menu_delete_item,
            // Orders
            commands::orders::order_place,
            commands::orders::order_get_all,
            commands::orders::order_complete,
            commands::orders::orders_clear_all,
        ])
        .run(tauri::generate_context!())
        .expect("error while running ZahMon");
}
