//! Admin gate with bcrypt.
//!
//! A single shared password guards the management console. The password is
//! stored as a bcrypt hash in the SQLite `local_settings` table (category
//! "admin", key "password_hash") and seeded on first run, so the secret
//! never ships in client-visible code. The gate itself is one boolean flag
//! in the same table: set on login, cleared on logout, read on route entry.
//! No sessions, no expiry, no lockout.

use tracing::{info, warn};

use crate::db::{self, DbState};
use crate::error::StoreError;

const SETTINGS_CATEGORY: &str = "admin";
const PASSWORD_HASH_KEY: &str = "password_hash";
const SESSION_FLAG_KEY: &str = "session";

/// First-run admin password; change it after the first login.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Seed the bcrypt hash of the default admin password if none is stored.
pub fn ensure_password_seeded(db: &DbState) -> Result<(), StoreError> {
    let conn = db.lock()?;
    if db::get_setting(&conn, SETTINGS_CATEGORY, PASSWORD_HASH_KEY).is_some() {
        return Ok(());
    }

    let hash = bcrypt::hash(DEFAULT_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)
        .map_err(|e| StoreError::persistence(format!("password hash: {e}")))?;
    db::set_setting(&conn, SETTINGS_CATEGORY, PASSWORD_HASH_KEY, &hash)?;
    info!("Seeded default admin password hash");
    Ok(())
}

/// Verify the password and set the admin flag on success.
///
/// A mismatch is a generic denial; no detail about the stored secret leaks.
pub fn login(db: &DbState, password: &str) -> Result<(), StoreError> {
    ensure_password_seeded(db)?;

    let conn = db.lock()?;
    let hash = db::get_setting(&conn, SETTINGS_CATEGORY, PASSWORD_HASH_KEY)
        .ok_or_else(|| StoreError::persistence("admin password hash missing"))?;

    if !bcrypt::verify(password, &hash).unwrap_or(false) {
        warn!("failed admin login attempt");
        return Err(StoreError::Auth);
    }

    db::set_setting(&conn, SETTINGS_CATEGORY, SESSION_FLAG_KEY, "true")?;
    info!("admin login successful");
    Ok(())
}

/// The route-guard predicate: true only while the flag is set.
pub fn is_admin(db: &DbState) -> Result<bool, StoreError> {
    let conn = db.lock()?;
    Ok(db::get_setting(&conn, SETTINGS_CATEGORY, SESSION_FLAG_KEY).as_deref() == Some("true"))
}

/// Clear the admin flag.
pub fn logout(db: &DbState) -> Result<(), StoreError> {
    let conn = db.lock()?;
    db::delete_setting(&conn, SETTINGS_CATEGORY, SESSION_FLAG_KEY)?;
    info!("admin logged out");
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
