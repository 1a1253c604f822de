use serde_json::Value;

use crate::{auth, db};

/// Handle the admin login form. A wrong password gets a generic denial.
#[tauri::command]
pub async fn auth_login(
    password: String,
    db: tauri::State<'_, db::DbState>,
) -> Result<Value, String> {
    auth::login(&db, &password).map_err(|e| e.to_string())?;
    Ok(serde_json::json!({ "success": true }))
}

/// Clear the admin flag.
#[tauri::command]
pub async fn auth_logout(db: tauri::State<'_, db::DbState>) -> Result<Value, String> {
    auth::logout(&db).map_err(|e| e.to_string())?;
    Ok(serde_json::json!({ "success": true }))
}

/// Route guard for the admin console: false redirects to the login page.
#[tauri::command]
pub async fn auth_is_admin(db: tauri::State<'_, db::DbState>) -> Result<bool, String> {
    auth::is_admin(&db).map_err(|e| e.to_string())
}
