//! Administrative script for tenant database users.
//!
//! The script runs under `mongosh --eval`. It authenticates against `admin`
//! with the agent's own credentials, creates the tenant user with
//! `readWrite` on the tenant database, and resets the password instead when
//! the user already exists. Any other failure is rethrown so `mongosh` exits
//! non-zero.

use serde::Deserialize;

use crate::error::CoreError;

/// `mongosh` error code for "user already exists".
pub const USER_ALREADY_EXISTS_CODE: i32 = 51003;

/// Caller-supplied part of a database user request.
///
/// Administrative credentials never come from the caller. Missing fields
/// deserialize as empty and are rejected by [`DatabaseUserRequest::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseUserRequest {
    pub database_name: String,
    pub new_user: String,
    pub new_password: String,
}

impl DatabaseUserRequest {
    /// Reject empty fields before anything is executed.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("database_name", &self.database_name),
            ("new_user", &self.new_user),
            ("new_password", &self.new_password),
        ]
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Missing required fields ({})",
                missing.join(", ")
            )))
        }
    }
}

/// Administrative login used to run the script.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

/// Build the `mongosh` script for `request`.
///
/// Every interpolated value is emitted as a JSON string literal, which is
/// also a valid JavaScript string literal, so quotes or backslashes in a
/// password cannot alter the script.
pub fn build_user_script(admin: &AdminCredentials, request: &DatabaseUserRequest) -> String {
    let admin_user = js_string(&admin.user);
    let admin_password = js_string(&admin.password);
    let db_name = js_string(&request.database_name);
    let user = js_string(&request.new_user);
    let password = js_string(&request.new_password);

    format!(
        r#"
db = db.getSiblingDB('admin');
db.auth({admin_user}, {admin_password});
db = db.getSiblingDB({db_name});
try {{
    db.createUser({{
        user: {user},
        pwd: {password},
        roles: [{{ role: 'readWrite', db: {db_name} }}]
    }});
    print('User created successfully');
}} catch (e) {{
    if (e.code === {USER_ALREADY_EXISTS_CODE}) {{
        db.changeUserPassword({user}, {password});
        print('User already exists, password updated');
    }} else {{
        throw e;
    }}
}}
"#
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
