//! Account snapshot and credential handling.
//!
//! Password material never travels in a package: export copies none, and
//! import hashes the one brand-new password the caller supplies.

pub mod session;

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, TransferError};
use crate::store::rows::{SettingsRow, UserRecord};

/// Profile fields needed to reconstruct a login identity on a new host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&UserRecord> for ProfileSnapshot {
    fn from(user: &UserRecord) -> Self {
        Self {
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// The `account.json` artifact: profile plus the single active settings
/// record. `settings` is absent when the source host never saved one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub user: ProfileSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsRow>,
}

/// Public user record returned alongside an issued session. No credential
/// or verification state leaks through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Argon2id hash of a caller-supplied password, PHC string encoded.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| TransferError::PasswordHash(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_encoded_and_salted() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert!(first.starts_with("$argon2id$"));
        // Fresh salt per call.
        assert_ne!(first, second);
    }

    #[test]
    fn account_snapshot_omits_absent_settings() {
        let snapshot = AccountSnapshot {
            user: ProfileSnapshot {
                email: "pat@example.com".to_string(),
                display_name: "Pat".to_string(),
                avatar: None,
            },
            settings: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("settings").is_none());
        assert_eq!(value["user"]["email"], "pat@example.com");
    }
}
