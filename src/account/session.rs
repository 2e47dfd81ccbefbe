//! Session issuance consumed by the import pipeline's bootstrap step.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::UserProfile;
use crate::common::errors::{Result, TransferError};
use crate::store::rows::UserRecord;
use crate::store::Store;

/// Opaque token plus the public user record, attached to the terminal
/// progress snapshot so the caller can log the user in immediately.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub user: UserProfile,
}

/// Seam for the session-issuance collaborator. The default implementation
/// writes a sessions row; an API layer can swap in its own issuer.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn issue(&self, user: &UserRecord) -> Result<IssuedSession>;
}

pub struct SqliteSessionIssuer {
    store: Store,
}

impl SqliteSessionIssuer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionIssuer for SqliteSessionIssuer {
    async fn issue(&self, user: &UserRecord) -> Result<IssuedSession> {
        let token = Uuid::new_v4().to_string();
        self.store
            .create_session(user.id, &token)
            .await
            .map_err(|err| TransferError::Session(err.to_string()))?;
        info!(email = %user.email, "issued session for transferred account");
        Ok(IssuedSession {
            token,
            user: UserProfile::from(user),
        })
    }
}
