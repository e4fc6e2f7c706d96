// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ephemeral sessions bound to a verified identity.
//!
//! Session ids are unguessable opaque tokens handed to the caller (the
//! surrounding service decides the transport, e.g. a cookie). Expiry is
//! lazy: a lookup past `expires_at` deletes the record and behaves
//! identically to "no session found".

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Tier;

/// An authenticated admin session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unguessable session token.
    pub id: String,
    /// Wallet address of the verified identity.
    pub identity_key: String,
    /// Tier captured at verification time.
    pub tier: Tier,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Updated on each authenticated request.
    pub last_seen: DateTime<Utc>,
    /// Hard expiry; reads past this point behave as "not found".
    pub expires_at: DateTime<Utc>,
    /// Client IP at creation, if known.
    pub ip: Option<String>,
}

/// In-memory session store with lazy expiry.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a session for a verified identity.
    pub fn create(&self, identity_key: &str, tier: Tier, ip: Option<String>) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            identity_key: identity_key.to_string(),
            tier,
            created_at: now,
            last_seen: now,
            expires_at: now + self.ttl,
            ip,
        };
        self.lock().insert(session.id.clone(), session.clone());
        session
    }

    /// Look up a session, refreshing `last_seen`.
    ///
    /// Expired sessions are deleted on the way out; the caller cannot
    /// distinguish an expired session from an absent one.
    pub fn lookup(&self, id: &str) -> Option<Session> {
        let mut sessions = self.lock();
        let now = Utc::now();

        match sessions.get_mut(id) {
            Some(session) if session.expires_at > now => {
                session.last_seen = now;
                Some(session.clone())
            }
            Some(_) => {
                sessions.remove(id);
                None
            }
            None => None,
        }
    }

    /// Drop a session unconditionally.
    pub fn revoke(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Number of live (not yet lazily-expired) records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
