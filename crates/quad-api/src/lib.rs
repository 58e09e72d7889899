pub mod auth;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod reports;
pub mod users;
pub mod votes;

use chrono::{DateTime, Utc};
use quad_db::models::TargetRef;
use quad_types::models::TargetKind;
use tracing::warn;
use uuid::Uuid;

pub(crate) fn target_ref(kind: TargetKind, id: &str) -> TargetRef<'_> {
    match kind {
        TargetKind::Post => TargetRef::Post(id),
        TargetKind::Comment => TargetRef::Comment(id),
    }
}

pub(crate) fn parse_uuid(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, context, e);
        Uuid::default()
    })
}

pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use quad_db::Database;
    use quad_types::api::Claims;
    use uuid::Uuid;

    use crate::auth::{AppState, AppStateInner};

    pub fn state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
        })
    }

    /// Create a user row and the claims a request for them would carry.
    pub fn signup(state: &AppState, username: &str) -> Claims {
        let id = Uuid::new_v4();
        state
            .db
            .create_user(&id.to_string(), username, "hash")
            .unwrap();
        Claims {
            sub: id,
            username: username.to_string(),
            exp: 4102444800,
        }
    }

    pub fn promote_to_admin(state: &AppState, claims: &Claims) {
        state
            .db
            .with_conn_mut(|conn| {
                conn.execute(
                    "UPDATE users SET role = 'admin' WHERE id = ?1",
                    [claims.sub.to_string()],
                )?;
                Ok(())
            })
            .unwrap();
    }
}
