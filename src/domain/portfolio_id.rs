//! Portfolio identity.
//!
//! The statistics subsystem never generates portfolio identities of its
//! own: the host application owns the portfolio and its UUID, and the
//! stat record is keyed by that same UUID (1:1, no surrogate key).
//! [`PortfolioId`] wraps the raw [`uuid::Uuid`] so a portfolio key
//! cannot be mixed up with the actor `user_id` carried on engagement
//! events, which is also a UUID.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a stat record and foreign key of every engagement event.
///
/// Serializes transparently as the bare UUID, so stored rows and JSON
/// payloads carry the host application's identifier unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(uuid::Uuid);

impl PortfolioId {
    /// Creates a fresh random id. Outside tests this is only useful for
    /// demo data; real ids come from the host via [`Self::from_uuid`].
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps an identifier supplied by the host application or parsed
    /// from an operator flag.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`] for binding into queries.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for PortfolioId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::StatStore;
    use crate::store::memory::MemoryStore;
    use chrono::Utc;

    #[test]
    fn fresh_ids_never_collide() {
        assert_ne!(PortfolioId::new(), PortfolioId::new());
    }

    #[test]
    fn operator_flag_round_trip() {
        // The `--portfolio` flag parses a Uuid and wraps it; logging and
        // error messages must print the same text the operator typed.
        let raw = "3f9d2b1c-8a4e-4d6f-9c1b-5e7a0d2f4b6a";
        let parsed: Option<uuid::Uuid> = raw.parse().ok();
        let Some(parsed) = parsed else {
            panic!("valid uuid literal");
        };
        let id = PortfolioId::from_uuid(parsed);
        assert_eq!(id.to_string(), raw);
        assert_eq!(*id.as_uuid(), parsed);
    }

    #[test]
    fn serializes_as_the_bare_uuid() {
        let id = PortfolioId::new();
        let wrapped = serde_json::to_string(&id).ok();
        let bare = serde_json::to_string(id.as_uuid()).ok();
        assert!(wrapped.is_some());
        assert_eq!(wrapped, bare);
    }

    #[tokio::test]
    async fn keys_stat_records_one_to_one() {
        let store = MemoryStore::new();
        let a = PortfolioId::new();
        let b = PortfolioId::new();
        let now = Utc::now();
        let _ = store.init_stats(a, now).await;
        let _ = store.init_stats(b, now).await;

        let found = store.find_stats(a).await.ok().flatten();
        let Some(found) = found else {
            panic!("record missing");
        };
        assert_eq!(found.portfolio_id, a);
        assert_ne!(found.portfolio_id, b);
    }
}
