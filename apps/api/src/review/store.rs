use redis::Client as RedisClient;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::review::session::ReviewSession;

const KEY_PREFIX: &str = "folio:review:";

fn session_key(id: Uuid) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Review sessions live in Redis as JSON and expire after `ttl_secs` without
/// a write.
#[derive(Clone)]
pub struct SessionStore {
    client: RedisClient,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(client: RedisClient, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    pub async fn save(&self, session: &ReviewSession) -> Result<(), AppError> {
        let json = serde_json::to_string(session)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("session serialization failed: {e}")))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(session_key(session.id))
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("Saved review session {}", session.id);
        Ok(())
    }

    /// Loads a session; an unknown or expired id is `NotFound`.
    pub async fn load(&self, id: Uuid) -> Result<ReviewSession, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(session_key(id))
            .query_async(&mut conn)
            .await?;
        let raw = raw.ok_or_else(|| AppError::NotFound(format!("review session {id} not found")))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt review session {id}: {e}")))
    }

    /// Returns whether a session was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: i64 = redis::cmd("DEL")
            .arg(session_key(id))
            .query_async(&mut conn)
            .await?;
        if removed > 0 {
            info!("Dropped review session {id}");
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_is_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            session_key(id),
            "folio:review:00000000-0000-0000-0000-000000000000"
        );
    }
}
