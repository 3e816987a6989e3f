//! Agent pool
//!
//! Bounds how many agents are live at once and reuses released agents
//! by role (LIFO for cache efficiency). The cap is what keeps
//! concurrent crews - validation batches especially - from ballooning.

use crate::agent::{Agent, AgentRole};
use crate::error::PoolError;
use tokio::sync::Mutex;

/// Pool statistics
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Total agents created
    pub total_created: usize,
    /// Currently active agents
    pub active_count: usize,
    /// Available agents in pool
    pub available_count: usize,
}

#[derive(Debug, Default)]
struct PoolInner {
    available: Vec<Agent>,
    active: usize,
    total_created: usize,
}

/// Agent pool with a hard activity cap
#[derive(Debug)]
pub struct AgentPool {
    max_size: usize,
    inner: Mutex<PoolInner>,
}

impl AgentPool {
    /// Create new agent pool
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// Acquire an agent for a role (reuse or create)
    ///
    /// # Errors
    /// `PoolError::PoolExhausted` when the activity cap is reached.
    pub async fn acquire(&self, role: AgentRole) -> Result<Agent, PoolError> {
        let mut inner = self.inner.lock().await;

        if let Some(idx) = inner.available.iter().rposition(|a| a.role == role) {
            let agent = inner.available.remove(idx);
            inner.active += 1;
            return Ok(agent);
        }

        if inner.active >= self.max_size {
            return Err(PoolError::PoolExhausted(self.max_size));
        }

        inner.active += 1;
        inner.total_created += 1;
        Ok(Agent::for_role(role))
    }

    /// Release an agent back to the pool
    pub async fn release(&self, agent: Agent) {
        let mut inner = self.inner.lock().await;
        inner.active = inner.active.saturating_sub(1);
        if inner.available.len() < self.max_size {
            inner.available.push(agent);
        }
    }

    /// Pool statistics
    pub async fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().await;
        PoolStats {
            total_created: inner.total_created,
            active_count: inner.active,
            available_count: inner.available.len(),
        }
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_and_release() {
        let pool = AgentPool::new(2);

        let a = pool.acquire(AgentRole::Validator).await.unwrap();
        let _b = pool.acquire(AgentRole::Validator).await.unwrap();

        assert!(matches!(
            pool.acquire(AgentRole::Validator).await,
            Err(PoolError::PoolExhausted(2))
        ));

        pool.release(a).await;
        assert!(pool.acquire(AgentRole::Validator).await.is_ok());
    }

    #[tokio::test]
    async fn released_agent_reused_by_role() {
        let pool = AgentPool::new(4);

        let a = pool.acquire(AgentRole::Theorist).await.unwrap();
        pool.release(a).await;
        let _again = pool.acquire(AgentRole::Theorist).await.unwrap();

        let stats = pool.stats().await;
        assert_eq!(stats.total_created, 1);
        assert_eq!(stats.active_count, 1);
    }

    #[tokio::test]
    async fn stats_track_counts() {
        let pool = AgentPool::new(4);

        let a = pool.acquire(AgentRole::Analyst).await.unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.total_created, 1);

        pool.release(a).await;
        let stats = pool.stats().await;
        assert_eq!(stats.active_count, 0);
        assert_eq!(stats.available_count, 1);
    }
}
