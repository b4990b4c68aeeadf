//! Session storage. The pipeline only talks to `SessionStore`, so a durable
//! backend can replace the in-memory map without touching it.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::sessions::models::{Candidate, Decision, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Session not found.")]
    SessionNotFound,

    #[error("Candidate not found in session.")]
    CandidateNotFound,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Publishes a fully built session. Readers never see a partial one.
    async fn insert(&self, session: Session);

    async fn get(&self, session_id: Uuid) -> Option<Session>;

    /// Sets one candidate's decision and returns the updated candidate.
    /// Concurrent updates to the same candidate resolve last-write-wins.
    async fn update_decision(
        &self,
        session_id: Uuid,
        candidate_id: Uuid,
        decision: Decision,
    ) -> Result<Candidate, StoreError>;
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.session_id, session);
    }

    async fn get(&self, session_id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    async fn update_decision(
        &self,
        session_id: Uuid,
        candidate_id: Uuid,
        decision: Decision,
    ) -> Result<Candidate, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound)?;
        let candidate = session
            .candidates
            .iter_mut()
            .find(|c| c.candidate_id == candidate_id)
            .ok_or(StoreError::CandidateNotFound)?;

        candidate.decision = decision;
        Ok(candidate.clone())
    }
}
