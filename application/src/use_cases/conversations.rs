//! Conversation list use cases: create, refresh, select and load.

use crate::ports::conversation_repository::{ConversationRepository, RepositoryError};
use crate::state::AppState;
use council_domain::ConversationId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps [`AppState`]'s conversation list and snapshots in sync with the
/// repository.
pub struct ConversationService<R: ConversationRepository + 'static> {
    repository: Arc<R>,
    state: Arc<AppState>,
}

impl<R: ConversationRepository + 'static> Clone for ConversationService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: ConversationRepository + 'static> ConversationService<R> {
    pub fn new(repository: Arc<R>, state: Arc<AppState>) -> Self {
        Self { repository, state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Create a conversation, put it at the top of the list and select it.
    pub async fn create(&self) -> Result<ConversationId, RepositoryError> {
        let conversation = self.repository.create().await?;
        let id = conversation.id.clone();
        info!("Created conversation {}", id);

        self.state.prepend_summary(conversation.summary());
        self.state.insert_snapshot(conversation);
        self.state.select(id.clone());
        Ok(id)
    }

    /// Reload the summary list. Failures keep the current list.
    pub async fn refresh(&self) {
        match self.repository.list().await {
            Ok(summaries) => {
                debug!("Refreshed {} conversation summaries", summaries.len());
                self.state.set_summaries(summaries);
            }
            Err(e) => warn!("Failed to load conversations: {}", e),
        }
    }

    /// Select a conversation and load its history.
    ///
    /// The selection changes even when the load fails.
    pub async fn select(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        self.state.select(id.clone());
        self.load(id).await
    }

    /// Load a conversation's history into its snapshot.
    ///
    /// A conversation with a turn in flight keeps its local snapshot.
    pub async fn load(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let conversation = self.repository.load(id).await.inspect_err(|e| {
            warn!("Failed to load conversation {}: {}", id, e);
        })?;
        if !self.state.store_loaded(conversation) {
            debug!("Turn in flight for {}, keeping local snapshot", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TurnGuard;
    use async_trait::async_trait;
    use chrono::Utc;
    use council_domain::{Conversation, ConversationSummary, Message, Settings};
    use std::sync::Mutex;

    struct MockRepository {
        conversations: Mutex<Vec<Conversation>>,
        fail_list: bool,
    }

    impl MockRepository {
        fn new() -> Self {
            Self {
                conversations: Mutex::new(Vec::new()),
                fail_list: false,
            }
        }

        fn with(conversations: Vec<Conversation>) -> Self {
            Self {
                conversations: Mutex::new(conversations),
                fail_list: false,
            }
        }
    }

    #[async_trait]
    impl ConversationRepository for MockRepository {
        async fn create(&self) -> Result<Conversation, RepositoryError> {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation =
                Conversation::new(format!("conv-{}", conversations.len() + 1), Utc::now());
            conversations.push(conversation.clone());
            Ok(conversation)
        }

        async fn list(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
            if self.fail_list {
                return Err(RepositoryError::Connection("down".to_string()));
            }
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .rev()
                .map(Conversation::summary)
                .collect())
        }

        async fn load(&self, id: &ConversationId) -> Result<Conversation, RepositoryError> {
            self.conversations
                .lock()
                .unwrap()
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .ok_or_else(|| RepositoryError::NotFound(id.clone()))
        }
    }

    fn service(repository: MockRepository) -> ConversationService<MockRepository> {
        ConversationService::new(
            Arc::new(repository),
            Arc::new(AppState::new(Settings::default())),
        )
    }

    #[tokio::test]
    async fn create_selects_and_prepends() {
        let service = service(MockRepository::new());
        let first = service.create().await.unwrap();
        let second = service.create().await.unwrap();

        let state = service.state();
        assert_eq!(state.selected(), Some(second.clone()));
        let ids: Vec<_> = state.summaries().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.clone(), first]);
        assert_eq!(state.summaries()[0].message_count, 0);
        assert!(state.snapshot(&second).is_some());
    }

    #[tokio::test]
    async fn refresh_replaces_summaries() {
        let stored = Conversation::new("stored", Utc::now()).with_appended([Message::user("q")]);
        let service = service(MockRepository::with(vec![stored]));

        service.refresh().await;
        let summaries = service.state().summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 1);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_list() {
        let mut repository = MockRepository::new();
        repository.fail_list = true;
        let service = service(repository);
        service
            .state()
            .prepend_summary(Conversation::new("kept", Utc::now()).summary());

        service.refresh().await;
        assert_eq!(service.state().summaries().len(), 1);
    }

    #[tokio::test]
    async fn select_loads_history() {
        let stored = Conversation::new("stored", Utc::now()).with_appended([Message::user("q")]);
        let id = stored.id.clone();
        let service = service(MockRepository::with(vec![stored]));

        service.select(&id).await.unwrap();
        assert_eq!(service.state().selected(), Some(id.clone()));
        assert_eq!(service.state().snapshot(&id).unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn select_unknown_keeps_selection_and_fails() {
        let service = service(MockRepository::new());
        let id = ConversationId::new("missing");
        let err = service.select(&id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert_eq!(service.state().selected(), Some(id));
    }

    #[tokio::test]
    async fn load_does_not_clobber_in_flight_snapshot() {
        let stored = Conversation::new("busy", Utc::now());
        let id = stored.id.clone();
        let service = service(MockRepository::with(vec![stored.clone()]));
        let state = Arc::clone(service.state());
        state.insert_snapshot(stored);
        state.append_messages(&id, vec![Message::user("optimistic")]);
        let _guard = TurnGuard::acquire(&state, &id, true).unwrap();

        service.load(&id).await.unwrap();
        assert_eq!(state.snapshot(&id).unwrap().messages.len(), 1);
    }
}
