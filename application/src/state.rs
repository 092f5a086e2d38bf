//! Application state.
//!
//! [`AppState`] is the single owner of client-side state: the conversation
//! list, the selection, one snapshot per loaded conversation, the set of
//! conversations with a turn in flight, and the active settings. It is
//! constructed at startup and shared by `Arc` with the use cases.
//!
//! Every mutation happens under one lock, so each call is one observable
//! transition. Snapshots are replaced, never mutated in place.

use council_domain::council::reducer;
use council_domain::{
    Conversation, ConversationId, ConversationSummary, CouncilEvent, Message, MessageId,
    ModelCatalogSnapshot, ReduceError, Settings,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    summaries: Vec<ConversationSummary>,
    selected: Option<ConversationId>,
    snapshots: HashMap<ConversationId, Conversation>,
    in_flight: HashMap<ConversationId, usize>,
    settings: Settings,
    catalog: Option<ModelCatalogSnapshot>,
    revision: u64,
}

#[derive(Debug, Default)]
pub struct AppState {
    inner: Mutex<Inner>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                settings,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counter bumped on every snapshot change.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    // ==================== Selection ====================

    pub fn select(&self, id: ConversationId) {
        self.lock().selected = Some(id);
    }

    pub fn selected(&self) -> Option<ConversationId> {
        self.lock().selected.clone()
    }

    // ==================== Summaries ====================

    pub fn summaries(&self) -> Vec<ConversationSummary> {
        self.lock().summaries.clone()
    }

    pub fn set_summaries(&self, summaries: Vec<ConversationSummary>) {
        self.lock().summaries = summaries;
    }

    pub fn prepend_summary(&self, summary: ConversationSummary) {
        let mut inner = self.lock();
        inner.summaries.retain(|s| s.id != summary.id);
        inner.summaries.insert(0, summary);
    }

    // ==================== Snapshots ====================

    pub fn snapshot(&self, id: &ConversationId) -> Option<Conversation> {
        self.lock().snapshots.get(id).cloned()
    }

    pub fn insert_snapshot(&self, conversation: Conversation) {
        let mut inner = self.lock();
        inner.snapshots.insert(conversation.id.clone(), conversation);
        inner.revision += 1;
    }

    /// Store a conversation loaded from the repository unless a turn is in
    /// flight for it, in which case the local snapshot holds optimistic
    /// messages the backend copy lacks. Returns whether it was stored.
    pub fn store_loaded(&self, conversation: Conversation) -> bool {
        let mut inner = self.lock();
        let busy = inner.in_flight.get(&conversation.id).copied().unwrap_or(0) > 0;
        if busy && inner.snapshots.contains_key(&conversation.id) {
            return false;
        }
        inner.snapshots.insert(conversation.id.clone(), conversation);
        inner.revision += 1;
        true
    }

    /// Replace the snapshot of `id` with `f(current)` as one transition.
    /// Returns `false` when the conversation has no snapshot.
    pub fn update_snapshot<F>(&self, id: &ConversationId, f: F) -> bool
    where
        F: FnOnce(&Conversation) -> Conversation,
    {
        let mut inner = self.lock();
        let Some(current) = inner.snapshots.get(id) else {
            return false;
        };
        let next = f(current);
        inner.snapshots.insert(id.clone(), next);
        inner.revision += 1;
        true
    }

    /// Append `messages` as one transition. Returns `false` when the
    /// conversation has no snapshot.
    pub fn append_messages(&self, id: &ConversationId, messages: Vec<Message>) -> bool {
        let mut inner = self.lock();
        let Some(current) = inner.snapshots.get(id) else {
            return false;
        };
        let next = current.with_appended(messages);
        inner.snapshots.insert(id.clone(), next);
        inner.revision += 1;
        true
    }

    /// Remove the listed messages as one transition. Returns how many were removed.
    pub fn remove_messages(&self, id: &ConversationId, ids: &[MessageId]) -> usize {
        let mut inner = self.lock();
        let Some(current) = inner.snapshots.get(id) else {
            return 0;
        };
        let next = current.without(ids);
        let removed = current.messages.len() - next.messages.len();
        if removed > 0 {
            inner.snapshots.insert(id.clone(), next);
            inner.revision += 1;
        }
        removed
    }

    /// Reduce `event` into the snapshot of conversation `id`, addressing
    /// message `target`.
    pub fn apply_event(
        &self,
        id: &ConversationId,
        target: &MessageId,
        event: &CouncilEvent,
    ) -> Result<(), ReduceError> {
        let mut inner = self.lock();
        let current = inner
            .snapshots
            .get(id)
            .ok_or(ReduceError::MessageNotFound(*target))?;
        let next = reducer::apply(current, target, event)?;
        if !shares_messages(current, &next) {
            inner.snapshots.insert(id.clone(), next);
            inner.revision += 1;
        }
        Ok(())
    }

    // ==================== Turn tracking ====================

    /// Mark a turn as started. With `exclusive`, fails when a turn is
    /// already in flight for the conversation.
    pub fn try_begin_turn(&self, id: &ConversationId, exclusive: bool) -> bool {
        let mut inner = self.lock();
        let count = inner.in_flight.entry(id.clone()).or_insert(0);
        if exclusive && *count > 0 {
            return false;
        }
        *count += 1;
        true
    }

    pub fn end_turn(&self, id: &ConversationId) {
        let mut inner = self.lock();
        if let Some(count) = inner.in_flight.get_mut(id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.in_flight.remove(id);
            }
        }
    }

    pub fn is_turn_in_flight(&self, id: &ConversationId) -> bool {
        self.lock().in_flight.contains_key(id)
    }

    // ==================== Settings ====================

    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        self.lock().settings = settings;
    }

    pub fn catalog(&self) -> Option<ModelCatalogSnapshot> {
        self.lock().catalog.clone()
    }

    pub fn set_catalog(&self, catalog: ModelCatalogSnapshot) {
        self.lock().catalog = Some(catalog);
    }
}

/// True when `next` holds exactly the same message allocations as `current`.
fn shares_messages(current: &Conversation, next: &Conversation) -> bool {
    current.messages.len() == next.messages.len()
        && current
            .messages
            .iter()
            .zip(&next.messages)
            .all(|(a, b)| Arc::ptr_eq(a, b))
}

/// Clears the in-flight mark for a conversation when dropped.
pub struct TurnGuard<'a> {
    state: &'a AppState,
    id: ConversationId,
}

impl<'a> TurnGuard<'a> {
    pub fn acquire(state: &'a AppState, id: &ConversationId, exclusive: bool) -> Option<Self> {
        state.try_begin_turn(id, exclusive).then(|| Self {
            state,
            id: id.clone(),
        })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.state.end_turn(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state_with(id: &str) -> (AppState, ConversationId) {
        let state = AppState::new(Settings::default());
        let id = ConversationId::new(id);
        state.insert_snapshot(Conversation::new(id.clone(), Utc::now()));
        (state, id)
    }

    #[test]
    fn append_pair_is_one_transition() {
        let (state, id) = state_with("c1");
        let before = state.revision();

        assert!(state.append_messages(
            &id,
            vec![Message::user("hi"), Message::assistant_placeholder()]
        ));
        assert_eq!(state.revision(), before + 1);
        assert_eq!(state.snapshot(&id).unwrap().messages.len(), 2);
    }

    #[test]
    fn append_to_unknown_conversation_fails() {
        let state = AppState::default();
        assert!(!state.append_messages(&ConversationId::new("nope"), vec![Message::user("x")]));
    }

    #[test]
    fn remove_messages_by_id() {
        let (state, id) = state_with("c1");
        let user = Message::user("hi");
        let assistant = Message::assistant_placeholder();
        let ids = [user.id, assistant.id];
        state.append_messages(&id, vec![user, assistant]);

        assert_eq!(state.remove_messages(&id, &ids), 2);
        assert!(state.snapshot(&id).unwrap().messages.is_empty());
        assert_eq!(state.remove_messages(&id, &ids), 0);
    }

    #[test]
    fn apply_event_replaces_snapshot() {
        let (state, id) = state_with("c1");
        let assistant = Message::assistant_placeholder();
        let target = assistant.id;
        state.append_messages(&id, vec![Message::user("q"), assistant]);
        let before = state.snapshot(&id).unwrap();

        state
            .apply_event(&id, &target, &CouncilEvent::Stage1Start)
            .unwrap();

        let after = state.snapshot(&id).unwrap();
        assert!(!before.message(&target).unwrap().as_assistant().unwrap().loading.stage1);
        assert!(after.message(&target).unwrap().as_assistant().unwrap().loading.stage1);
    }

    #[test]
    fn apply_non_mutating_event_keeps_revision() {
        let (state, id) = state_with("c1");
        let assistant = Message::assistant_placeholder();
        let target = assistant.id;
        state.append_messages(&id, vec![assistant]);
        let before = state.revision();

        state.apply_event(&id, &target, &CouncilEvent::Complete).unwrap();
        assert_eq!(state.revision(), before);
    }

    #[test]
    fn apply_event_stores_every_content_change() {
        let (state, id) = state_with("c1");
        let assistant = Message::assistant_placeholder();
        let target = assistant.id;
        state.append_messages(&id, vec![assistant]);

        let events = [
            CouncilEvent::Stage1Start,
            CouncilEvent::Stage1Complete { data: Vec::new() },
            CouncilEvent::Stage3Start,
        ];
        for event in &events {
            let before = state.revision();
            state.apply_event(&id, &target, event).unwrap();
            assert_eq!(state.revision(), before + 1, "{event:?} was dropped");
        }
        let snapshot = state.snapshot(&id).unwrap();
        let message = snapshot.message(&target).unwrap().as_assistant().unwrap();
        assert_eq!(message.stage1, Some(Vec::new()));
        assert!(message.loading.stage3);
    }

    #[test]
    fn apply_event_without_snapshot_fails() {
        let state = AppState::default();
        let target = MessageId::new();
        assert_eq!(
            state.apply_event(&ConversationId::new("c"), &target, &CouncilEvent::Stage1Start),
            Err(ReduceError::MessageNotFound(target))
        );
    }

    #[test]
    fn exclusive_turns_are_serialized() {
        let (state, id) = state_with("c1");
        let guard = TurnGuard::acquire(&state, &id, true);
        assert!(guard.is_some());
        assert!(state.is_turn_in_flight(&id));
        assert!(TurnGuard::acquire(&state, &id, true).is_none());

        drop(guard);
        assert!(!state.is_turn_in_flight(&id));
        assert!(TurnGuard::acquire(&state, &id, true).is_some());
    }

    #[test]
    fn non_exclusive_turns_are_counted() {
        let (state, id) = state_with("c1");
        let first = TurnGuard::acquire(&state, &id, false).unwrap();
        let second = TurnGuard::acquire(&state, &id, false).unwrap();
        drop(first);
        assert!(state.is_turn_in_flight(&id));
        drop(second);
        assert!(!state.is_turn_in_flight(&id));
    }

    #[test]
    fn update_snapshot_applies_closure() {
        let (state, id) = state_with("c1");
        assert!(state.update_snapshot(&id, |c| Conversation {
            title: Some("Renamed".to_string()),
            ..c.clone()
        }));
        assert_eq!(state.snapshot(&id).unwrap().title.as_deref(), Some("Renamed"));
        assert!(!state.update_snapshot(&ConversationId::new("nope"), Conversation::clone));
    }

    #[test]
    fn store_loaded_skips_busy_conversation() {
        let (state, id) = state_with("c1");
        state.append_messages(&id, vec![Message::user("optimistic")]);
        let _guard = TurnGuard::acquire(&state, &id, true).unwrap();

        let stored = state.store_loaded(Conversation::new(id.clone(), Utc::now()));
        assert!(!stored);
        assert_eq!(state.snapshot(&id).unwrap().messages.len(), 1);
    }

    #[test]
    fn prepend_summary_deduplicates() {
        let state = AppState::default();
        let summary = Conversation::new("a", Utc::now()).summary();
        state.prepend_summary(Conversation::new("b", Utc::now()).summary());
        state.prepend_summary(summary.clone());
        state.prepend_summary(summary);
        let ids: Vec<_> = state
            .summaries()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
