use crate::reply::ConversationHistory;
use crate::session::Session;
use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Everything the engine keeps for one conversation.
#[derive(Debug, Clone)]
pub(super) struct SessionSlot {
    pub(super) session: Session,
    pub(super) history: ConversationHistory,
    /// The state before the turn that failed the session.
    pub(super) last_good: Option<Session>,
}

impl SessionSlot {
    pub(super) fn new(session: Session, history_limit: usize) -> Self {
        Self {
            session,
            history: ConversationHistory::new(history_limit),
            last_good: None,
        }
    }
}

/// Session id -> slot. The map lock is only held to find a slot; turns hold the slot's own mutex,
/// so different sessions never wait on each other.
#[derive(Debug, Default)]
pub(super) struct SessionTable {
    slots: RwLock<AHashMap<String, Arc<Mutex<SessionSlot>>>>,
}

impl SessionTable {
    pub(super) fn insert(&self, slot: SessionSlot) -> String {
        let id = slot.session.id.clone();
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(Mutex::new(slot)));
        id
    }

    pub(super) fn get(&self, id: &str) -> Option<Arc<Mutex<SessionSlot>>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub(super) fn remove(&self, id: &str) -> bool {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub(super) fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A turn that panicked mid-way leaves the slot poisoned. Its state is still the last
/// one written, which is what callers should see.
pub(super) fn lock(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
