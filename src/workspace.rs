//! Service wiring.
//!
//! Builds the three collection services over one shared document store and a
//! session provider, constructed once at startup and passed by handle to
//! consumers. Session transitions fan out to all three synchronizers; no
//! subscription is attached while the session is still resolving.

use crate::plugins::bookmarks::BookmarkStore;
use crate::plugins::notes::NoteStore;
use crate::plugins::todos::TodoStore;
use crate::session::{Session, SessionState};
use crate::store::DocumentStore;
use std::sync::Arc;

pub struct Workspace {
    pub session: Session,
    pub todos: TodoStore,
    pub bookmarks: BookmarkStore,
    pub notes: NoteStore,
}

impl Workspace {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            session: Session::new(),
            todos: TodoStore::new(Arc::clone(&store)),
            bookmarks: BookmarkStore::new(Arc::clone(&store)),
            notes: NoteStore::new(store),
        }
    }

    /// Applies the current session state to every synchronizer. Unresolved
    /// sessions are ignored; a signed-out session detaches by attaching with
    /// no principal, which also clears the caches.
    pub fn apply_session(&self) {
        let SessionState {
            principal_id,
            loading,
        } = self.session.state();
        if loading {
            return;
        }

        let principal = principal_id.as_deref();
        self.todos.attach(principal);
        self.bookmarks.attach(principal);
        self.notes.attach(principal);
    }

    /// Detaches all synchronizers. Called on teardown; afterwards no snapshot
    /// can mutate any cache.
    pub fn detach_all(&self) {
        self.todos.detach();
        self.bookmarks.detach();
        self.notes.detach();
    }

    /// Drives session transitions until the session provider is dropped.
    pub async fn run(&self) {
        let mut rx = self.session.watch();
        loop {
            self.apply_session();
            if rx.changed().await.is_err() {
                break;
            }
        }
        self.detach_all();
    }
}
