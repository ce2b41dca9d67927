/// A value the user may be editing on top of what the server last confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum Editable<T> {
    Synced(T),
    Local { server: T, edits: T },
}

impl<T: Clone + PartialEq> Editable<T> {
    /// The value to render: local edits win over the server copy.
    pub fn current(&self) -> &T {
        match self {
            Editable::Synced(value) => value,
            Editable::Local { edits, .. } => edits,
        }
    }

    pub fn server(&self) -> &T {
        match self {
            Editable::Synced(value) => value,
            Editable::Local { server, .. } => server,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match self {
            Editable::Synced(_) => false,
            Editable::Local { server, edits } => server != edits,
        }
    }

    /// Applies `change` to the current value. Editing back to the server
    /// value collapses to `Synced`.
    pub fn edit<F>(self, change: F) -> Self
    where
        F: FnOnce(&mut T),
    {
        let (server, mut edits) = match self {
            Editable::Synced(value) => (value.clone(), value),
            Editable::Local { server, edits } => (server, edits),
        };
        change(&mut edits);

        if edits == server {
            Editable::Synced(server)
        } else {
            Editable::Local { server, edits }
        }
    }

    pub fn discard(self) -> Self {
        match self {
            Editable::Synced(value) => Editable::Synced(value),
            Editable::Local { server, .. } => Editable::Synced(server),
        }
    }

    /// The server confirmed a write; its answer replaces any local state.
    pub fn confirm(self, server: T) -> Self {
        Editable::Synced(server)
    }
}
