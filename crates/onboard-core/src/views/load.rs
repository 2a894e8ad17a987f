//! Load identity for race-free view updates.
//!
//! Every load started through a [`LoadSlot`] gets a fresh [`LoadId`]. Starting
//! a new load cancels the previous one, and a result is only applied when its
//! id is still the active one.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadId(pub u64);

#[derive(Debug, Default)]
pub struct LoadSeq {
    next: u64,
}

impl LoadSeq {
    pub fn next_id(&mut self) -> LoadId {
        let id = LoadId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// The single in-flight load of one view section.
#[derive(Debug, Default)]
pub struct LoadSlot {
    seq: LoadSeq,
    active: Option<LoadId>,
    cancel: Option<CancellationToken>,
}

impl LoadSlot {
    /// Starts a new load, cancelling the one in flight.
    pub fn start(&mut self) -> (LoadId, CancellationToken) {
        self.cancel();
        let id = self.seq.next_id();
        let token = CancellationToken::new();
        self.active = Some(id);
        self.cancel = Some(token.clone());
        (id, token)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, id: LoadId) -> bool {
        self.active == Some(id)
    }

    /// Marks `id` finished. Returns false for a superseded load, whose result
    /// must be dropped.
    pub fn finish_if_active(&mut self, id: LoadId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
            self.cancel = None;
        }
        ok
    }

    /// Cancels the in-flight load, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.active = None;
    }
}
