//! Render sessions and the tokens that detect superseded passes.
//!
//! A [`RenderSession`] owns a counter that only [`RenderSession::advance`]
//! bumps. Each render pass holds the [`RenderToken`] it was issued and must
//! check it after every await; once a newer token exists, the older pass
//! stops producing side effects.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct RenderSession {
    current: Rc<Cell<u64>>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every outstanding token and issue a fresh one.
    pub fn advance(&self) -> RenderToken {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        RenderToken {
            id: next,
            session: Some(self.current.clone()),
        }
    }

    pub fn current_id(&self) -> u64 {
        self.current.get()
    }
}

/// Identifies one render pass.
#[derive(Debug, Clone)]
pub struct RenderToken {
    id: u64,
    session: Option<Rc<Cell<u64>>>,
}

impl RenderToken {
    /// A token tied to no session; it is never cancelled.
    pub fn detached() -> Self {
        Self {
            id: 0,
            session: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// `true` while no newer pass has started.
    pub fn is_current(&self) -> bool {
        self.session
            .as_ref()
            .map_or(true, |current| current.get() == self.id)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_current()
    }
}
