use std::collections::HashSet;

/// Interception hooks the session registers with the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeRequest,
    Completed,
    HeadersReceived,
    TabActivated,
    TabUpdated,
}

impl Hook {
    pub const ALL: [Hook; 5] = [
        Hook::BeforeRequest,
        Hook::Completed,
        Hook::HeadersReceived,
        Hook::TabActivated,
        Hook::TabUpdated,
    ];
}

/// Registered-hook bookkeeping.
///
/// Presence is checked before every mutation, so attaching or detaching
/// twice never produces a duplicate registration or a spurious removal. A
/// hook that is not registered drops its event traffic at the session edge.
#[derive(Debug, Default)]
pub struct ListenerSet {
    registered: HashSet<Hook>,
}

impl ListenerSet {
    pub fn has(&self, hook: Hook) -> bool {
        self.registered.contains(&hook)
    }

    /// Registers every hook not already present; returns what was added.
    pub fn attach_all(&mut self) -> Vec<Hook> {
        Hook::ALL
            .into_iter()
            .filter(|hook| self.registered.insert(*hook))
            .collect()
    }

    /// Unregisters every hook present; returns what was removed.
    pub fn detach_all(&mut self) -> Vec<Hook> {
        Hook::ALL
            .into_iter()
            .filter(|hook| self.registered.remove(hook))
            .collect()
    }
}
