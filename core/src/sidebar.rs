use scotty_protocol::models::ConversationId;
use scotty_protocol::models::ConversationSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub summary: ConversationSummary,
    pub active: bool,
}

/// Ordered, de-duplicated conversation list shown in the sidebar, newest
/// first.
#[derive(Debug, Clone, Default)]
pub struct SidebarRegistry {
    entries: Vec<SidebarEntry>,
}

impl SidebarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SidebarEntry] {
        &self.entries
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.entries.iter().any(|entry| entry.summary.id == id)
    }

    pub fn active(&self) -> Option<ConversationId> {
        self.entries
            .iter()
            .find(|entry| entry.active)
            .map(|entry| entry.summary.id)
    }

    /// Insert `id` at the top of the list. Existing ids are left untouched,
    /// label included. Returns whether an entry was added.
    pub fn upsert(&mut self, id: ConversationId, label: impl Into<String>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.entries.insert(
            0,
            SidebarEntry {
                summary: ConversationSummary {
                    id,
                    label: label.into(),
                },
                active: false,
            },
        );
        true
    }

    /// Make `id` the only active entry. Returns false when `id` is not listed,
    /// in which case every entry ends up inactive.
    pub fn mark_active(&mut self, id: ConversationId) -> bool {
        let mut found = false;
        for entry in &mut self.entries {
            entry.active = entry.summary.id == id;
            found |= entry.active;
        }
        found
    }

    /// Replace every entry with `summaries`, which arrive in creation order,
    /// so the newest ends up first. The active conversation stays active if it
    /// is still listed.
    pub fn rebuild_from(&mut self, summaries: Vec<ConversationSummary>) {
        let active = self.active();
        self.entries.clear();
        for summary in summaries {
            self.upsert(summary.id, summary.label);
        }
        if let Some(id) = active {
            self.mark_active(id);
        }
    }
}
