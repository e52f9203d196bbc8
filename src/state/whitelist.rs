use uuid::Uuid;

use crate::dao::models::{PLACEHOLDER_IDENTITY, WhitelistEntries};

/// In-memory mirror of the persisted whitelist mapping.
///
/// Mutations are staged on a clone of the entries and committed only after
/// the persistence write succeeded, matching the settings mirror.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: WhitelistEntries,
}

impl Whitelist {
    /// Wrap loaded entries.
    pub fn from_entries(entries: WhitelistEntries) -> Self {
        Self { entries }
    }

    /// Whether the identity is exempt from maintenance gating.
    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    /// User-facing listing, with the placeholder row hidden.
    pub fn list(&self) -> Vec<(Uuid, String)> {
        self.entries
            .iter()
            .filter(|(id, _)| **id != PLACEHOLDER_IDENTITY)
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }

    /// True when no real entries exist. A whitelist holding only the
    /// placeholder row counts as empty.
    pub fn is_effectively_empty(&self) -> bool {
        self.entries
            .keys()
            .all(|id| *id == PLACEHOLDER_IDENTITY)
    }

    /// Non-authoritative lookup resolving a display name to candidate
    /// identities, in insertion order. Display names are not unique, so
    /// callers must treat multiple candidates as ambiguous.
    pub fn resolve_name(&self, name: &str) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter(|(_, entry_name)| entry_name.as_str() == name)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Stage an insert-or-overwrite. The boolean reports whether the
    /// identity was newly added; an existing entry still gets its display
    /// name updated.
    pub fn staged_add(&self, id: Uuid, name: String) -> (WhitelistEntries, bool) {
        let mut staged = self.entries.clone();
        let newly_added = staged.insert(id, name).is_none();
        (staged, newly_added)
    }

    /// Stage a removal by identity; `None` when the identity is absent.
    pub fn staged_remove(&self, id: Uuid) -> Option<WhitelistEntries> {
        if !self.entries.contains_key(&id) {
            return None;
        }
        let mut staged = self.entries.clone();
        staged.shift_remove(&id);
        Some(staged)
    }

    /// Clone of the persisted form.
    pub fn entries(&self) -> WhitelistEntries {
        self.entries.clone()
    }

    /// Replace the mirror with entries that were successfully persisted.
    pub fn commit(&mut self, entries: WhitelistEntries) {
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::default_whitelist;

    #[test]
    fn add_then_remove_restores_prior_membership() {
        let mut whitelist = Whitelist::default();
        let id = Uuid::new_v4();

        let (staged, newly_added) = whitelist.staged_add(id, "Player".into());
        assert!(newly_added);
        whitelist.commit(staged);
        assert!(whitelist.contains(id));

        let staged = whitelist.staged_remove(id).unwrap();
        whitelist.commit(staged);
        assert!(!whitelist.contains(id));
        assert!(whitelist.list().is_empty());
    }

    #[test]
    fn second_add_updates_name_and_reports_existing() {
        let mut whitelist = Whitelist::default();
        let id = Uuid::new_v4();

        let (staged, first) = whitelist.staged_add(id, "A".into());
        whitelist.commit(staged);
        let (staged, second) = whitelist.staged_add(id, "B".into());
        whitelist.commit(staged);

        assert!(first);
        assert!(!second);
        assert_eq!(whitelist.list(), vec![(id, "B".to_string())]);
    }

    #[test]
    fn removing_absent_identity_reports_miss() {
        let whitelist = Whitelist::default();
        assert!(whitelist.staged_remove(Uuid::new_v4()).is_none());
    }

    #[test]
    fn placeholder_row_is_hidden_and_counts_as_empty() {
        let whitelist = Whitelist::from_entries(default_whitelist());
        assert!(whitelist.list().is_empty());
        assert!(whitelist.is_effectively_empty());
        assert!(whitelist.contains(PLACEHOLDER_IDENTITY));

        let (staged, _) = whitelist.staged_add(Uuid::new_v4(), "Real".into());
        let whitelist = Whitelist::from_entries(staged);
        assert!(!whitelist.is_effectively_empty());
        assert_eq!(whitelist.list().len(), 1);
    }

    #[test]
    fn name_resolution_returns_candidates_in_order() {
        let mut whitelist = Whitelist::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let (staged, _) = whitelist.staged_add(first, "Twin".into());
        whitelist.commit(staged);
        let (staged, _) = whitelist.staged_add(second, "Twin".into());
        whitelist.commit(staged);

        assert_eq!(whitelist.resolve_name("Twin"), vec![first, second]);
        assert!(whitelist.resolve_name("Nobody").is_empty());
    }
}
