use std::collections::BTreeSet;

/// Identities allowed into the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    ids: BTreeSet<String>,
}

impl AdminList {
    /// Parse a comma-separated list such as `"alice, bob"`.
    pub fn parse(raw: &str) -> Self {
        raw.split(',').collect()
    }

    pub fn is_admin(&self, andrew_id: &str) -> bool {
        self.ids.contains(&normalize_identity(andrew_id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AdminList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let ids = iter
            .into_iter()
            .map(|s| normalize_identity(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { ids }
    }
}

/// Identities compare trimmed and lower-cased.
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_case_insensitive() {
        let admins = AdminList::parse("Alice,bob");
        assert!(admins.is_admin("alice"));
        assert!(admins.is_admin("  ALICE "));
        assert!(admins.is_admin("bob"));
        assert!(!admins.is_admin("carol"));
    }

    #[test]
    fn test_blank_entries_ignored() {
        let admins = AdminList::parse(" , ,dave,");
        assert_eq!(admins.len(), 1);
        assert!(!admins.is_admin(""));
    }

    #[test]
    fn test_empty_list() {
        let admins = AdminList::default();
        assert!(admins.is_empty());
        assert!(!admins.is_admin("alice"));
    }
}
