use crate::models::DirectoryUser;

/// Ordered set of selected directory users, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<DirectoryUser>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `user` unless already selected. Returns whether it was added.
    pub fn add(&mut self, user: DirectoryUser) -> bool {
        if self.contains(&user.id) {
            return false;
        }
        self.entries.push(user);
        true
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|u| u.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|u| u.id == id)
    }

    pub fn entries(&self) -> &[DirectoryUser] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|u| u.id.clone()).collect()
    }

    /// The `members_json` form field value.
    pub fn to_members_json(&self) -> String {
        serde_json::Value::from(self.ids()).to_string()
    }

    /// `results` minus anything already selected, order preserved.
    pub fn filter_results(&self, results: &[DirectoryUser]) -> Vec<DirectoryUser> {
        results
            .iter()
            .filter(|u| !self.contains(&u.id))
            .cloned()
            .collect()
    }
}
