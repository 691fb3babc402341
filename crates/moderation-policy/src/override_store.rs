use serde_json::Value;

/// Runtime overrides kept apart from the loaded base so reloads can replay them.
#[derive(Clone, Debug, Default)]
pub struct RuntimeOverrideStore {
    entries: Vec<RuntimeOverrideEntry>,
}

#[derive(Clone, Debug)]
pub struct RuntimeOverrideEntry {
    pub path: String,
    pub value: Value,
}

impl RuntimeOverrideStore {
    /// Replaces an existing override for `path` in place, otherwise appends.
    pub fn insert(&mut self, path: String, value: Value) {
        match self.entries.iter_mut().find(|entry| entry.path == path) {
            Some(entry) => entry.value = value,
            None => self.entries.push(RuntimeOverrideEntry { path, value }),
        }
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[RuntimeOverrideEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
