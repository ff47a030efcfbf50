use crate::models::Entry;

/// The in-memory ordered collection of entries currently rendered. Mutators
/// are crate-private; the reconciler is the only component that calls them.
#[derive(Debug, Default)]
pub struct ViewStore {
    entries: Vec<Entry>,
}

impl ViewStore {
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Entry> {
        self.position_of_id(id).map(|idx| &self.entries[idx])
    }

    #[must_use]
    pub fn get_by_temp_id(&self, temp_id: &str) -> Option<&Entry> {
        self.position_of_temp_id(temp_id)
            .map(|idx| &self.entries[idx])
    }

    pub(crate) fn position_of_id(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id.as_deref() == Some(id))
    }

    pub(crate) fn position_of_temp_id(&self, temp_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.temp_id.as_deref() == Some(temp_id))
    }

    pub(crate) fn insert_head(&mut self, entry: Entry) {
        self.entries.insert(0, entry);
    }

    pub(crate) fn replace_at(&mut self, index: usize, entry: Entry) {
        self.entries[index] = entry;
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    pub(crate) fn remove_by_temp_id(&mut self, temp_id: &str) -> Option<Entry> {
        self.position_of_temp_id(temp_id)
            .map(|idx| self.entries.remove(idx))
    }

    pub(crate) fn remove_by_id(&mut self, id: &str) -> Option<Entry> {
        self.position_of_id(id).map(|idx| self.entries.remove(idx))
    }
}
