use crate::storage::Entry;

/// Entries of one `list_contents` call with a read cursor / 目录列表游标
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    entries: Vec<Entry>,
    cursor: usize,
}

impl DirectoryListing {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub fn current(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }

    /// Return the current entry and move past it; `None` once exhausted
    pub fn advance(&mut self) -> Option<&Entry> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
            self.entries.get(self.cursor - 1)
        } else {
            None
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
