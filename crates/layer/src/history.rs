//! In-memory stand-in for the browser's session history.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub location: String,
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn location(&self) -> Option<&str> {
        self.current().map(|e| e.location.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.current().and_then(|e| e.title.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Show `location`. A new entry is pushed unless it is already current,
    /// in which case only the title is updated.
    pub fn visit(&mut self, location: &str, title: Option<&str>) {
        if let Some(current) = self.entries.last_mut() {
            if current.location == location {
                if title.is_some() {
                    current.title = title.map(str::to_string);
                }
                return;
            }
        }
        log::debug!(target: "splice.layer", "history push {location}");
        self.entries.push(HistoryEntry {
            location: location.to_string(),
            title: title.map(str::to_string),
        });
    }

    /// Overwrite the current entry.
    pub fn replace(&mut self, location: &str, title: Option<&str>) {
        let entry = HistoryEntry {
            location: location.to_string(),
            title: title.map(str::to_string),
        };
        match self.entries.last_mut() {
            Some(current) => *current = entry,
            None => self.entries.push(entry),
        }
    }
}
