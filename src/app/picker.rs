/// A list with a highlighted row.
#[derive(Debug)]
pub struct Picker<T> {
    items: Vec<T>,
    selected: usize,
}

impl<T> Default for Picker<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
        }
    }
}

impl<T: PartialEq + Clone> Picker<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the items, keeping the highlight on the same item when it
    /// is still present.
    pub fn set_items(&mut self, items: Vec<T>) {
        let keep = self.selected().cloned();
        self.items = items;
        self.selected = keep
            .and_then(|k| self.items.iter().position(|i| *i == k))
            .unwrap_or_else(|| self.selected.min(self.items.len().saturating_sub(1)));
    }

    /// Wraps around.
    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    /// Wraps around.
    pub fn prev(&mut self) {
        if !self.items.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.items.len() - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }
}
