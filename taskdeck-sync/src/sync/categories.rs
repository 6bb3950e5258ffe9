use taskdeck_core::{CategoryChange, CategoryRow, ChangeKind};

/// Seeded into an empty categories table on first load.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("work", "#2563eb"),
    ("personal", "#059669"),
    ("errands", "#d97706"),
    ("learning", "#9333ea"),
];

/// Color assigned when a category is created without one.
pub const FALLBACK_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub color: String,
}

pub fn category_from_row(row: &CategoryRow) -> Category {
    Category {
        id: row.id.clone(),
        // older schema revisions used a `label` column
        label: row
            .label
            .clone()
            .or_else(|| row.name.clone())
            .unwrap_or_default(),
        color: row.color.clone().unwrap_or_else(|| "#2563eb".to_string()),
    }
}

/// Label-sorted category list for the scope. Labels are unique
/// case-insensitively.
#[derive(Debug, Default)]
pub struct CategoryBoard {
    items: Vec<Category>,
}

impl CategoryBoard {
    pub fn as_slice(&self) -> &[Category] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_by_label(&self, label: &str) -> Option<&Category> {
        let key = label.trim().to_lowercase();
        self.items
            .iter()
            .find(|category| category.label.to_lowercase() == key)
    }

    pub fn upsert(&mut self, category: Category) {
        self.items.retain(|existing| existing.id != category.id);
        self.items.push(category);
        self.sort();
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|category| category.id != id);
    }

    pub fn replace_all(&mut self, items: Vec<Category>) {
        self.items = items;
        self.sort();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn apply_change(&mut self, change: CategoryChange) {
        match change.kind {
            ChangeKind::Delete => {
                if let Some(id) = change.old_id.as_deref() {
                    self.remove(id);
                }
            }
            ChangeKind::Insert | ChangeKind::Update => {
                if let Some(row) = change.new.as_ref() {
                    self.upsert(category_from_row(row));
                }
            }
        }
    }

    fn sort(&mut self) {
        self.items
            .sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    }
}
