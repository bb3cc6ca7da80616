use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// A node in the category tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Lookup structure over the category tree.
///
/// Descendant resolution walks the tree with an explicit work queue so stack
/// depth stays bounded regardless of tree depth. The tree is assumed
/// cycle-free; visited-id tracking guards termination against bad data.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    by_id: HashMap<Uuid, Category>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl CategoryIndex {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut by_id = HashMap::new();
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

        for category in categories {
            if let Some(parent) = category.parent_id {
                children.entry(parent).or_default().push(category.id);
            }
            by_id.insert(category.id, category);
        }

        Self { by_id, children }
    }

    pub fn get(&self, id: Uuid) -> Option<&Category> {
        self.by_id.get(&id)
    }

    pub fn name_of(&self, id: Uuid) -> Option<&str> {
        self.by_id.get(&id).map(|c| c.name.as_str())
    }

    /// Resolve a category id to itself plus all transitive descendants.
    pub fn with_descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut resolved = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            if resolved.contains(&current) {
                continue;
            }
            resolved.push(current);

            if let Some(child_ids) = self.children.get(&current) {
                for child in child_ids {
                    queue.push_back(*child);
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, parent: Option<Uuid>) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id: parent,
        }
    }

    #[test]
    fn test_descendants_include_self() {
        let root = category("Machinery", None);
        let index = CategoryIndex::new(vec![root.clone()]);

        assert_eq!(index.with_descendants(root.id), vec![root.id]);
    }

    #[test]
    fn test_descendants_are_transitive() {
        let root = category("Machinery", None);
        let mid = category("Mixers", Some(root.id));
        let leaf = category("Planetary Mixers", Some(mid.id));
        let other = category("Forklifts", None);

        let index = CategoryIndex::new(vec![
            root.clone(),
            mid.clone(),
            leaf.clone(),
            other.clone(),
        ]);

        let resolved = index.with_descendants(root.id);
        assert_eq!(resolved.len(), 3);
        assert!(resolved.contains(&root.id));
        assert!(resolved.contains(&mid.id));
        assert!(resolved.contains(&leaf.id));
        assert!(!resolved.contains(&other.id));
    }

    #[test]
    fn test_deep_chain_resolves_without_recursion() {
        let mut categories = vec![category("root", None)];
        for i in 1..500 {
            let parent = categories[i - 1].id;
            categories.push(category(&format!("level-{i}"), Some(parent)));
        }
        let root_id = categories[0].id;

        let index = CategoryIndex::new(categories);
        assert_eq!(index.with_descendants(root_id).len(), 500);
    }
}
