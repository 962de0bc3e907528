//! Read-only catalog access.
//!
//! Matching and execution only ever read skills through [`SkillCatalog`].
//! How skills are stored and refreshed is the implementor's business; the
//! bundled [`InMemoryCatalog`] is an immutable snapshot, so a refresh means
//! building a new one.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::loader::load_skills_from_dir;
use crate::types::SkillDefinition;

/// Lookup interface over a set of skills.
pub trait SkillCatalog: Send + Sync {
    /// Every skill in the catalog, in a stable order.
    fn list_all(&self) -> Vec<Arc<SkillDefinition>>;

    /// A single skill by identifier.
    fn by_id(&self, id: &str) -> Option<Arc<SkillDefinition>>;
}

/// An immutable catalog snapshot, ordered by skill id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    skills: BTreeMap<String, Arc<SkillDefinition>>,
}

impl InMemoryCatalog {
    /// Build a catalog from definitions.  Later duplicates replace earlier ones.
    pub fn new(definitions: impl IntoIterator<Item = SkillDefinition>) -> Self {
        let mut skills = BTreeMap::new();
        for skill in definitions {
            let id = skill.id.clone();
            if skills.insert(id.clone(), Arc::new(skill)).is_some() {
                tracing::warn!(id = %id, "duplicate skill id, keeping the last definition");
            }
        }
        Self { skills }
    }

    /// Build a catalog from every skill file in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(load_skills_from_dir(dir)?))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl SkillCatalog for InMemoryCatalog {
    fn list_all(&self) -> Vec<Arc<SkillDefinition>> {
        self.skills.values().cloned().collect()
    }

    fn by_id(&self, id: &str) -> Option<Arc<SkillDefinition>> {
        self.skills.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: &str, name: &str) -> SkillDefinition {
        SkillDefinition::new(id, name, "test", "")
    }

    #[test]
    fn list_is_ordered_by_id() {
        let catalog = InMemoryCatalog::new([skill("b", "B"), skill("a", "A"), skill("c", "C")]);
        let ids: Vec<String> = catalog.list_all().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn duplicate_ids_keep_last() {
        let catalog = InMemoryCatalog::new([skill("a", "first"), skill("a", "second")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.by_id("a").unwrap().name, "second");
    }

    #[test]
    fn unknown_id_is_none() {
        let catalog = InMemoryCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.by_id("missing").is_none());
    }
}
