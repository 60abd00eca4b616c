//! The definition registry.
//!
//! Achievements live in an arena keyed by [`AchievementId`]; a definition
//! refers to its parent by id, never by pointer, and the child index is
//! derived. Every write keeps the parent graph a forest:
//!
//! - a parent must already be registered,
//! - following parent links from any definition never returns to it.
//!
//! Parent walks are additionally bounded by the number of definitions, so
//! they terminate even on a graph that somehow broke the invariant.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use accolade_types::{Achievement, AchievementId, DefinitionError};

/// Arena of achievement definitions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: BTreeMap<AchievementId, Arc<Achievement>>,
    children: BTreeMap<AchievementId, BTreeSet<AchievementId>>,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Build a registry from a complete definition set, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateId`] if two definitions share an
    /// id, [`DefinitionError::UnknownParent`] if a parent is missing from
    /// the set, and [`DefinitionError::ParentCycle`] if the parent links
    /// form a cycle.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = Achievement>,
    ) -> Result<Self, DefinitionError> {
        let mut registry = Self::new();
        for definition in definitions {
            let id = definition.id().clone();
            if registry.definitions.contains_key(&id) {
                return Err(DefinitionError::DuplicateId(id));
            }
            registry.definitions.insert(id, Arc::new(definition));
        }

        for definition in registry.definitions.values() {
            if let Some(parent) = definition.parent() {
                if !registry.definitions.contains_key(parent) {
                    return Err(DefinitionError::UnknownParent {
                        id: definition.id().clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for id in registry.definitions.keys() {
            if registry.ancestors(id).any(|ancestor| ancestor.id() == id) {
                return Err(DefinitionError::ParentCycle { id: id.clone() });
            }
        }

        for definition in registry.definitions.values() {
            if let Some(parent) = definition.parent() {
                registry
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .insert(definition.id().clone());
            }
        }

        Ok(registry)
    }

    /// Insert a definition, replacing any previous one with the same id.
    ///
    /// Returns the replaced definition, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::UnknownParent`] if the parent is not
    /// registered, or [`DefinitionError::ParentCycle`] if the new parent
    /// link would close a cycle. The registry is unchanged on error.
    pub fn insert(
        &mut self,
        definition: Achievement,
    ) -> Result<Option<Arc<Achievement>>, DefinitionError> {
        let id = definition.id().clone();
        if let Some(parent) = definition.parent() {
            if !self.definitions.contains_key(parent) {
                return Err(DefinitionError::UnknownParent {
                    id,
                    parent: parent.clone(),
                });
            }
            let closes_cycle = parent == &id
                || self
                    .ancestors(parent)
                    .any(|ancestor| ancestor.id() == &id);
            if closes_cycle {
                return Err(DefinitionError::ParentCycle { id });
            }
        }

        let new_parent = definition.parent().cloned();
        let previous = self.definitions.insert(id.clone(), Arc::new(definition));

        if let Some(old_parent) = previous.as_ref().and_then(|p| p.parent()) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.remove(&id);
                if siblings.is_empty() {
                    self.children.remove(old_parent);
                }
            }
        }
        if let Some(parent) = new_parent {
            self.children.entry(parent).or_default().insert(id);
        }

        Ok(previous)
    }

    /// Look up a definition.
    pub fn get(&self, id: &AchievementId) -> Option<&Arc<Achievement>> {
        self.definitions.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &AchievementId) -> bool {
        self.definitions.contains_key(id)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All registered ids, in order.
    pub fn ids(&self) -> impl Iterator<Item = &AchievementId> + Clone {
        self.definitions.keys()
    }

    /// All definitions, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Achievement>> {
        self.definitions.values()
    }

    /// Definitions without a parent (category heads).
    pub fn roots(&self) -> impl Iterator<Item = &Arc<Achievement>> {
        self.definitions
            .values()
            .filter(|definition| definition.parent().is_none())
    }

    /// Direct children of `id`.
    pub fn children(&self, id: &AchievementId) -> impl Iterator<Item = &Arc<Achievement>> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.definitions.get(child))
    }

    /// Walk the parent chain of `id`, nearest parent first.
    ///
    /// The walk yields at most [`len`](Self::len) items.
    pub fn ancestors<'a>(&'a self, id: &AchievementId) -> Ancestors<'a> {
        Ancestors {
            registry: self,
            next: self.definitions.get(id).and_then(|d| d.parent()),
            remaining: self.definitions.len(),
        }
    }

    /// Ids whose visibility may change when the progress of `id` changes:
    /// `id` itself and every direct child whose rule reads its parent.
    pub fn visibility_dependents(&self, id: &AchievementId) -> BTreeSet<AchievementId> {
        let mut scope = BTreeSet::from([id.clone()]);
        scope.extend(
            self.children(id)
                .filter(|child| child.visibility().reads_parent())
                .map(|child| child.id().clone()),
        );
        scope
    }
}

/// Bounded iterator over a definition's parent chain.
#[derive(Debug)]
pub struct Ancestors<'a> {
    registry: &'a Registry,
    next: Option<&'a AchievementId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Arc<Achievement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        let current = self.registry.definitions.get(self.next?)?;
        self.next = current.parent();
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use accolade_types::{Display, Visibility};

    use super::*;

    fn id(path: &str) -> AchievementId {
        AchievementId::new("test", path).unwrap()
    }

    fn def(path: &str, parent: Option<&str>) -> Achievement {
        let mut builder = Achievement::builder(id(path), Display::new(0.0, 0.0, "icon", path, ""));
        if let Some(parent) = parent {
            builder = builder.parent(id(parent));
        }
        builder.build().unwrap()
    }

    #[test]
    fn builds_forest_in_any_order() {
        let registry = Registry::from_definitions([
            def("grandchild", Some("child")),
            def("child", Some("root")),
            def("root", None),
            def("other_root", None),
        ])
        .unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.roots().count(), 2);
        let children: Vec<_> = registry.children(&id("root")).map(|c| c.id().clone()).collect();
        assert_eq!(children, vec![id("child")]);
    }

    #[test]
    fn ancestors_walk_nearest_first() {
        let registry = Registry::from_definitions([
            def("root", None),
            def("child", Some("root")),
            def("grandchild", Some("child")),
        ])
        .unwrap();
        let chain: Vec<_> = registry
            .ancestors(&id("grandchild"))
            .map(|a| a.id().path().to_owned())
            .collect();
        assert_eq!(chain, vec!["child", "root"]);
        assert_eq!(registry.ancestors(&id("root")).count(), 0);
        assert_eq!(registry.ancestors(&id("missing")).count(), 0);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Registry::from_definitions([def("root", None), def("root", None)]);
        assert_eq!(result.unwrap_err(), DefinitionError::DuplicateId(id("root")));
    }

    #[test]
    fn rejects_unknown_parent() {
        let result = Registry::from_definitions([def("orphan", Some("nobody"))]);
        assert!(matches!(result, Err(DefinitionError::UnknownParent { .. })));
    }

    #[test]
    fn rejects_two_node_cycle() {
        let result = Registry::from_definitions([def("a", Some("b")), def("b", Some("a"))]);
        assert!(matches!(result, Err(DefinitionError::ParentCycle { .. })));
    }

    #[test]
    fn rejects_cycle_reached_through_a_tail() {
        let result = Registry::from_definitions([
            def("tail", Some("a")),
            def("a", Some("b")),
            def("b", Some("c")),
            def("c", Some("a")),
        ]);
        assert!(matches!(result, Err(DefinitionError::ParentCycle { .. })));
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut registry = Registry::new();
        assert!(registry.insert(def("root", None)).unwrap().is_none());
        let previous = registry.insert(def("root", None)).unwrap();
        assert_eq!(previous.unwrap().id(), &id("root"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insert_requires_registered_parent() {
        let mut registry = Registry::new();
        let result = registry.insert(def("child", Some("root")));
        assert!(matches!(result, Err(DefinitionError::UnknownParent { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn insert_rejects_reparenting_into_own_subtree() {
        let mut registry = Registry::new();
        registry.insert(def("a", None)).unwrap();
        registry.insert(def("b", Some("a"))).unwrap();
        registry.insert(def("c", Some("b"))).unwrap();

        let result = registry.insert(def("a", Some("c")));
        assert_eq!(result.unwrap_err(), DefinitionError::ParentCycle { id: id("a") });
        assert!(registry.get(&id("a")).unwrap().parent().is_none());
    }

    #[test]
    fn reparenting_moves_child_index() {
        let mut registry = Registry::new();
        registry.insert(def("r1", None)).unwrap();
        registry.insert(def("r2", None)).unwrap();
        registry.insert(def("leaf", Some("r1"))).unwrap();
        registry.insert(def("leaf", Some("r2"))).unwrap();

        assert_eq!(registry.children(&id("r1")).count(), 0);
        assert_eq!(registry.children(&id("r2")).count(), 1);
    }

    #[test]
    fn dependents_include_parent_reading_children_only() {
        let reads_parent = Achievement::builder(id("shown_after"), Display::new(0.0, 0.0, "i", "t", "d"))
            .parent(id("root"))
            .visibility(Visibility::any([Visibility::Granted, Visibility::ParentGranted]))
            .build()
            .unwrap();
        let own_rule = Achievement::builder(id("own"), Display::new(0.0, 0.0, "i", "t", "d"))
            .parent(id("root"))
            .visibility(Visibility::HaveProgress)
            .build()
            .unwrap();
        let registry =
            Registry::from_definitions([def("root", None), reads_parent, own_rule]).unwrap();

        let scope = registry.visibility_dependents(&id("root"));
        assert_eq!(scope, BTreeSet::from([id("root"), id("shown_after")]));
    }
}
