//! Fact storage
//!
//! The extensional database is a set of ground literals behind a
//! predicate-keyed index, so the matcher can fetch the candidate facts for a
//! goal without scanning unrelated predicates.

use indexmap::{IndexMap, IndexSet};

use crate::term::Literal;

/// The contract a fact store must satisfy to back a database.
pub trait EdbProvider {
    /// All facts for a given predicate
    fn facts_for(&self, predicate: &str) -> Vec<&Literal>;
    /// Every fact in the store
    fn all(&self) -> Vec<&Literal>;
    /// Add a fact; returns false if it was already present
    fn add(&mut self, fact: Literal) -> bool;
    /// Remove a fact by structural equality; returns whether it was present
    fn remove(&mut self, fact: &Literal) -> bool;
}

/// In-memory fact store indexed by predicate.
#[derive(Debug, Clone, Default)]
pub struct IndexedFactStore {
    by_predicate: IndexMap<String, IndexSet<Literal>>,
}

impl IndexedFactStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact; idempotent under structural equality.
    pub fn add(&mut self, fact: Literal) -> bool {
        self.by_predicate
            .entry(fact.predicate.clone())
            .or_default()
            .insert(fact)
    }

    /// Add every fact of an iterator; returns whether anything new was added.
    pub fn add_all(&mut self, facts: impl IntoIterator<Item = Literal>) -> bool {
        let mut changed = false;
        for fact in facts {
            changed |= self.add(fact);
        }
        changed
    }

    /// Remove a fact by structural equality
    pub fn remove(&mut self, fact: &Literal) -> bool {
        match self.by_predicate.get_mut(&fact.predicate) {
            Some(set) => set.shift_remove(fact),
            None => false,
        }
    }

    /// Check membership by structural equality
    #[must_use]
    pub fn contains(&self, fact: &Literal) -> bool {
        self.by_predicate
            .get(&fact.predicate)
            .is_some_and(|set| set.contains(fact))
    }

    /// Facts stored under one predicate
    pub fn facts_for<'s>(&'s self, predicate: &str) -> impl Iterator<Item = &'s Literal> {
        self.by_predicate.get(predicate).into_iter().flatten()
    }

    /// Every fact in the store
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.by_predicate.values().flatten()
    }

    /// The predicates currently indexed
    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        self.by_predicate.keys().map(String::as_str)
    }

    /// Total number of facts
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_predicate.values().map(IndexSet::len).sum()
    }

    /// Check whether the store holds no facts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EdbProvider for IndexedFactStore {
    fn facts_for(&self, predicate: &str) -> Vec<&Literal> {
        IndexedFactStore::facts_for(self, predicate).collect()
    }

    fn all(&self) -> Vec<&Literal> {
        self.iter().collect()
    }

    fn add(&mut self, fact: Literal) -> bool {
        IndexedFactStore::add(self, fact)
    }

    fn remove(&mut self, fact: &Literal) -> bool {
        IndexedFactStore::remove(self, fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(pred: &str, terms: &[&str]) -> Literal {
        Literal::new(pred, terms.iter().copied())
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = IndexedFactStore::new();
        assert!(store.add(fact("parent", &["a", "b"])));
        assert!(!store.add(fact("parent", &["a", "b"])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_all_reports_newness() {
        let mut store = IndexedFactStore::new();
        store.add(fact("p", &["a"]));
        assert!(store.add_all([fact("p", &["a"]), fact("p", &["b"])]));
        assert!(!store.add_all([fact("p", &["a"]), fact("p", &["b"])]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_by_structural_equality() {
        let mut store = IndexedFactStore::new();
        store.add(fact("parent", &["a", "b"]));
        assert!(store.remove(&fact("parent", &["a", "b"])));
        assert!(!store.remove(&fact("parent", &["a", "b"])));
        assert!(!store.remove(&fact("other", &["a"])));
        assert!(store.is_empty());
    }

    #[test]
    fn test_predicate_index() {
        let mut store = IndexedFactStore::new();
        store.add(fact("parent", &["a", "b"]));
        store.add(fact("parent", &["a", "c"]));
        store.add(fact("age", &["a", "40"]));

        assert_eq!(store.facts_for("parent").count(), 2);
        assert_eq!(store.facts_for("age").count(), 1);
        assert_eq!(store.facts_for("missing").count(), 0);

        let predicates: Vec<&str> = store.predicates().collect();
        assert_eq!(predicates, vec!["parent", "age"]);
    }

    #[test]
    fn test_distinct_arity_facts_coexist() {
        let mut store = IndexedFactStore::new();
        store.add(fact("p", &["a"]));
        store.add(fact("p", &["a", "b"]));
        assert_eq!(store.facts_for("p").count(), 2);
    }
}
