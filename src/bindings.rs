//! Scoped variable bindings
//!
//! The matcher extends a bindings scope on every recursion step. Instead of
//! deep-copying the environment, a child scope holds only its own entries and
//! a reference to its parent; lookups walk the chain. Only the leaf scope is
//! ever written, so parents stay immutable for the whole recursion.

use indexmap::IndexMap;

use crate::term::Term;

/// A variable→term environment with copy-on-extend semantics.
#[derive(Debug, Default)]
pub struct Bindings<'a> {
    local: IndexMap<String, Term>,
    parent: Option<&'a Bindings<'a>>,
}

impl<'a> Bindings<'a> {
    /// Create an empty root scope
    #[must_use]
    pub fn new() -> Bindings<'static> {
        Bindings {
            local: IndexMap::new(),
            parent: None,
        }
    }

    /// Create a root scope from name/value pairs. Values are taken as
    /// symbols; use [`Bindings::bind`] to bind arbitrary terms.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Bindings<'static>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut root = Bindings::new();
        for (name, value) in pairs {
            root.bind(name, Term::symbol(value.as_ref()));
        }
        root
    }

    /// Open a child scope. Writes go to the child; the parent is only read.
    #[must_use]
    pub fn child(&self) -> Bindings<'_> {
        Bindings {
            local: IndexMap::new(),
            parent: Some(self),
        }
    }

    /// Look up a variable, consulting this scope first and then the ancestors.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Term> {
        match self.local.get(name) {
            Some(term) => Some(term),
            None => self.parent.and_then(|p| p.get(name)),
        }
    }

    /// Check whether a variable is bound anywhere in the chain
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind a variable in this scope.
    ///
    /// # Panics
    ///
    /// Panics if the variable is already bound in this scope or an ancestor;
    /// rebinding means the matcher lost track of its scopes.
    pub fn bind(&mut self, name: impl Into<String>, value: Term) {
        let name = name.into();
        assert!(
            !self.contains(&name),
            "variable {name} is already bound in an enclosing scope"
        );
        self.local.insert(name, value);
    }

    /// Number of distinct bound variables across the chain
    #[must_use]
    pub fn len(&self) -> usize {
        // Scopes never shadow (bind asserts), so counts are disjoint.
        self.local.len() + self.parent.map_or(0, Bindings::len)
    }

    /// Check whether no variable is bound in the chain
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapse the chain into a single detached map, outermost entries first.
    #[must_use]
    pub fn flatten(&self) -> IndexMap<String, Term> {
        let mut map = match self.parent {
            Some(parent) => parent.flatten(),
            None => IndexMap::new(),
        };
        for (name, term) in &self.local {
            map.insert(name.clone(), term.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut root = Bindings::new();
        root.bind("X", Term::symbol("a"));

        let mut child = root.child();
        child.bind("Y", Term::symbol("b"));

        assert_eq!(child.get("X"), Some(&Term::symbol("a")));
        assert_eq!(child.get("Y"), Some(&Term::symbol("b")));
        assert_eq!(child.get("Z"), None);
        // The parent never sees child entries
        assert_eq!(root.get("Y"), None);
    }

    #[test]
    fn test_len_counts_across_chain() {
        let mut root = Bindings::new();
        root.bind("X", Term::symbol("a"));
        let mut child = root.child();
        child.bind("Y", Term::symbol("b"));
        let grandchild = child.child();

        assert_eq!(root.len(), 1);
        assert_eq!(child.len(), 2);
        assert_eq!(grandchild.len(), 2);
        assert!(!grandchild.is_empty());
        assert!(Bindings::new().is_empty());
    }

    #[test]
    fn test_flatten_detaches() {
        let mut root = Bindings::new();
        root.bind("X", Term::symbol("a"));
        let mut child = root.child();
        child.bind("Y", Term::symbol("b"));

        let flat = child.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get("X"), Some(&Term::symbol("a")));
        assert_eq!(flat.get("Y"), Some(&Term::symbol("b")));
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_rebinding_panics() {
        let mut root = Bindings::new();
        root.bind("X", Term::symbol("a"));
        let mut child = root.child();
        child.bind("X", Term::symbol("b"));
    }

    #[test]
    fn test_from_pairs() {
        let bindings = Bindings::from_pairs([("A", "aaa")]);
        assert_eq!(bindings.get("A"), Some(&Term::symbol("aaa")));
        assert_eq!(bindings.len(), 1);
    }
}
