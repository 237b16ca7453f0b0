//! The deductive engine
//!
//! A [`Database`] holds the extensional database (ground facts) and the
//! intensional database (rules). Queries run bottom-up: the relevant slice of
//! the EDB is copied into a scratch store, expanded to a fixed point stratum
//! by stratum, and the goals are then matched against the expanded store.
//!
//! Expansion is semi-naive: after the first round of a stratum, only the
//! rules that consume a predicate derived in the previous round are fired
//! again, so quiescent rules cost nothing.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::bindings::Bindings;
use crate::error::Result;
use crate::parser;
use crate::statement::Statement;
use crate::storage::{EdbProvider, IndexedFactStore};
use crate::stratify::stratify;
use crate::term::{Literal, Rule, Term};

/// A single query answer: variable name to the printed form of its binding.
pub type Answer = IndexMap<String, String>;

/// An in-memory deductive database.
#[derive(Debug)]
pub struct Database<P: EdbProvider = IndexedFactStore> {
    edb: P,
    rules: Vec<Rule>,
    /// Stratification of `rules`, computed lazily and dropped whenever the
    /// rule set changes or facts are deleted.
    strata: Option<Vec<Vec<Rule>>>,
}

impl Database<IndexedFactStore> {
    /// Create an empty database backed by the in-memory fact store
    #[must_use]
    pub fn new() -> Self {
        Database::with_provider(IndexedFactStore::new())
    }
}

impl Default for Database<IndexedFactStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: EdbProvider> Database<P> {
    /// Create an empty database backed by a custom fact store
    #[must_use]
    pub fn with_provider(edb: P) -> Self {
        Database {
            edb,
            rules: Vec::new(),
            strata: None,
        }
    }

    /// Assert a ground fact. Returns false if it was already present.
    pub fn fact(&mut self, fact: Literal) -> Result<bool> {
        fact.validate_as_fact()?;
        Ok(self.edb.add(fact))
    }

    /// Add a rule after checking it is range-restricted
    pub fn rule(&mut self, rule: Rule) -> Result<()> {
        rule.validate()?;
        self.rules.push(rule);
        self.strata = None;
        Ok(())
    }

    /// Parse and execute a program, returning the answers of every query
    /// statement in it.
    pub fn execute_all(&mut self, source: &str) -> Result<Vec<Answer>> {
        let statements = parser::parse_program(source)?;
        let mut answers = Vec::new();
        for statement in &statements {
            answers.extend(statement.execute(self, None)?);
        }
        Ok(answers)
    }

    /// Parse a single statement for later execution
    pub fn prepare_statement(&self, source: &str) -> Result<Statement> {
        parser::parse_statement(source)
    }

    /// Run a conjunctive query and return all satisfying answers
    pub fn query(&mut self, goals: Vec<Literal>) -> Result<Vec<Answer>> {
        self.query_with_bindings(goals, None)
    }

    /// Run a conjunctive query starting from the given bindings
    pub fn query_with_bindings(
        &mut self,
        goals: Vec<Literal>,
        bindings: Option<&Bindings<'_>>,
    ) -> Result<Vec<Answer>> {
        let raw = self.solve(&goals, bindings)?;
        Ok(raw.into_iter().map(answer_from).collect())
    }

    /// Check whether a query has at least one answer
    pub fn ask(&mut self, goals: Vec<Literal>) -> Result<bool> {
        Ok(!self.solve(&goals, None)?.is_empty())
    }

    /// Delete every EDB fact matching a ground instance of the goals under
    /// some answer of the conjunction. Returns whether anything was removed.
    pub fn delete(&mut self, goals: Vec<Literal>) -> Result<bool> {
        self.delete_with_bindings(goals, None)
    }

    /// [`Database::delete`] starting from the given bindings
    pub fn delete_with_bindings(
        &mut self,
        goals: Vec<Literal>,
        bindings: Option<&Bindings<'_>>,
    ) -> Result<bool> {
        let raw = self.solve(&goals, bindings)?;
        let mut removed = false;
        for binding in &raw {
            for goal in &goals {
                // Only positive non-built-in goals denote stored facts.
                if goal.negated || goal.is_builtin() {
                    continue;
                }
                let ground = project(goal, binding);
                if ground.is_ground() && self.edb.remove(&ground) {
                    trace!("deleted {ground}");
                    removed = true;
                }
            }
        }
        self.strata = None;
        Ok(removed)
    }

    /// Re-check every stored rule and fact, and stratify the rule set so
    /// negative recursion is reported eagerly.
    pub fn validate(&mut self) -> Result<()> {
        for rule in &self.rules {
            rule.validate()?;
        }
        for fact in self.edb.all() {
            fact.validate_as_fact()?;
        }
        self.ensure_stratified()
    }

    /// The stored rules
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The backing fact store
    #[must_use]
    pub fn edb(&self) -> &P {
        &self.edb
    }

    fn ensure_stratified(&mut self) -> Result<()> {
        if self.strata.is_none() {
            self.strata = Some(stratify(&self.rules)?);
        }
        Ok(())
    }

    /// The query driver: relevance pruning, expansion, matching.
    fn solve(
        &mut self,
        goals: &[Literal],
        bindings: Option<&Bindings<'_>>,
    ) -> Result<Vec<IndexMap<String, Term>>> {
        if goals.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_stratified()?;

        let relevant = self.relevant_predicates(goals);
        debug!(
            "query on {} goals, {} relevant predicates",
            goals.len(),
            relevant.len()
        );

        let mut scratch = IndexedFactStore::new();
        for fact in self.edb.all() {
            if relevant.contains(fact.predicate.as_str()) {
                scratch.add(fact.clone());
            }
        }

        let strata = self.strata.as_ref().expect("stratification cached above");
        for stratum in strata {
            let selected: Vec<&Rule> = stratum
                .iter()
                .filter(|rule| relevant.contains(rule.head.predicate.as_str()))
                .collect();
            expand_stratum(&mut scratch, &selected)?;
        }

        let ordered = reorder_goals(goals);
        let root = Bindings::new();
        let mut results = Vec::new();
        match_goals(&ordered, &scratch, bindings.unwrap_or(&root), &mut results)?;
        Ok(results)
    }

    /// Closure of the goal predicates over the rule graph: a predicate is
    /// relevant when some relevant rule head can reach it.
    fn relevant_predicates(&self, goals: &[Literal]) -> IndexSet<String> {
        let mut relevant: IndexSet<String> =
            goals.iter().map(|goal| goal.predicate.clone()).collect();
        loop {
            let before = relevant.len();
            for rule in &self.rules {
                if relevant.contains(&rule.head.predicate) {
                    for literal in &rule.body {
                        relevant.insert(literal.predicate.clone());
                    }
                }
            }
            if relevant.len() == before {
                return relevant;
            }
        }
    }
}

/// Compute the fixed point of one stratum over the store.
///
/// The dependency index maps each predicate to the rules consuming it; after
/// the first round only rules registered under a freshly derived predicate
/// stay active.
fn expand_stratum(store: &mut IndexedFactStore, rules: &[&Rule]) -> Result<()> {
    if rules.is_empty() {
        return Ok(());
    }
    let mut dependents: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, rule) in rules.iter().enumerate() {
        for literal in &rule.body {
            dependents
                .entry(literal.predicate.as_str())
                .or_default()
                .push(idx);
        }
    }

    let mut active: IndexSet<usize> = (0..rules.len()).collect();
    let mut round = 0usize;
    loop {
        round += 1;
        let mut fresh: Vec<Literal> = Vec::new();
        for &idx in &active {
            let rule = rules[idx];
            let body = reorder_goals(&rule.body);
            let mut matches = Vec::new();
            match_goals(&body, store, &Bindings::new(), &mut matches)?;
            for binding in matches {
                let derived = project(&rule.head, &binding);
                if derived.is_ground() && !store.contains(&derived) {
                    fresh.push(derived);
                }
            }
        }
        if fresh.is_empty() {
            trace!("stratum fixed point after {round} rounds");
            return Ok(());
        }
        active = fresh
            .iter()
            .filter_map(|fact| dependents.get(fact.predicate.as_str()))
            .flatten()
            .copied()
            .collect();
        trace!(
            "round {round}: {} new facts, {} rules reactivated",
            fresh.len(),
            active.len()
        );
        store.add_all(fresh);
    }
}

/// Match a conjunction of goals against the store, accumulating every
/// fully-extended binding environment as a flattened map.
fn match_goals(
    goals: &[Literal],
    facts: &IndexedFactStore,
    bindings: &Bindings<'_>,
    out: &mut Vec<IndexMap<String, Term>>,
) -> Result<()> {
    let Some((goal, rest)) = goals.split_first() else {
        out.push(bindings.flatten());
        return Ok(());
    };

    if goal.is_builtin() {
        // `=` may bind a variable, so evaluate in a child scope.
        let mut scope = bindings.child();
        let holds = goal.eval_builtin(&mut scope)?;
        if holds != goal.negated {
            match_goals(rest, facts, &scope, out)?;
        }
    } else if !goal.negated {
        for fact in facts.facts_for(&goal.predicate) {
            let mut scope = bindings.child();
            if unify(goal, fact, &mut scope) {
                match_goals(rest, facts, &scope, out)?;
            }
        }
    } else {
        // Negation as failure: the branch survives only when no stored fact
        // matches the goal under the current bindings.
        let probe = goal.substitute(bindings);
        let refuted = facts.facts_for(&probe.predicate).any(|fact| {
            let mut scope = bindings.child();
            unify(&probe, fact, &mut scope)
        });
        if !refuted {
            match_goals(rest, facts, bindings, out)?;
        }
    }
    Ok(())
}

/// Position-wise unification of a goal against a ground fact.
///
/// Bound variables must agree with the fact; unbound variables are bound into
/// `scope`. Bindings are not transitively chased; callers substitute first
/// when that matters.
fn unify(goal: &Literal, fact: &Literal, scope: &mut Bindings<'_>) -> bool {
    if goal.predicate != fact.predicate || goal.arity() != fact.arity() {
        return false;
    }
    for (term, fact_term) in goal.terms.iter().zip(&fact.terms) {
        match term {
            Term::Variable(name) => {
                if let Some(bound) = scope.get(name) {
                    if bound != fact_term {
                        return false;
                    }
                } else {
                    scope.bind(name.clone(), fact_term.clone());
                }
            }
            Term::Symbol(_) => {
                if term != fact_term {
                    return false;
                }
            }
        }
    }
    true
}

/// Reorder goals so the matcher sees positive non-built-in literals (and `=`,
/// the one built-in that may bind) first, then negated literals and the other
/// built-ins in their original order.
fn reorder_goals(goals: &[Literal]) -> Vec<Literal> {
    let deferred = |goal: &Literal| goal.negated || (goal.is_builtin() && goal.predicate != "=");
    let mut ordered: Vec<Literal> = goals.iter().filter(|g| !deferred(g)).cloned().collect();
    ordered.extend(goals.iter().filter(|g| deferred(g)).cloned());
    ordered
}

/// Ground a literal against a flattened binding map
fn project(literal: &Literal, binding: &IndexMap<String, Term>) -> Literal {
    let terms = literal
        .terms
        .iter()
        .map(|term| match term {
            Term::Variable(name) => binding.get(name).cloned().unwrap_or_else(|| term.clone()),
            Term::Symbol(_) => term.clone(),
        })
        .collect();
    Literal {
        predicate: literal.predicate.clone(),
        terms,
        negated: literal.negated,
    }
}

fn answer_from(binding: IndexMap<String, Term>) -> Answer {
    binding
        .into_iter()
        .map(|(name, term)| (name, term.printed().to_string()))
        .collect()
}
