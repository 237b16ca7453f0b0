//! Parsed statements
//!
//! The surface syntax produces a closed set of statement kinds; each one
//! knows how to run itself against a database. Prepared statements can be
//! executed repeatedly, optionally with initial bindings.

use std::fmt;

use crate::bindings::Bindings;
use crate::engine::{Answer, Database};
use crate::error::Result;
use crate::storage::EdbProvider;
use crate::term::{Literal, Rule};

/// A parsed statement, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assert a ground fact: `parent(a, b).`
    InsertFact(Literal),
    /// Add a rule: `ancestor(X, Y) :- parent(X, Y).`
    InsertRule(Rule),
    /// Run a conjunctive query: `ancestor(a, X)?`
    Query(Vec<Literal>),
    /// Remove matching facts: `parent(a, X) ~`
    Delete(Vec<Literal>),
}

impl Statement {
    /// Execute against a database. Insertions and deletions return no
    /// answers; queries return one answer map per solution.
    pub fn execute<P: EdbProvider>(
        &self,
        database: &mut Database<P>,
        bindings: Option<&Bindings<'_>>,
    ) -> Result<Vec<Answer>> {
        match self {
            Statement::InsertFact(fact) => {
                database.fact(fact.clone())?;
                Ok(Vec::new())
            }
            Statement::InsertRule(rule) => {
                database.rule(rule.clone())?;
                Ok(Vec::new())
            }
            Statement::Query(goals) => database.query_with_bindings(goals.clone(), bindings),
            Statement::Delete(goals) => {
                database.delete_with_bindings(goals.clone(), bindings)?;
                Ok(Vec::new())
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn goals(f: &mut fmt::Formatter<'_>, goals: &[Literal]) -> fmt::Result {
            for (i, goal) in goals.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{goal}")?;
            }
            Ok(())
        }
        match self {
            Statement::InsertFact(fact) => write!(f, "{fact}."),
            Statement::InsertRule(rule) => write!(f, "{rule}."),
            Statement::Query(g) => {
                goals(f, g)?;
                write!(f, "?")
            }
            Statement::Delete(g) => {
                goals(f, g)?;
                write!(f, " ~")
            }
        }
    }
}
