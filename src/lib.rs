//! # Stratalog
//!
//! A small in-memory deductive database: a safe, stratified,
//! negation-capable dialect of Datalog with equality and comparison
//! built-ins.
//!
//! Facts form the extensional database, rules the intensional one. Queries
//! and deletions run bottom-up with semi-naive evaluation over the relevant
//! slice of the database.
//!
//! ## Example
//!
//! ```rust
//! use stratalog::Database;
//!
//! let mut db = Database::new();
//!
//! let answers = db.execute_all(
//!     "parent(alice, bob).
//!      parent(bob, carol).
//!      ancestor(X, Y) :- parent(X, Y).
//!      ancestor(X, Z) :- parent(X, Y), ancestor(Y, Z).
//!      ancestor(alice, Who)?",
//! ).unwrap();
//!
//! let found: Vec<&str> = answers.iter().map(|a| a["Who"].as_str()).collect();
//! assert!(found.contains(&"bob"));
//! assert!(found.contains(&"carol"));
//! ```
//!
//! Statements end in `.` (facts and rules), `?` (queries) or `~`
//! (deletions). Terms starting with an upper-case letter are variables;
//! everything else is a constant. Rule bodies may use negation (`not`) and
//! the built-in comparisons `=`, `<>`, `<`, `<=`, `>`, `>=` as long as the
//! rule stays range-restricted and the program stratifiable.

/// Scoped variable bindings.
pub mod bindings;
/// The database, matcher and semi-naive expander.
pub mod engine;
/// Error types.
pub mod error;
/// Surface-syntax parser.
pub mod parser;
/// Parsed statements.
pub mod statement;
/// Fact storage.
pub mod storage;
/// Terms, literals and rules.
pub mod term;

mod stratify;

pub use bindings::Bindings;
pub use engine::{Answer, Database};
pub use error::{DatalogError, Result};
pub use parser::{parse_program, parse_statement};
pub use statement::Statement;
pub use storage::{EdbProvider, IndexedFactStore};
pub use term::{Literal, Rule, Term};
