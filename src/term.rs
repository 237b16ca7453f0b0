//! Terms, literals and rules
//!
//! A [`Term`] is either a variable or a symbol (constant). Classification
//! happens at construction time: a token whose first character is an ASCII
//! upper-case letter is a variable, anything else is a symbol. String
//! constants that were quoted in the surface syntax are stored with a leading
//! `"` marker so that `foo` and `"foo"` stay distinct; the marker survives
//! unification and substitution and is stripped only when printing.

use std::fmt;

use indexmap::IndexSet;

use crate::bindings::Bindings;
use crate::error::{DatalogError, Result};

/// Represents a Datalog term
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Term {
    /// A variable that can be unified with symbols (e.g., `X`, `Who`)
    Variable(String),
    /// A concrete symbol/constant (e.g., `alice`, `"hello world"`, `42`)
    Symbol(String),
}

impl Term {
    /// Classify a token: variables start with an ASCII upper-case letter.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            Term::Variable(text.to_string())
        } else {
            Term::Symbol(text.to_string())
        }
    }

    /// Create a variable term without classification
    #[must_use]
    pub fn variable(name: &str) -> Self {
        Term::Variable(name.to_string())
    }

    /// Create a symbol term without classification
    #[must_use]
    pub fn symbol(text: &str) -> Self {
        Term::Symbol(text.to_string())
    }

    /// Create a quoted string symbol, carrying the internal `"` marker
    #[must_use]
    pub fn quoted(text: &str) -> Self {
        Term::Symbol(format!("\"{text}"))
    }

    /// Check if this term is a variable
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// The raw text of the term, quote marker included
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Term::Variable(name) | Term::Symbol(name) => name,
        }
    }

    /// The printable form: the quote marker is stripped
    #[must_use]
    pub fn printed(&self) -> &str {
        let text = self.text();
        text.strip_prefix('"').unwrap_or(text)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{name}"),
            Term::Symbol(text) => match text.strip_prefix('"') {
                Some(inner) => write!(f, "\"{inner}\""),
                None => write!(f, "{text}"),
            },
        }
    }
}

/// The canonical built-in predicates. `!=` is normalized to `<>` at
/// construction and never appears in a stored literal.
const BUILTINS: [&str; 6] = ["=", "<>", "<", "<=", ">", ">="];

/// A literal: a predicate applied to terms, possibly negated.
///
/// Facts, rule heads, rule body entries and query goals are all literals.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Literal {
    /// The name of the predicate (e.g., `parent`, `<>`)
    pub predicate: String,
    /// The arguments of the predicate
    pub terms: Vec<Term>,
    /// Negation-as-failure flag
    pub negated: bool,
}

impl Literal {
    /// Build a positive literal, classifying each argument from its text.
    #[must_use]
    pub fn new<P, T, S>(predicate: P, terms: T) -> Self
    where
        P: Into<String>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Literal::from_terms(
            predicate,
            terms.into_iter().map(|t| Term::from_text(t.as_ref())).collect(),
            false,
        )
    }

    /// Build a negated literal, classifying each argument from its text.
    #[must_use]
    pub fn negated<P, T, S>(predicate: P, terms: T) -> Self
    where
        P: Into<String>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Literal::from_terms(
            predicate,
            terms.into_iter().map(|t| Term::from_text(t.as_ref())).collect(),
            true,
        )
    }

    /// Build a literal from already-constructed terms.
    #[must_use]
    pub fn from_terms<P: Into<String>>(predicate: P, terms: Vec<Term>, negated: bool) -> Self {
        let mut predicate = predicate.into();
        if predicate == "!=" {
            predicate = "<>".to_string();
        }
        Literal {
            predicate,
            terms,
            negated,
        }
    }

    /// Number of arguments
    #[must_use]
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Check if the literal contains no variables
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| !t.is_variable())
    }

    /// A literal is built-in when its predicate starts with a character that
    /// is neither alphanumeric nor a quote.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.predicate
            .chars()
            .next()
            .is_some_and(|c| !c.is_alphanumeric() && c != '"')
    }

    /// All variable names appearing in the literal, left to right.
    #[must_use]
    pub fn variables(&self) -> IndexSet<&str> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                Term::Variable(name) => Some(name.as_str()),
                Term::Symbol(_) => None,
            })
            .collect()
    }

    /// Replace each bound variable with its binding; unbound variables and
    /// symbols are kept as-is. The negation flag is preserved.
    #[must_use]
    pub fn substitute(&self, bindings: &Bindings<'_>) -> Literal {
        let terms = self
            .terms
            .iter()
            .map(|term| match term {
                Term::Variable(name) => bindings.get(name).cloned().unwrap_or_else(|| term.clone()),
                Term::Symbol(_) => term.clone(),
            })
            .collect();
        Literal {
            predicate: self.predicate.clone(),
            terms,
            negated: self.negated,
        }
    }

    /// Evaluate a built-in literal under the given scope.
    ///
    /// `=` may bind one unbound variable; every other built-in requires both
    /// operands bound. Comparison operands that do not parse as numbers are
    /// coerced to `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if called on a literal that is not built-in.
    pub fn eval_builtin(&self, scope: &mut Bindings<'_>) -> Result<bool> {
        assert!(self.is_builtin(), "eval_builtin on non-built-in literal: {self}");
        if self.terms.len() != 2 {
            return Err(DatalogError::Validation(format!(
                "built-in '{}' expects exactly 2 operands, got {}",
                self.predicate,
                self.terms.len()
            )));
        }
        if !BUILTINS.contains(&self.predicate.as_str()) {
            return Err(DatalogError::Validation(format!(
                "unknown built-in predicate '{}'",
                self.predicate
            )));
        }

        let left = resolve(&self.terms[0], scope);
        let right = resolve(&self.terms[1], scope);

        match self.predicate.as_str() {
            "=" => match (left, right) {
                (Term::Variable(l), Term::Variable(r)) => Err(DatalogError::UnboundBuiltin(
                    format!("both sides of {l} = {r} are unbound"),
                )),
                (Term::Variable(name), value) | (value, Term::Variable(name)) => {
                    scope.bind(name, value);
                    Ok(true)
                }
                (Term::Symbol(l), Term::Symbol(r)) => {
                    Ok(match (parse_number(&l), parse_number(&r)) {
                        (Some(a), Some(b)) => a == b,
                        _ => l == r,
                    })
                }
            },
            "<>" => match (left, right) {
                (Term::Variable(name), _) | (_, Term::Variable(name)) => {
                    Err(DatalogError::UnboundBuiltin(format!(
                        "{name} must be bound for {}",
                        self.predicate
                    )))
                }
                (Term::Symbol(l), Term::Symbol(r)) => {
                    Ok(match (parse_number(&l), parse_number(&r)) {
                        (Some(a), Some(b)) => a != b,
                        _ => l != r,
                    })
                }
            },
            op => {
                for side in [&left, &right] {
                    if let Term::Variable(name) = side {
                        return Err(DatalogError::UnboundBuiltin(format!(
                            "{name} must be bound for {op}"
                        )));
                    }
                }
                let a = parse_number(left.text()).unwrap_or(0.0);
                let b = parse_number(right.text()).unwrap_or(0.0);
                Ok(match op {
                    "<" => a < b,
                    "<=" => a <= b,
                    ">" => a > b,
                    ">=" => a >= b,
                    _ => unreachable!("checked against BUILTINS above"),
                })
            }
        }
    }

    /// Checks the fact invariants: ground, not negated, not built-in.
    pub(crate) fn validate_as_fact(&self) -> Result<()> {
        if self.negated {
            return Err(DatalogError::Validation(format!(
                "facts cannot be negated: {self}"
            )));
        }
        if self.is_builtin() {
            return Err(DatalogError::Validation(format!(
                "built-in predicates cannot be asserted as facts: {self}"
            )));
        }
        if !self.is_ground() {
            return Err(DatalogError::Validation(format!(
                "facts must be ground: {self}"
            )));
        }
        Ok(())
    }
}

/// Look a variable up in the scope; symbols and unbound variables pass through.
fn resolve(term: &Term, scope: &Bindings<'_>) -> Term {
    match term {
        Term::Variable(name) => scope.get(name).cloned().unwrap_or_else(|| term.clone()),
        Term::Symbol(_) => term.clone(),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not ")?;
        }
        if self.is_builtin() && self.terms.len() == 2 {
            return write!(f, "{} {} {}", self.terms[0], self.predicate, self.terms[1]);
        }
        write!(f, "{}", self.predicate)?;
        if !self.terms.is_empty() {
            write!(f, "(")?;
            for (i, term) in self.terms.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{term}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A Datalog rule: `head :- body`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Rule {
    /// The conclusion of the rule
    pub head: Literal,
    /// The conditions that must be satisfied, in order
    pub body: Vec<Literal>,
}

impl Rule {
    /// Create a new rule
    #[must_use]
    pub fn new(head: Literal, body: Vec<Literal>) -> Self {
        Rule { head, body }
    }

    /// Checks that the rule is range-restricted: every variable in the head,
    /// in a negated body literal, or in a built-in body literal must appear
    /// in at least one positive non-built-in body literal. Also rejects
    /// built-in or negated heads and empty bodies.
    pub fn validate(&self) -> Result<()> {
        if self.head.negated {
            return Err(DatalogError::Validation(format!(
                "rule head cannot be negated: {self}"
            )));
        }
        if self.head.is_builtin() {
            return Err(DatalogError::Validation(format!(
                "rule head cannot be a built-in: {self}"
            )));
        }
        if self.body.is_empty() {
            return Err(DatalogError::Validation(format!(
                "rule body cannot be empty: {self}"
            )));
        }

        let positive: IndexSet<&str> = self
            .body
            .iter()
            .filter(|lit| !lit.negated && !lit.is_builtin())
            .flat_map(|lit| lit.variables())
            .collect();

        for name in self.head.variables() {
            if !positive.contains(name) {
                return Err(DatalogError::Validation(format!(
                    "variable {name} of the head does not appear in any positive body literal: {self}"
                )));
            }
        }
        for lit in &self.body {
            if !lit.negated && !lit.is_builtin() {
                continue;
            }
            for name in lit.variables() {
                if !positive.contains(name) {
                    return Err(DatalogError::Validation(format!(
                        "variable {name} of '{lit}' does not appear in any positive body literal: {self}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- ", self.head)?;
        for (i, lit) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lit}")?;
        }
        Ok(())
    }
}

/// Parse the number syntax: optional sign, digits, optional fractional part,
/// optional decimal exponent. Stricter than `str::parse::<f64>` (no `inf`,
/// `nan`, leading dots or hex).
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let mut chars = text.chars().peekable();
    if matches!(chars.peek(), Some('+' | '-')) {
        chars.next();
    }
    let mut digits = 0;
    while chars.peek().is_some_and(char::is_ascii_digit) {
        chars.next();
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        while chars.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
        }
    }
    if matches!(chars.peek(), Some('e' | 'E')) {
        chars.next();
        if matches!(chars.peek(), Some('+' | '-')) {
            chars.next();
        }
        let mut exponent = 0;
        while chars.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
            exponent += 1;
        }
        if exponent == 0 {
            return None;
        }
    }
    if chars.next().is_some() {
        return None;
    }
    text.parse().ok()
}

/// Print a number the way the surface syntax does: integer doubles have no
/// fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
