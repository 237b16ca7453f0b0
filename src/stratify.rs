//! Stratification of the rule set
//!
//! Negation-as-failure is only well-defined when no predicate depends
//! negatively on itself. The stratifier assigns each predicate a stratum
//! number by walking the rule graph depth-first: a predicate sits one layer
//! above every predicate it depends on through negation, and on the same
//! layer as its positive dependencies. Programs where a cycle crosses a
//! negated edge are rejected.

use indexmap::IndexMap;
use log::debug;

use crate::error::{DatalogError, Result};
use crate::term::Rule;

/// Partition the rules into an ordered list of strata. Lower strata must be
/// fully evaluated before higher ones. The full rule set is appended as a
/// final sentinel stratum so that rules unreachable through the dependency
/// walk are still evaluated at least once.
pub(crate) fn stratify(rules: &[Rule]) -> Result<Vec<Vec<Rule>>> {
    let mut memo: IndexMap<String, usize> = IndexMap::new();
    let mut strata: Vec<Vec<Rule>> = Vec::new();

    for rule in rules {
        let mut path = Vec::new();
        let stratum = predicate_stratum(&rule.head.predicate, false, rules, &mut memo, &mut path)?;
        while stratum >= strata.len() {
            strata.push(Vec::new());
        }
        strata[stratum].push(rule.clone());
    }

    debug!(
        "stratified {} rules into {} strata",
        rules.len(),
        strata.len()
    );

    // Sentinel stratum: every rule, once more.
    strata.push(rules.to_vec());
    Ok(strata)
}

/// Depth-first stratum computation with memoization.
///
/// `entered_negated` is the polarity of the edge being followed into
/// `predicate`. The recursion path carries each predicate together with that
/// polarity so a cycle can be checked for negated edges when it closes.
fn predicate_stratum(
    predicate: &str,
    entered_negated: bool,
    rules: &[Rule],
    memo: &mut IndexMap<String, usize>,
    path: &mut Vec<(String, bool)>,
) -> Result<usize> {
    if let Some(&stratum) = memo.get(predicate) {
        return Ok(stratum);
    }
    if let Some(pos) = path.iter().position(|(name, _)| name == predicate) {
        let negative_cycle =
            entered_negated || path[pos + 1..].iter().any(|(_, negated)| *negated);
        if negative_cycle {
            let mut trail: Vec<&str> = path[pos..].iter().map(|(name, _)| name.as_str()).collect();
            trail.push(predicate);
            return Err(DatalogError::NegativeRecursion(trail.join(" -> ")));
        }
        // Positive recursion stays within the stratum.
        return Ok(0);
    }

    path.push((predicate.to_string(), entered_negated));
    let mut stratum = 0;
    for rule in rules.iter().filter(|r| r.head.predicate == predicate) {
        for literal in &rule.body {
            let below =
                predicate_stratum(&literal.predicate, literal.negated, rules, memo, path)?;
            stratum = stratum.max(below + usize::from(literal.negated));
        }
    }
    path.pop();

    memo.insert(predicate.to_string(), stratum);
    Ok(stratum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    fn rule(head: Literal, body: Vec<Literal>) -> Rule {
        Rule::new(head, body)
    }

    #[test]
    fn test_positive_program_is_single_stratum() {
        let rules = vec![
            rule(
                Literal::new("ancestor", ["X", "Y"]),
                vec![Literal::new("parent", ["X", "Y"])],
            ),
            rule(
                Literal::new("ancestor", ["X", "Z"]),
                vec![
                    Literal::new("parent", ["X", "Y"]),
                    Literal::new("ancestor", ["Y", "Z"]),
                ],
            ),
        ];
        let strata = stratify(&rules).unwrap();
        // One real stratum plus the sentinel
        assert_eq!(strata.len(), 2);
        assert_eq!(strata[0].len(), 2);
        assert_eq!(strata[1].len(), 2);
    }

    #[test]
    fn test_negation_pushes_dependents_up() {
        // reachable is stratum 0; unreachable depends negatively on it.
        let rules = vec![
            rule(
                Literal::new("reachable", ["X", "Y"]),
                vec![Literal::new("edge", ["X", "Y"])],
            ),
            rule(
                Literal::new("unreachable", ["X", "Y"]),
                vec![
                    Literal::new("node", ["X"]),
                    Literal::new("node", ["Y"]),
                    Literal::negated("reachable", ["X", "Y"]),
                ],
            ),
        ];
        let strata = stratify(&rules).unwrap();
        assert_eq!(strata.len(), 3);
        assert_eq!(strata[0][0].head.predicate, "reachable");
        assert_eq!(strata[1][0].head.predicate, "unreachable");
        // Sentinel holds everything
        assert_eq!(strata[2].len(), 2);
    }

    #[test]
    fn test_negative_recursion_rejected() {
        // p(X) :- not q(X), r(X).   q(X) :- not p(X), r(X).
        let rules = vec![
            rule(
                Literal::new("p", ["X"]),
                vec![
                    Literal::negated("q", ["X"]),
                    Literal::new("r", ["X"]),
                ],
            ),
            rule(
                Literal::new("q", ["X"]),
                vec![
                    Literal::negated("p", ["X"]),
                    Literal::new("r", ["X"]),
                ],
            ),
        ];
        let err = stratify(&rules).unwrap_err();
        match err {
            DatalogError::NegativeRecursion(trail) => {
                assert!(trail.contains("p"), "trail should name p: {trail}");
                assert!(trail.contains("q"), "trail should name q: {trail}");
            }
            other => panic!("expected negative recursion, got {other:?}"),
        }
    }

    #[test]
    fn test_self_negation_rejected() {
        let rules = vec![rule(
            Literal::new("p", ["X"]),
            vec![
                Literal::new("r", ["X"]),
                Literal::negated("p", ["X"]),
            ],
        )];
        assert!(matches!(
            stratify(&rules),
            Err(DatalogError::NegativeRecursion(_))
        ));
    }

    #[test]
    fn test_empty_rule_set() {
        let strata = stratify(&[]).unwrap();
        assert_eq!(strata.len(), 1);
        assert!(strata[0].is_empty());
    }
}
