use crate::algebra::WherePattern;
use oxrdf::Variable;
use std::fmt;

/// The variables projected by a `SELECT` query.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum SelectionVariables {
    /// `SELECT *`
    Wildcard,
    /// An explicit, ordered, variable list.
    Explicit(Vec<Variable>),
}

impl fmt::Display for SelectionVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("*"),
            Self::Explicit(variables) => {
                for (i, v) in variables.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    v.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

/// A [SPARQL query](https://www.w3.org/TR/sparql11-query/).
///
/// The default string formatter is returning the SPARQL text of the query,
/// the header, the `WHERE` clause, `LIMIT` and `OFFSET` each starting on a new line.
///
/// ```
/// use oxrdf::{NamedNode, Variable};
/// use sparstep::algebra::{GraphPattern, TriplePattern, WherePattern};
/// use sparstep::{Query, SelectionVariables};
///
/// let query = Query::Select {
///     variables: SelectionVariables::Explicit(vec![Variable::new("s")?]),
///     distinct: true,
///     pattern: WherePattern::new(vec![GraphPattern::Triple(TriplePattern::new(
///         Variable::new("s")?,
///         NamedNode::new("http://example.com/p")?,
///         Variable::new("o")?,
///     ))]),
///     limit: Some(10),
///     offset: None,
/// };
/// assert_eq!(
///     query.to_string(),
///     "SELECT DISTINCT ?s\nWHERE {\n  ?s <http://example.com/p> ?o .\n}\nLIMIT 10"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Query {
    /// [SELECT](https://www.w3.org/TR/sparql11-query/#select).
    Select {
        /// The projected variables.
        variables: SelectionVariables,
        /// If duplicate solutions should be removed.
        distinct: bool,
        /// The `WHERE` clause.
        pattern: WherePattern,
        /// The maximal number of returned solutions.
        limit: Option<usize>,
        /// The number of solutions to skip.
        offset: Option<usize>,
    },
}

impl Query {
    #[inline]
    pub fn pattern(&self) -> &WherePattern {
        match self {
            Self::Select { pattern, .. } => pattern,
        }
    }

    #[inline]
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Select { limit, .. } => *limit,
        }
    }

    #[inline]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Select { offset, .. } => *offset,
        }
    }

    #[inline]
    pub fn is_distinct(&self) -> bool {
        match self {
            Self::Select { distinct, .. } => *distinct,
        }
    }

    /// The projected variables, `SELECT *` being resolved to the variables bound by the `WHERE` clause.
    pub fn projection(&self) -> Vec<Variable> {
        match self {
            Self::Select {
                variables: SelectionVariables::Explicit(variables),
                ..
            } => variables.clone(),
            Self::Select {
                variables: SelectionVariables::Wildcard,
                pattern,
                ..
            } => {
                let mut variables = Vec::new();
                pattern.on_in_scope_variable(|v| variables.push(v.clone()));
                variables
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select {
                variables,
                distinct,
                pattern,
                limit,
                offset,
            } => {
                f.write_str("SELECT ")?;
                if *distinct {
                    f.write_str("DISTINCT ")?;
                }
                writeln!(f, "{variables}")?;
                pattern.fmt_sparql(f)?;
                if let Some(limit) = limit {
                    write!(f, "\nLIMIT {limit}")?;
                }
                if let Some(offset) = offset {
                    write!(f, "\nOFFSET {offset}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{GraphPattern, TriplePattern};

    fn triple_query(variables: SelectionVariables) -> Query {
        Query::Select {
            variables,
            distinct: false,
            pattern: WherePattern::new(vec![GraphPattern::Triple(TriplePattern::new(
                Variable::new_unchecked("s"),
                Variable::new_unchecked("p"),
                Variable::new_unchecked("o"),
            ))]),
            limit: None,
            offset: Some(5),
        }
    }

    #[test]
    fn wildcard_display() {
        assert_eq!(
            triple_query(SelectionVariables::Wildcard).to_string(),
            "SELECT *\nWHERE {\n  ?s ?p ?o .\n}\nOFFSET 5"
        );
    }

    #[test]
    fn wildcard_projection() {
        assert_eq!(
            triple_query(SelectionVariables::Wildcard).projection(),
            [
                Variable::new_unchecked("s"),
                Variable::new_unchecked("p"),
                Variable::new_unchecked("o")
            ]
        );
        assert_eq!(
            triple_query(SelectionVariables::Explicit(vec![Variable::new_unchecked(
                "o"
            )]))
            .projection(),
            [Variable::new_unchecked("o")]
        );
    }
}
