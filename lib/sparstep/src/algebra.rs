//! Graph patterns composing a [`WHERE`](https://www.w3.org/TR/sparql11-query/#GraphPattern) clause.

use crate::error::QueryEvaluationError;
use crate::expression::Expression;
use crate::term::*;
use std::fmt;

/// A [triple pattern](https://www.w3.org/TR/sparql11-query/#defn_TriplePattern).
///
/// ```
/// use oxrdf::{NamedNode, Variable};
/// use sparstep::algebra::TriplePattern;
///
/// let pattern = TriplePattern {
///     subject: Variable::new("s")?.into(),
///     predicate: NamedNode::new("http://example.com/p")?.into(),
///     object: Variable::new("o")?.into(),
/// };
/// assert_eq!(pattern.to_string(), "?s <http://example.com/p> ?o .");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct TriplePattern {
    pub subject: TermPattern,
    pub predicate: NamedNodePattern,
    pub object: TermPattern,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<TermPattern>,
        predicate: impl Into<NamedNodePattern>,
        object: impl Into<TermPattern>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for TriplePattern {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// An inline [`VALUES`](https://www.w3.org/TR/sparql11-query/#inline-data) block restricting a single variable.
///
/// Membership is tested on the lexical value of the terms only:
/// an IRI and a literal with the IRI string as lexical form are interchangeable.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ValuesPattern {
    pub variable: Variable,
    pub allowed: Vec<Term>,
}

impl ValuesPattern {
    pub fn new(variable: Variable, allowed: impl IntoIterator<Item = impl Into<Term>>) -> Self {
        Self {
            variable,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks if the value of `term` is one of the allowed values.
    pub fn contains(&self, term: &Term) -> bool {
        let value = term_value(term);
        self.allowed.iter().any(|t| term_value(t) == value)
    }

    /// Checks if the variable binding in `substitution` is one of the allowed values.
    pub fn evaluate(&self, substitution: &Substitution) -> Result<bool, QueryEvaluationError> {
        let term = substitution
            .get(&self.variable)
            .ok_or_else(|| QueryEvaluationError::MissingBinding(self.variable.clone()))?;
        Ok(self.contains(term))
    }
}

impl fmt::Display for ValuesPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VALUES {} {{", self.variable)?;
        for term in &self.allowed {
            write!(f, " {term}")?;
        }
        f.write_str(" }")
    }
}

/// A node of a `WHERE` clause tree.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphPattern {
    /// A [triple pattern](https://www.w3.org/TR/sparql11-query/#defn_TriplePattern).
    Triple(TriplePattern),
    /// A [filter](https://www.w3.org/TR/sparql11-query/#expressions) on the bindings of the enclosing group.
    Filter { expression: Expression },
    /// [Inline data](https://www.w3.org/TR/sparql11-query/#inline-data) for a single variable.
    Values(ValuesPattern),
    /// Evaluation of the children inside a [named graph](https://www.w3.org/TR/sparql11-query/#queryDataset).
    Graph {
        name: NamedNodePattern,
        children: Vec<Self>,
    },
    /// [Union](https://www.w3.org/TR/sparql11-query/#alternatives) of two groups.
    Union { left: Vec<Self>, right: Vec<Self> },
    /// An [optional](https://www.w3.org/TR/sparql11-query/#optionals) group.
    Optional { children: Vec<Self> },
    /// [Assignment](https://www.w3.org/TR/sparql11-query/#bind) of an expression to a variable.
    Bind {
        expression: Expression,
        variable: Variable,
    },
}

impl GraphPattern {
    /// The pattern kind, as written in SPARQL.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Triple(_) => "Triple",
            Self::Filter { .. } => "FILTER",
            Self::Values(_) => "VALUES",
            Self::Graph { .. } => "GRAPH",
            Self::Union { .. } => "UNION",
            Self::Optional { .. } => "OPTIONAL",
            Self::Bind { .. } => "BIND",
        }
    }

    /// Formats using SPARQL syntax, one node per line, nested groups being indented by `indent` levels.
    pub(crate) fn fmt_sparql(&self, f: &mut impl fmt::Write, indent: usize) -> fmt::Result {
        write_indent(f, indent)?;
        match self {
            Self::Triple(pattern) => writeln!(f, "{pattern}"),
            Self::Filter { expression } => writeln!(f, "FILTER({expression})"),
            Self::Values(values) => writeln!(f, "{values}"),
            Self::Graph { name, children } => {
                writeln!(f, "GRAPH {name} {{")?;
                fmt_sparql_group_content(f, children, indent + 1)?;
                write_indent(f, indent)?;
                writeln!(f, "}}")
            }
            Self::Union { left, right } => {
                writeln!(f, "{{")?;
                fmt_sparql_group_content(f, left, indent + 1)?;
                write_indent(f, indent)?;
                writeln!(f, "}} UNION {{")?;
                fmt_sparql_group_content(f, right, indent + 1)?;
                write_indent(f, indent)?;
                writeln!(f, "}}")
            }
            Self::Optional { children } => {
                writeln!(f, "OPTIONAL {{")?;
                fmt_sparql_group_content(f, children, indent + 1)?;
                write_indent(f, indent)?;
                writeln!(f, "}}")
            }
            Self::Bind {
                expression,
                variable,
            } => writeln!(f, "BIND({expression} AS {variable})"),
        }
    }

    /// Calls `callback` on each variable the pattern may bind.
    pub fn on_in_scope_variable<'a>(&'a self, mut callback: impl FnMut(&'a Variable)) {
        self.lookup_in_scope_variables(&mut callback)
    }

    fn lookup_in_scope_variables<'a>(&'a self, callback: &mut impl FnMut(&'a Variable)) {
        match self {
            Self::Triple(pattern) => {
                if let Some(s) = pattern.subject.as_variable() {
                    callback(s);
                }
                if let Some(p) = pattern.predicate.as_variable() {
                    callback(p);
                }
                if let Some(o) = pattern.object.as_variable() {
                    callback(o);
                }
            }
            Self::Filter { .. } => (),
            Self::Values(values) => callback(&values.variable),
            Self::Graph { name, children } => {
                if let Some(g) = name.as_variable() {
                    callback(g);
                }
                for child in children {
                    child.lookup_in_scope_variables(callback);
                }
            }
            Self::Union { left, right } => {
                for child in left.iter().chain(right) {
                    child.lookup_in_scope_variables(callback);
                }
            }
            Self::Optional { children } => {
                for child in children {
                    child.lookup_in_scope_variables(callback);
                }
            }
            Self::Bind { variable, .. } => callback(variable),
        }
    }
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_sparql(f, 0)
    }
}

impl From<TriplePattern> for GraphPattern {
    #[inline]
    fn from(pattern: TriplePattern) -> Self {
        Self::Triple(pattern)
    }
}

impl From<ValuesPattern> for GraphPattern {
    #[inline]
    fn from(values: ValuesPattern) -> Self {
        Self::Values(values)
    }
}

/// The root of a `WHERE` clause.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct WherePattern {
    pub children: Vec<GraphPattern>,
}

impl WherePattern {
    #[inline]
    pub fn new(children: Vec<GraphPattern>) -> Self {
        Self { children }
    }

    pub(crate) fn fmt_sparql(&self, f: &mut impl fmt::Write) -> fmt::Result {
        writeln!(f, "WHERE {{")?;
        fmt_sparql_group_content(f, &self.children, 1)?;
        f.write_str("}")
    }

    /// Calls `callback` on each variable the clause may bind, in order of first appearance, without duplicates.
    pub fn on_in_scope_variable<'a>(&'a self, mut callback: impl FnMut(&'a Variable)) {
        let mut seen = Vec::new();
        for child in &self.children {
            child.on_in_scope_variable(|v| {
                if !seen.contains(&v) {
                    seen.push(v);
                    callback(v);
                }
            });
        }
    }
}

impl fmt::Display for WherePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_sparql(f)
    }
}

fn fmt_sparql_group_content(
    f: &mut impl fmt::Write,
    children: &[GraphPattern],
    indent: usize,
) -> fmt::Result {
    for child in children {
        child.fmt_sparql(f, indent)?;
    }
    Ok(())
}

fn write_indent(f: &mut impl fmt::Write, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    Ok(())
}
