//! Evaluation of queries directly over an in-memory list of quads.

use crate::algebra::{GraphPattern, TriplePattern};
use crate::error::QueryEvaluationError;
use crate::query::Query;
use crate::term::{NamedNodePattern, Substitution, TermPattern};
use oxrdf::{GraphName, Quad, Term, Variable};
use rustc_hash::FxHashSet;
use sparesults::QuerySolution;
use std::sync::Arc;
use tracing::{debug, trace};

type Constraint<'a> = Box<dyn Fn(&Substitution) -> Result<bool, QueryEvaluationError> + 'a>;

/// The constraints of a query compiled to a predicate over quads.
///
/// The query tree is walked once: the triple pattern and the graph scope give the variables bound
/// to each quad component, `VALUES` and `FILTER` nodes become constraints on these bindings.
///
/// ```
/// use oxrdf::{GraphName, NamedNode, Quad};
/// use sparstep::{QuadsConstraints, QueryBuilder};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let query = QueryBuilder::new()
///     .subjects([ex.clone()])
///     .any_predicate()
///     .any_object()
///     .build();
/// let constraints = QuadsConstraints::new(&query)?;
/// assert!(constraints.matches(&Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph))?);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct QuadsConstraints<'a> {
    triple: &'a TriplePattern,
    graph: Option<&'a NamedNodePattern>,
    values: Vec<Constraint<'a>>,
    filters: Vec<Constraint<'a>>,
}

impl<'a> QuadsConstraints<'a> {
    pub fn new(query: &'a Query) -> Result<Self, QueryEvaluationError> {
        let mut triple = None;
        let mut graph = None;
        let mut values = Vec::<Constraint<'a>>::new();
        let mut filters = Vec::<Constraint<'a>>::new();
        // Explicit stack so that deeply nested trees do not grow the call stack
        let mut stack = query.pattern().children.iter().rev().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            match node {
                GraphPattern::Triple(pattern) => {
                    if triple.replace(pattern).is_some() {
                        return Err(QueryEvaluationError::MultipleTriplePatterns);
                    }
                }
                GraphPattern::Values(pattern) => {
                    values.push(Box::new(move |substitution| pattern.evaluate(substitution)))
                }
                GraphPattern::Filter { expression } => {
                    filters.push(Box::new(move |substitution| expression.evaluate(substitution)))
                }
                GraphPattern::Graph { name, children } => {
                    if graph.replace(name).is_some() {
                        return Err(QueryEvaluationError::MultipleGraphScopes);
                    }
                    stack.extend(children.iter().rev());
                }
                GraphPattern::Union { .. }
                | GraphPattern::Optional { .. }
                | GraphPattern::Bind { .. } => {
                    return Err(QueryEvaluationError::UnsupportedNode(node.kind()));
                }
            }
        }
        let triple = triple.ok_or(QueryEvaluationError::MissingTriplePattern)?;
        debug!(
            values = values.len(),
            filters = filters.len(),
            graph_scope = graph.is_some(),
            "compiled quad constraints"
        );
        Ok(Self {
            triple,
            graph,
            values,
            filters,
        })
    }

    /// Checks if the quad fulfills all the constraints.
    #[inline]
    pub fn matches(&self, quad: &Quad) -> Result<bool, QueryEvaluationError> {
        Ok(self.bindings(quad)?.is_some())
    }

    /// Returns the variable bindings of the quad if it fulfills all the constraints.
    pub fn bindings(&self, quad: &Quad) -> Result<Option<Substitution>, QueryEvaluationError> {
        let mut substitution = Substitution::new();
        if !bind(
            &mut substitution,
            &self.triple.subject,
            quad.subject.clone().into(),
        ) || !bind(
            &mut substitution,
            &TermPattern::from(self.triple.predicate.clone()),
            quad.predicate.clone().into(),
        ) || !bind(&mut substitution, &self.triple.object, quad.object.clone())
        {
            return Ok(None);
        }
        if let Some(name) = self.graph {
            let graph_name = match &quad.graph_name {
                GraphName::NamedNode(node) => Term::from(node.clone()),
                GraphName::BlankNode(node) => Term::from(node.clone()),
                GraphName::DefaultGraph => return Ok(None),
            };
            if !bind(&mut substitution, &TermPattern::from(name.clone()), graph_name) {
                return Ok(None);
            }
        }
        // All constraints are evaluated so that a malformed tree always fails, whatever the data
        let mut matches = true;
        for constraint in self.values.iter().chain(&self.filters) {
            matches &= constraint(&substitution)?;
        }
        Ok(matches.then_some(substitution))
    }
}

/// Binds `pattern` to `term`, returning `false` if the term is not compatible with the pattern
/// or with a previous binding of the same variable.
fn bind(substitution: &mut Substitution, pattern: &TermPattern, term: Term) -> bool {
    let TermPattern::Variable(variable) = pattern else {
        return pattern.accepts(&term);
    };
    if let Some(previous) = substitution.get(variable) {
        return *previous == term;
    }
    substitution.insert(variable.clone(), term);
    true
}

/// Evaluates queries over a list of quads.
///
/// The input list is never modified and the output keeps its order.
/// `LIMIT` and `OFFSET` are applied after filtering.
///
/// ```
/// use oxrdf::{GraphName, Literal, NamedNode, Quad};
/// use sparstep::{QueryBuilder, QueryProcessor};
///
/// let s = NamedNode::new("http://example.com/s")?;
/// let p = NamedNode::new("http://example.com/p")?;
/// let quads = (0..3)
///     .map(|i| Quad::new(s.clone(), p.clone(), Literal::from(i), GraphName::DefaultGraph))
///     .collect::<Vec<_>>();
/// let query = QueryBuilder::new()
///     .subjects([s])
///     .any_predicate()
///     .any_object()
///     .offset(1)
///     .limit(1)
///     .build();
/// assert_eq!(QueryProcessor::new().filter(&quads, &query)?, [quads[1].clone()]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryProcessor;

impl QueryProcessor {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the quads matching the query.
    ///
    /// If the query is `DISTINCT`, only the first quad of each solution is kept.
    pub fn filter<'b>(
        &self,
        statements: impl IntoIterator<Item = &'b Quad>,
        query: &Query,
    ) -> Result<Vec<Quad>, QueryEvaluationError> {
        let constraints = QuadsConstraints::new(query)?;
        let variables = query.projection();
        let mut seen = FxHashSet::default();
        let mut candidates = 0;
        let mut selected = Vec::new();
        for quad in statements {
            candidates += 1;
            let Some(substitution) = constraints.bindings(quad)? else {
                continue;
            };
            if query.is_distinct() && !seen.insert(project(&substitution, &variables)) {
                trace!(%quad, "duplicate solution skipped");
                continue;
            }
            trace!(%quad, "quad selected");
            selected.push(quad.clone());
        }
        let matched = selected.len();
        let selected = slice(selected, query);
        debug!(
            candidates,
            matched,
            returned = selected.len(),
            "filtered quads"
        );
        Ok(selected)
    }

    /// Returns the solutions of the query: the bindings of the projected variables for each matching quad.
    ///
    /// Duplicates are removed if the query is `DISTINCT`, before `LIMIT` and `OFFSET` are applied.
    pub fn solutions<'b>(
        &self,
        statements: impl IntoIterator<Item = &'b Quad>,
        query: &Query,
    ) -> Result<Vec<QuerySolution>, QueryEvaluationError> {
        let constraints = QuadsConstraints::new(query)?;
        let variables: Arc<[Variable]> = query.projection().into();
        let mut seen = FxHashSet::default();
        let mut solutions = Vec::new();
        for quad in statements {
            let Some(substitution) = constraints.bindings(quad)? else {
                continue;
            };
            let values = project(&substitution, &variables);
            if query.is_distinct() && !seen.insert(values.clone()) {
                continue;
            }
            solutions.push(QuerySolution::from((Arc::clone(&variables), values)));
        }
        let matched = solutions.len();
        let solutions = slice(solutions, query);
        debug!(matched, returned = solutions.len(), "computed solutions");
        Ok(solutions)
    }
}

fn project(substitution: &Substitution, variables: &[Variable]) -> Vec<Option<Term>> {
    variables
        .iter()
        .map(|v| substitution.get(v).cloned())
        .collect()
}

fn slice<T>(items: Vec<T>, query: &Query) -> Vec<T> {
    let items = items.into_iter().skip(query.offset().unwrap_or(0));
    if let Some(limit) = query.limit() {
        items.take(limit).collect()
    } else {
        items.collect()
    }
}
