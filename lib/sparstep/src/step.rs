//! A staged builder for single quad pattern `SELECT` queries.
//!
//! Each stage is its own type and only exposes the methods allowed at this point:
//! graphs (optional), then subjects, then predicates, then objects, then modifiers and [`FinalStep::build`].
//!
//! ```
//! use oxrdf::NamedNode;
//! use sparstep::QueryBuilder;
//!
//! let query = QueryBuilder::new()
//!     .graphs([NamedNode::new("http://example.com/g")?])
//!     .any_subject()
//!     .predicates([NamedNode::new("http://www.w3.org/2000/01/rdf-schema#label")?])
//!     .any_object()
//!     .langs(["en", ""])
//!     .limit(10)
//!     .build();
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT ?s ?p ?o ?g
//! WHERE {
//!   GRAPH ?g {
//!     VALUES ?g { <http://example.com/g> }
//!     VALUES ?p { <http://www.w3.org/2000/01/rdf-schema#label> }
//!     FILTER((((isIRI(?o) || isBLANK(?o)) || (LANG(?o) = \"en\")) || (LANG(?o) = \"\")))
//!     ?s ?p ?o .
//!   }
//! }
//! LIMIT 10"
//! );
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::algebra::{GraphPattern, TriplePattern, ValuesPattern, WherePattern};
use crate::error::ObjectTermError;
use crate::expression::{BuiltInCall, Expression, OperatorExpression};
use crate::query::{Query, SelectionVariables};
use oxrdf::{Literal, NamedNode, Term, Variable};

/// A value usable as a query object: an IRI or the description of a literal.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ObjectValue {
    Iri(String),
    Literal {
        value: String,
        /// A language tag, or a datatype IRI if it contains a colon.
        language_or_datatype: Option<String>,
    },
}

impl TryFrom<ObjectValue> for Term {
    type Error = ObjectTermError;

    fn try_from(value: ObjectValue) -> Result<Self, Self::Error> {
        match value {
            ObjectValue::Iri(iri) => Ok(NamedNode::new(iri).map_err(ObjectTermError::Iri)?.into()),
            ObjectValue::Literal {
                value,
                language_or_datatype,
            } => object_term(value, language_or_datatype.as_deref()),
        }
    }
}

/// Builds a literal from its lexical value and an optional language tag or datatype IRI.
///
/// A `language_or_datatype` containing a colon is a datatype IRI, anything else is a language tag.
/// Language tags never contain colons so the two cases do not overlap for valid inputs.
///
/// ```
/// use oxrdf::vocab::xsd;
/// use oxrdf::{Literal, Term};
/// use sparstep::object_term;
///
/// assert_eq!(
///     object_term("1", Some(xsd::INTEGER.as_str()))?,
///     Term::from(Literal::new_typed_literal("1", xsd::INTEGER))
/// );
/// assert_eq!(
///     object_term("chat", Some("fr"))?,
///     Term::from(Literal::new_language_tagged_literal("chat", "fr")?)
/// );
/// assert_eq!(
///     object_term("chat", None)?,
///     Term::from(Literal::new_simple_literal("chat"))
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn object_term(
    value: impl Into<String>,
    language_or_datatype: Option<&str>,
) -> Result<Term, ObjectTermError> {
    Ok(match language_or_datatype {
        None | Some("") => Literal::new_simple_literal(value).into(),
        Some(datatype) if datatype.contains(':') => Literal::new_typed_literal(
            value,
            NamedNode::new(datatype).map_err(ObjectTermError::Datatype)?,
        )
        .into(),
        Some(language) => Literal::new_language_tagged_literal(value, language)?.into(),
    })
}

#[derive(Debug, Clone)]
struct BuildState {
    subject: Variable,
    predicate: Variable,
    object: Variable,
    graph: Variable,
    graph_scope: bool,
    patterns: Vec<GraphPattern>,
    distinct: bool,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl BuildState {
    fn restrict(&mut self, variable: Variable, allowed: Vec<Term>) {
        if !allowed.is_empty() {
            self.patterns
                .push(ValuesPattern { variable, allowed }.into());
        }
    }
}

/// The entry point of the builder.
///
/// The default variable names are `?s`, `?p`, `?o` and `?g`.
#[derive(Debug, Clone)]
#[must_use]
pub struct QueryBuilder {
    state: BuildState,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            state: BuildState {
                subject: Variable::new_unchecked("s"),
                predicate: Variable::new_unchecked("p"),
                object: Variable::new_unchecked("o"),
                graph: Variable::new_unchecked("g"),
                graph_scope: false,
                patterns: Vec::new(),
                distinct: false,
                limit: None,
                offset: None,
            },
        }
    }
}

impl QueryBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the variables bound to the subject, predicate, object and graph name of the matched quads.
    pub fn with_variables(
        mut self,
        subject: Variable,
        predicate: Variable,
        object: Variable,
        graph: Variable,
    ) -> Self {
        self.state.subject = subject;
        self.state.predicate = predicate;
        self.state.object = object;
        self.state.graph = graph;
        self
    }

    /// Scopes the query to named graphs, restricted to `iris` if it is not empty.
    pub fn graphs(mut self, iris: impl IntoIterator<Item = NamedNode>) -> SubjectStep {
        self.state.graph_scope = true;
        let graph = self.state.graph.clone();
        self.state
            .restrict(graph, iris.into_iter().map(Into::into).collect());
        SubjectStep { state: self.state }
    }

    /// Scopes the query to any named graph.
    #[inline]
    pub fn any_graph(self) -> SubjectStep {
        self.graphs([])
    }

    /// Skips the graph step and restricts the subjects to `iris` if it is not empty.
    #[inline]
    pub fn subjects(self, iris: impl IntoIterator<Item = NamedNode>) -> PredicateStep {
        SubjectStep { state: self.state }.subjects(iris)
    }

    /// Skips the graph step and leaves the subject unconstrained.
    #[inline]
    pub fn any_subject(self) -> PredicateStep {
        self.subjects([])
    }
}

/// The subject stage.
#[derive(Debug, Clone)]
#[must_use]
pub struct SubjectStep {
    state: BuildState,
}

impl SubjectStep {
    /// Restricts the subjects to `iris` if it is not empty.
    pub fn subjects(mut self, iris: impl IntoIterator<Item = NamedNode>) -> PredicateStep {
        let subject = self.state.subject.clone();
        self.state
            .restrict(subject, iris.into_iter().map(Into::into).collect());
        PredicateStep { state: self.state }
    }

    #[inline]
    pub fn any_subject(self) -> PredicateStep {
        self.subjects([])
    }
}

/// The predicate stage.
#[derive(Debug, Clone)]
#[must_use]
pub struct PredicateStep {
    state: BuildState,
}

impl PredicateStep {
    /// Restricts the predicates to `iris` if it is not empty.
    pub fn predicates(mut self, iris: impl IntoIterator<Item = NamedNode>) -> ObjectStep {
        let predicate = self.state.predicate.clone();
        self.state
            .restrict(predicate, iris.into_iter().map(Into::into).collect());
        ObjectStep { state: self.state }
    }

    #[inline]
    pub fn any_predicate(self) -> ObjectStep {
        self.predicates([])
    }
}

/// The object stage.
#[derive(Debug, Clone)]
#[must_use]
pub struct ObjectStep {
    state: BuildState,
}

impl ObjectStep {
    /// Restricts the objects to `terms` if it is not empty.
    pub fn objects(mut self, terms: impl IntoIterator<Item = Term>) -> FinalStep {
        let object = self.state.object.clone();
        self.state.restrict(object, terms.into_iter().collect());
        FinalStep { state: self.state }
    }

    /// Restricts the objects to `values` if it is not empty, converting them with [`object_term`].
    pub fn object_values(
        self,
        values: impl IntoIterator<Item = ObjectValue>,
    ) -> Result<FinalStep, ObjectTermError> {
        let terms = values
            .into_iter()
            .map(Term::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.objects(terms))
    }

    #[inline]
    pub fn any_object(self) -> FinalStep {
        self.objects([])
    }
}

/// The last stage: modifiers in any order, then [`build`](Self::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct FinalStep {
    state: BuildState,
}

impl FinalStep {
    /// Keeps only the quads whose object is an IRI, a blank node or a literal with one of the given languages.
    ///
    /// The empty string stands for literals without language tag.
    /// Nothing is added if `languages` is empty.
    pub fn langs(mut self, languages: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let object = &self.state.object;
        let mut languages = languages.into_iter().peekable();
        if languages.peek().is_none() {
            return self;
        }
        let mut expression = Expression::or(
            BuiltInCall::is_iri(object.clone()),
            BuiltInCall::is_blank(object.clone()),
        );
        for language in languages {
            expression = Expression::or(
                expression,
                OperatorExpression::lang_equals(object.clone(), language.as_ref()),
            );
        }
        self.state.patterns.push(GraphPattern::Filter { expression });
        self
    }

    #[inline]
    pub fn limit(mut self, limit: usize) -> Self {
        self.state.limit = Some(limit);
        self
    }

    #[inline]
    pub fn offset(mut self, offset: usize) -> Self {
        self.state.offset = Some(offset);
        self
    }

    #[inline]
    pub fn distinct(mut self) -> Self {
        self.state.distinct = true;
        self
    }

    /// Assembles the query.
    ///
    /// The triple pattern comes after all `VALUES` and `FILTER` nodes,
    /// and everything is wrapped in a `GRAPH` scope if one was requested.
    #[must_use]
    pub fn build(self) -> Query {
        let BuildState {
            subject,
            predicate,
            object,
            graph,
            graph_scope,
            mut patterns,
            distinct,
            limit,
            offset,
        } = self.state;
        patterns.push(
            TriplePattern::new(subject.clone(), predicate.clone(), object.clone()).into(),
        );
        let mut variables = vec![subject, predicate, object];
        if graph_scope {
            patterns = vec![GraphPattern::Graph {
                name: graph.clone().into(),
                children: patterns,
            }];
            variables.push(graph);
        }
        Query::Select {
            variables: SelectionVariables::Explicit(variables),
            distinct,
            pattern: WherePattern::new(patterns),
            limit,
            offset,
        }
    }
}
