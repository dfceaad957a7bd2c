//! Pattern terms and variable bindings built on top of [`oxrdf`] terms.

pub use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Term, Variable};
use rustc_hash::FxHashMap;
use std::fmt;

/// The union of [terms](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-term) and [variables](https://www.w3.org/TR/sparql11-query/#sparqlQueryVariables).
///
/// The default string formatter is returning a SPARQL compatible representation.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum TermPattern {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

impl TermPattern {
    /// The variable this pattern binds, if any.
    #[inline]
    pub fn as_variable(&self) -> Option<&Variable> {
        if let Self::Variable(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Checks if a ground term is accepted by this pattern when the pattern is not a variable.
    pub(crate) fn accepts(&self, term: &Term) -> bool {
        match (self, term) {
            (Self::Variable(_), _) => true,
            (Self::NamedNode(p), Term::NamedNode(t)) => p == t,
            (Self::BlankNode(p), Term::BlankNode(t)) => p == t,
            (Self::Literal(p), Term::Literal(t)) => p == t,
            _ => false,
        }
    }
}

impl fmt::Display for TermPattern {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(term) => term.fmt(f),
            Self::BlankNode(term) => term.fmt(f),
            Self::Literal(term) => term.fmt(f),
            Self::Variable(var) => var.fmt(f),
        }
    }
}

impl From<NamedNode> for TermPattern {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<BlankNode> for TermPattern {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Literal> for TermPattern {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Variable> for TermPattern {
    #[inline]
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

impl From<Term> for TermPattern {
    #[inline]
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => node.into(),
            Term::BlankNode(node) => node.into(),
            Term::Literal(literal) => literal.into(),
        }
    }
}

impl From<NamedNodePattern> for TermPattern {
    #[inline]
    fn from(pattern: NamedNodePattern) -> Self {
        match pattern {
            NamedNodePattern::NamedNode(node) => node.into(),
            NamedNodePattern::Variable(var) => var.into(),
        }
    }
}

/// The union of [IRIs](https://www.w3.org/TR/rdf11-concepts/#dfn-iri) and [variables](https://www.w3.org/TR/sparql11-query/#sparqlQueryVariables).
///
/// It is the name of a `GRAPH` scope.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum NamedNodePattern {
    NamedNode(NamedNode),
    Variable(Variable),
}

impl NamedNodePattern {
    #[inline]
    pub fn as_variable(&self) -> Option<&Variable> {
        if let Self::Variable(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl fmt::Display for NamedNodePattern {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::Variable(var) => var.fmt(f),
        }
    }
}

impl From<NamedNode> for NamedNodePattern {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<Variable> for NamedNodePattern {
    #[inline]
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

/// The lexical value of a term: the IRI, the blank node identifier or the literal lexical form.
#[inline]
pub fn term_value(term: &Term) -> &str {
    match term {
        Term::NamedNode(node) => node.as_str(),
        Term::BlankNode(node) => node.as_str(),
        Term::Literal(literal) => literal.value(),
    }
}

/// A set of variable bindings.
///
/// ```
/// use oxrdf::{NamedNode, Variable};
/// use sparstep::term::Substitution;
///
/// let s = Variable::new("s")?;
/// let mut substitution = Substitution::default();
/// substitution.insert(s.clone(), NamedNode::new("http://example.com")?.into());
/// assert!(substitution.get(&s).is_some());
/// assert!(substitution.get(&Variable::new("o")?).is_none());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Substitution {
    bindings: FxHashMap<Variable, Term>,
}

impl Substitution {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `variable` to `term`, returning the previous binding if there was one.
    #[inline]
    pub fn insert(&mut self, variable: Variable, term: Term) -> Option<Term> {
        self.bindings.insert(variable, term)
    }

    #[inline]
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.bindings.get(variable)
    }

    #[inline]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.bindings.contains_key(variable)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(Variable, Term)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Variable, Term)> for Substitution {
    fn extend<I: IntoIterator<Item = (Variable, Term)>>(&mut self, iter: I) {
        self.bindings.extend(iter)
    }
}
