use oxrdf::{IriParseError, LanguageTagParseError, Variable};

/// An error raised while evaluating a query over local quads.
///
/// All these errors denote a malformed query tree, not a property of the evaluated data.
/// Queries built with [`QueryBuilder`](crate::QueryBuilder) never raise them.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An expression required a variable that is not bound in the evaluated substitution
    #[error("The variable {0} is not bound")]
    MissingBinding(Variable),
    /// The local evaluator does not implement this kind of graph pattern
    #[error("{0} graph patterns are not supported by the local evaluator")]
    UnsupportedNode(&'static str),
    /// The query does not contain any triple pattern
    #[error("The query does not contain a triple pattern")]
    MissingTriplePattern,
    /// The query contains more than one triple pattern
    #[error("The query contains more than one triple pattern")]
    MultipleTriplePatterns,
    /// The query contains more than one `GRAPH` scope
    #[error("The query contains more than one GRAPH scope")]
    MultipleGraphScopes,
}

/// An error raised when building an object term from a lexical value and an optional language tag or datatype.
#[derive(Debug, thiserror::Error)]
pub enum ObjectTermError {
    /// The object IRI is not a valid IRI.
    #[error("Invalid object IRI: {0}")]
    Iri(#[source] IriParseError),
    /// The part after `@` contains a colon but is not a valid IRI.
    #[error("Invalid literal datatype IRI: {0}")]
    Datatype(#[source] IriParseError),
    /// The part after `@` is not a valid BCP 47 language tag.
    #[error("Invalid literal language tag: {0}")]
    LanguageTag(#[from] LanguageTagParseError),
}
