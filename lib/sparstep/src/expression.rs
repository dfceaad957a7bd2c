//! Boolean [expressions](https://www.w3.org/TR/sparql11-query/#expressions) usable in `FILTER` and `BIND`.
//!
//! Every expression can be both serialized to SPARQL using [`Display`](fmt::Display)
//! and evaluated against a [`Substitution`]. Both sides must stay in sync.

use crate::error::QueryEvaluationError;
use crate::term::Substitution;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Literal, NamedNode, NamedNodeRef, Term, Variable};
use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A boolean expression.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Expression {
    NamedNode(NamedNode),
    Literal(Literal),
    Variable(Variable),
    /// A call to one of the supported SPARQL built-in functions.
    BuiltIn(BuiltInCall),
    /// An operator applied to sub-expressions.
    Operator(OperatorExpression),
}

impl Expression {
    /// Builds a [logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or) of two expressions.
    #[inline]
    pub fn or(left: impl Into<Self>, right: impl Into<Self>) -> Self {
        OperatorExpression::or(left.into(), right.into()).into()
    }

    /// Returns the variables the expression needs to be evaluated.
    pub fn variables(&self) -> BTreeSet<&Variable> {
        match self {
            Self::NamedNode(_) | Self::Literal(_) => BTreeSet::new(),
            Self::Variable(v) => BTreeSet::from([v]),
            Self::BuiltIn(call) => BTreeSet::from([&call.variable]),
            Self::Operator(op) => op.variables.iter().collect(),
        }
    }

    /// Evaluates the expression to a boolean.
    ///
    /// Non boolean values are converted using the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) rules.
    ///
    /// Fails with [`QueryEvaluationError::MissingBinding`] if a required variable is not bound in `substitution`.
    pub fn evaluate(&self, substitution: &Substitution) -> Result<bool, QueryEvaluationError> {
        match self {
            Self::NamedNode(_) => Ok(false),
            Self::Literal(literal) => Ok(literal_effective_boolean_value(literal)),
            Self::Variable(v) => Ok(match lookup(substitution, v)? {
                Term::Literal(literal) => literal_effective_boolean_value(literal),
                _ => false,
            }),
            Self::BuiltIn(call) => call.evaluate(substitution),
            Self::Operator(op) => op.evaluate(substitution),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
            Self::Variable(var) => var.fmt(f),
            Self::BuiltIn(call) => call.fmt(f),
            Self::Operator(op) => op.fmt(f),
        }
    }
}

impl From<NamedNode> for Expression {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<Literal> for Expression {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Variable> for Expression {
    #[inline]
    fn from(var: Variable) -> Self {
        Self::Variable(var)
    }
}

impl From<BuiltInCall> for Expression {
    #[inline]
    fn from(call: BuiltInCall) -> Self {
        Self::BuiltIn(call)
    }
}

impl From<OperatorExpression> for Expression {
    #[inline]
    fn from(op: OperatorExpression) -> Self {
        Self::Operator(op)
    }
}

/// The built-in functions supported by [`BuiltInCall`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BuiltInFunction {
    /// [isIRI](https://www.w3.org/TR/sparql11-query/#func-isIRI)
    IsIri,
    /// [isBlank](https://www.w3.org/TR/sparql11-query/#func-isBlank)
    IsBlank,
    /// [isLiteral](https://www.w3.org/TR/sparql11-query/#func-isLiteral)
    IsLiteral,
    /// [isNumeric](https://www.w3.org/TR/sparql11-query/#func-isNumeric)
    IsNumeric,
    /// [lang](https://www.w3.org/TR/sparql11-query/#func-lang) used as a boolean: the term is a language-tagged literal.
    Lang,
    /// [langMatches](https://www.w3.org/TR/sparql11-query/#func-langMatches) applied to the language of the variable.
    LangMatches,
}

impl fmt::Display for BuiltInFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IsIri => "isIRI",
            Self::IsBlank => "isBLANK",
            Self::IsLiteral => "isLITERAL",
            Self::IsNumeric => "isNUMERIC",
            Self::Lang => "LANG",
            Self::LangMatches => "LANGMATCHES",
        })
    }
}

/// A built-in function call on a single variable, with an optional second argument.
///
/// ```
/// use oxrdf::{Literal, Variable};
/// use sparstep::expression::BuiltInCall;
/// use sparstep::term::Substitution;
///
/// let o = Variable::new("o")?;
/// let call = BuiltInCall::lang_matches(o.clone(), "EN");
/// assert_eq!(call.to_string(), "LANGMATCHES(LANG(?o), \"en\")");
///
/// let substitution = Substitution::from_iter([(
///     o,
///     Literal::new_language_tagged_literal("cat", "en-GB")?.into(),
/// )]);
/// assert!(call.evaluate(&substitution)?);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct BuiltInCall {
    function: BuiltInFunction,
    variable: Variable,
    argument: Option<Literal>,
}

impl BuiltInCall {
    #[inline]
    pub fn is_iri(variable: Variable) -> Self {
        Self::unary(BuiltInFunction::IsIri, variable)
    }

    #[inline]
    pub fn is_blank(variable: Variable) -> Self {
        Self::unary(BuiltInFunction::IsBlank, variable)
    }

    #[inline]
    pub fn is_literal(variable: Variable) -> Self {
        Self::unary(BuiltInFunction::IsLiteral, variable)
    }

    #[inline]
    pub fn is_numeric(variable: Variable) -> Self {
        Self::unary(BuiltInFunction::IsNumeric, variable)
    }

    #[inline]
    pub fn lang(variable: Variable) -> Self {
        Self::unary(BuiltInFunction::Lang, variable)
    }

    /// `LANGMATCHES(LANG(?variable), range)`.
    ///
    /// `range` is a language tag or `*`. It is normalized to lowercase.
    pub fn lang_matches(variable: Variable, range: &str) -> Self {
        Self {
            function: BuiltInFunction::LangMatches,
            variable,
            argument: Some(Literal::new_simple_literal(range.to_ascii_lowercase())),
        }
    }

    fn unary(function: BuiltInFunction, variable: Variable) -> Self {
        Self {
            function,
            variable,
            argument: None,
        }
    }

    #[inline]
    pub fn function(&self) -> BuiltInFunction {
        self.function
    }

    #[inline]
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    #[inline]
    pub fn argument(&self) -> Option<&Literal> {
        self.argument.as_ref()
    }

    pub fn evaluate(&self, substitution: &Substitution) -> Result<bool, QueryEvaluationError> {
        let term = lookup(substitution, &self.variable)?;
        Ok(match self.function {
            BuiltInFunction::IsIri => term.is_named_node(),
            BuiltInFunction::IsBlank => term.is_blank_node(),
            BuiltInFunction::IsLiteral => term.is_literal(),
            BuiltInFunction::IsNumeric => {
                matches!(term, Term::Literal(literal) if is_numeric_literal(literal))
            }
            BuiltInFunction::Lang => language(term).is_some_and(|l| !l.is_empty()),
            BuiltInFunction::LangMatches => match (language(term), &self.argument) {
                (Some(tag), Some(range)) => language_matches(tag, range.value()),
                _ => false,
            },
        })
    }
}

impl fmt::Display for BuiltInCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function {
            BuiltInFunction::LangMatches => {
                write!(f, "LANGMATCHES(LANG({})", self.variable)?;
                if let Some(argument) = &self.argument {
                    write!(f, ", {argument}")?;
                }
                f.write_str(")")
            }
            function => write!(f, "{function}({})", self.variable),
        }
    }
}

/// The operators supported by [`OperatorExpression`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Operator {
    /// [Logical-or](https://www.w3.org/TR/sparql11-query/#func-logical-or) of all the arguments.
    Or,
    /// `LANG(?v) = "tag"`.
    ///
    /// The empty tag also accepts terms that are not literals.
    LangEquals,
}

/// An operator applied to a list of arguments.
///
/// The set of variables referenced by the arguments is computed once at construction.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct OperatorExpression {
    operator: Operator,
    args: Vec<Expression>,
    variables: BTreeSet<Variable>,
}

impl OperatorExpression {
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::new(Operator::Or, vec![left, right])
    }

    /// `LANG(?variable) = "tag"`, the tag being normalized to lowercase.
    ///
    /// The empty tag matches terms without language: literals without language tag and all non-literal terms.
    pub fn lang_equals(variable: Variable, tag: &str) -> Self {
        Self::new(
            Operator::LangEquals,
            vec![
                variable.into(),
                Literal::new_simple_literal(tag.to_ascii_lowercase()).into(),
            ],
        )
    }

    fn new(operator: Operator, args: Vec<Expression>) -> Self {
        let variables = args
            .iter()
            .flat_map(Expression::variables)
            .cloned()
            .collect();
        Self {
            operator,
            args,
            variables,
        }
    }

    #[inline]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    #[inline]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// All the variables used in the arguments, transitively.
    #[inline]
    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    pub fn evaluate(&self, substitution: &Substitution) -> Result<bool, QueryEvaluationError> {
        if let Some(missing) = self.variables.iter().find(|v| !substitution.contains(v)) {
            return Err(QueryEvaluationError::MissingBinding(missing.clone()));
        }
        match self.operator {
            Operator::Or => {
                // All arguments are evaluated so that a missing binding anywhere is reported
                let mut result = false;
                for arg in &self.args {
                    result |= arg.evaluate(substitution)?;
                }
                Ok(result)
            }
            Operator::LangEquals => {
                // Only built by OperatorExpression::lang_equals
                let [Expression::Variable(variable), Expression::Literal(tag)] = self.args.as_slice()
                else {
                    return Ok(false);
                };
                let term = lookup(substitution, variable)?;
                Ok(match language(term) {
                    Some(language) => language.eq_ignore_ascii_case(tag.value()),
                    None => tag.value().is_empty(),
                })
            }
        }
    }
}

impl fmt::Display for OperatorExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Or => {
                f.write_str("(")?;
                for (i, arg) in self.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str(")")
            }
            Operator::LangEquals => {
                f.write_str("(")?;
                for (i, arg) in self.args.iter().enumerate() {
                    if i == 0 {
                        write!(f, "LANG({arg})")?;
                    } else {
                        write!(f, " = {arg}")?;
                    }
                }
                f.write_str(")")
            }
        }
    }
}

fn lookup<'a>(
    substitution: &'a Substitution,
    variable: &Variable,
) -> Result<&'a Term, QueryEvaluationError> {
    substitution
        .get(variable)
        .ok_or_else(|| QueryEvaluationError::MissingBinding(variable.clone()))
}

/// The language of a literal term, the empty string for literals without language tag
/// and `None` for terms that are not literals.
fn language(term: &Term) -> Option<&str> {
    if let Term::Literal(literal) = term {
        Some(literal.language().unwrap_or(""))
    } else {
        None
    }
}

/// [Basic filtering](https://www.rfc-editor.org/rfc/rfc4647#section-3.3.1) as done by `langMatches`.
fn language_matches(tag: &str, range: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    if range == "*" {
        return true;
    }
    tag.len() >= range.len()
        && tag.as_bytes()[..range.len()].eq_ignore_ascii_case(range.as_bytes())
        && (tag.len() == range.len() || tag.as_bytes()[range.len()] == b'-')
}

fn literal_effective_boolean_value(literal: &Literal) -> bool {
    let datatype = literal.datatype();
    if datatype == xsd::BOOLEAN {
        Boolean::from_str(literal.value()).is_ok_and(bool::from)
    } else if datatype == xsd::STRING || datatype == rdf::LANG_STRING {
        !literal.value().is_empty()
    } else {
        numeric_value(literal).is_some_and(bool::from)
    }
}

fn is_numeric_literal(literal: &Literal) -> bool {
    numeric_value(literal).is_some()
}

/// The effective boolean value of a literal with a numeric datatype.
///
/// Returns `None` if the datatype is not numeric or if the lexical form is not valid for it.
fn numeric_value(literal: &Literal) -> Option<Boolean> {
    let value = literal.value();
    let datatype = literal.datatype();
    if datatype == xsd::DECIMAL {
        return Decimal::from_str(value).ok().map(Boolean::from);
    }
    if datatype == xsd::FLOAT || datatype == xsd::DOUBLE {
        if !is_floating_point_lexical(value) {
            return None;
        }
        return if datatype == xsd::FLOAT {
            Float::from_str(value).ok().map(Boolean::from)
        } else {
            Double::from_str(value).ok().map(Boolean::from)
        };
    }
    let in_range = integer_range(datatype)?;
    let integer = Integer::from_str(value).ok()?;
    in_range(i64::from(integer)).then(|| Boolean::from(integer))
}

/// `xsd:float` and `xsd:double` only allow `INF`, `+INF`, `-INF` and `NaN` as special values.
fn is_floating_point_lexical(value: &str) -> bool {
    matches!(value, "INF" | "+INF" | "-INF" | "NaN")
        || value
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

/// The value space of `xsd:integer` and of its derived datatypes.
fn integer_range(datatype: NamedNodeRef<'_>) -> Option<fn(i64) -> bool> {
    let in_range: fn(i64) -> bool = match datatype {
        xsd::INTEGER | xsd::LONG => |_| true,
        xsd::INT => |v| i32::try_from(v).is_ok(),
        xsd::SHORT => |v| i16::try_from(v).is_ok(),
        xsd::BYTE => |v| i8::try_from(v).is_ok(),
        xsd::NON_NEGATIVE_INTEGER | xsd::UNSIGNED_LONG => |v| v >= 0,
        xsd::POSITIVE_INTEGER => |v| v > 0,
        xsd::NON_POSITIVE_INTEGER => |v| v <= 0,
        xsd::NEGATIVE_INTEGER => |v| v < 0,
        xsd::UNSIGNED_INT => |v| u32::try_from(v).is_ok(),
        xsd::UNSIGNED_SHORT => |v| u16::try_from(v).is_ok(),
        xsd::UNSIGNED_BYTE => |v| u8::try_from(v).is_ok(),
        _ => return None,
    };
    Some(in_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::BlankNode;

    fn o() -> Variable {
        Variable::new_unchecked("o")
    }

    fn bind(term: impl Into<Term>) -> Substitution {
        Substitution::from_iter([(o(), term.into())])
    }

    #[test]
    fn type_tests() {
        let iri = bind(NamedNode::new_unchecked("http://example.com"));
        let blank = bind(BlankNode::new_unchecked("b"));
        let number = bind(Literal::new_typed_literal("12", xsd::INTEGER));
        let text = bind(Literal::new_simple_literal("12"));

        assert!(BuiltInCall::is_iri(o()).evaluate(&iri).unwrap());
        assert!(!BuiltInCall::is_iri(o()).evaluate(&blank).unwrap());
        assert!(BuiltInCall::is_blank(o()).evaluate(&blank).unwrap());
        assert!(!BuiltInCall::is_blank(o()).evaluate(&text).unwrap());
        assert!(BuiltInCall::is_literal(o()).evaluate(&text).unwrap());
        assert!(!BuiltInCall::is_literal(o()).evaluate(&iri).unwrap());
        assert!(BuiltInCall::is_numeric(o()).evaluate(&number).unwrap());
        assert!(!BuiltInCall::is_numeric(o()).evaluate(&text).unwrap());
        assert!(
            !BuiltInCall::is_numeric(o())
                .evaluate(&bind(Literal::new_typed_literal("abc", xsd::INTEGER)))
                .unwrap()
        );
    }

    #[test]
    fn lang_requires_non_empty_tag() {
        let tagged = bind(Literal::new_language_tagged_literal_unchecked("a", "en"));
        let plain = bind(Literal::new_simple_literal("a"));
        let iri = bind(NamedNode::new_unchecked("http://example.com"));
        assert!(BuiltInCall::lang(o()).evaluate(&tagged).unwrap());
        assert!(!BuiltInCall::lang(o()).evaluate(&plain).unwrap());
        assert!(!BuiltInCall::lang(o()).evaluate(&iri).unwrap());
    }

    #[test]
    fn lang_matches() {
        let en_gb = bind(Literal::new_language_tagged_literal_unchecked("a", "en-gb"));
        let english = bind(Literal::new_language_tagged_literal_unchecked("a", "en"));
        let plain = bind(Literal::new_simple_literal("a"));
        assert!(BuiltInCall::lang_matches(o(), "en").evaluate(&en_gb).unwrap());
        assert!(BuiltInCall::lang_matches(o(), "EN").evaluate(&english).unwrap());
        assert!(!BuiltInCall::lang_matches(o(), "en-gb").evaluate(&english).unwrap());
        assert!(!BuiltInCall::lang_matches(o(), "e").evaluate(&english).unwrap());
        assert!(BuiltInCall::lang_matches(o(), "*").evaluate(&english).unwrap());
        assert!(!BuiltInCall::lang_matches(o(), "*").evaluate(&plain).unwrap());
    }

    #[test]
    fn lang_equals_empty_tag_accepts_non_literals() {
        let no_language = OperatorExpression::lang_equals(o(), "");
        assert!(
            no_language
                .evaluate(&bind(NamedNode::new_unchecked("http://example.com")))
                .unwrap()
        );
        assert!(
            no_language
                .evaluate(&bind(Literal::new_simple_literal("a")))
                .unwrap()
        );
        assert!(
            !no_language
                .evaluate(&bind(Literal::new_language_tagged_literal_unchecked(
                    "a", "en"
                )))
                .unwrap()
        );
    }

    #[test]
    fn lang_equals_is_case_insensitive() {
        let czech = OperatorExpression::lang_equals(o(), "CS");
        assert!(
            czech
                .evaluate(&bind(Literal::new_language_tagged_literal_unchecked(
                    "a", "cs"
                )))
                .unwrap()
        );
        assert!(
            !czech
                .evaluate(&bind(NamedNode::new_unchecked("http://example.com")))
                .unwrap()
        );
    }

    #[test]
    fn or_evaluates_both_sides() {
        let x = Variable::new_unchecked("x");
        let expression = Expression::or(BuiltInCall::is_iri(o()), BuiltInCall::is_iri(x.clone()));
        // the left side is true but the missing right binding must still be reported
        let result = expression.evaluate(&bind(NamedNode::new_unchecked("http://example.com")));
        assert!(
            matches!(result, Err(QueryEvaluationError::MissingBinding(v)) if v == x),
            "missing binding not reported"
        );
    }

    #[test]
    fn operator_variables_are_transitive() {
        let x = Variable::new_unchecked("x");
        let expression = OperatorExpression::or(
            Expression::or(BuiltInCall::is_iri(o()), BuiltInCall::lang(x.clone())),
            OperatorExpression::lang_equals(o(), "en").into(),
        );
        assert_eq!(
            expression.variables().iter().collect::<Vec<_>>(),
            [&o(), &x]
        );
    }

    #[test]
    fn missing_binding_is_an_error() {
        let result = BuiltInCall::is_iri(o()).evaluate(&Substitution::new());
        assert!(matches!(
            result,
            Err(QueryEvaluationError::MissingBinding(v)) if v == o()
        ));
    }

    #[test]
    fn effective_boolean_value() {
        let empty = Substitution::new();
        assert!(Expression::from(Literal::from(true)).evaluate(&empty).unwrap());
        assert!(!Expression::from(Literal::from(0)).evaluate(&empty).unwrap());
        assert!(Expression::from(Literal::from(2.5)).evaluate(&empty).unwrap());
        assert!(
            !Expression::from(Literal::new_simple_literal(""))
                .evaluate(&empty)
                .unwrap()
        );
        assert!(
            !Expression::from(Literal::new_typed_literal("NaN", xsd::DOUBLE))
                .evaluate(&empty)
                .unwrap()
        );
        assert!(
            !Expression::from(Literal::new_typed_literal("yes", xsd::BOOLEAN))
                .evaluate(&empty)
                .unwrap()
        );
        assert!(
            Expression::from(o())
                .evaluate(&bind(Literal::new_simple_literal("a")))
                .unwrap()
        );
        assert!(
            !Expression::from(o())
                .evaluate(&bind(BlankNode::new_unchecked("b")))
                .unwrap()
        );
    }

    #[test]
    fn is_numeric_checks_lexical_forms() {
        let is_numeric = |value: &str, datatype: NamedNodeRef<'static>| {
            BuiltInCall::is_numeric(o())
                .evaluate(&bind(Literal::new_typed_literal(value, datatype)))
                .unwrap()
        };
        assert!(is_numeric("1", xsd::INTEGER));
        assert!(is_numeric("-1.5", xsd::DECIMAL));
        assert!(is_numeric("1.5e3", xsd::DOUBLE));
        assert!(is_numeric("INF", xsd::FLOAT));
        assert!(is_numeric("-INF", xsd::DOUBLE));
        assert!(is_numeric("NaN", xsd::DOUBLE));
        assert!(is_numeric("255", xsd::UNSIGNED_BYTE));
        assert!(!is_numeric("1.5", xsd::INTEGER));
        assert!(!is_numeric("infinity", xsd::DOUBLE));
        assert!(!is_numeric("inf", xsd::FLOAT));
        assert!(!is_numeric("-5", xsd::NON_NEGATIVE_INTEGER));
        assert!(!is_numeric("0", xsd::POSITIVE_INTEGER));
        assert!(!is_numeric("256", xsd::UNSIGNED_BYTE));
        assert!(!is_numeric("40000", xsd::SHORT));
        assert!(!is_numeric("1", xsd::STRING));
    }

    #[test]
    fn display() {
        let expression = Expression::or(
            Expression::or(BuiltInCall::is_iri(o()), BuiltInCall::is_blank(o())),
            OperatorExpression::lang_equals(o(), "cs"),
        );
        assert_eq!(
            expression.to_string(),
            "((isIRI(?o) || isBLANK(?o)) || (LANG(?o) = \"cs\"))"
        );
        assert_eq!(BuiltInCall::is_literal(o()).to_string(), "isLITERAL(?o)");
        assert_eq!(BuiltInCall::is_numeric(o()).to_string(), "isNUMERIC(?o)");
        assert_eq!(BuiltInCall::lang(o()).to_string(), "LANG(?o)");
    }
}
