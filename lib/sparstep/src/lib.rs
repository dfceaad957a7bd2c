#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![doc(test(attr(deny(warnings))))]

pub mod algebra;
mod error;
pub mod expression;
mod processor;
mod query;
mod step;
pub mod term;

pub use error::{ObjectTermError, QueryEvaluationError};
pub use processor::{QuadsConstraints, QueryProcessor};
pub use query::*;
pub use step::*;
