//! Batched eager loading of alternate relations.
//!
//! Two pipeline stages cooperate around the primary fetch:
//!
//! - [`WithTranslator`] moves requested alternate relations out of `with`
//!   before the host sees the query
//! - [`BatchResolver`] runs one query per alternate relation for the whole
//!   result set and attaches the matches to each record
//!
//! The grouping helpers in [`batch`] are public for hosts that resolve
//! relations outside the pipeline.

pub mod batch;
mod resolver;
mod translator;

pub use batch::{BatchResult, SearchPlan};
pub use resolver::BatchResolver;
pub use translator::WithTranslator;
