//! Customs declaration field extraction.
//!
//! Per field: collect candidates from every catalog pattern, let a resolver
//! pick one, then convert and validate it. The extractor runs this for the
//! whole catalog and assembles the page record.

pub mod collector;
mod extractor;
pub mod page;
pub mod resolver;
pub mod rules;
mod validate;

pub use collector::{Candidate, collect};
pub use extractor::{DeclarationExtractor, extract_all};
pub use page::{PageClassifier, PageType};
pub use resolver::{PriorityResolver, Resolution, Resolver, ResolverStrategy, VotingResolver};
pub use rules::convert;
pub use validate::{InvalidField, ValidationReport, validate_record};
