//! Reporter-aware citation extraction.
//!
//! One shared pattern module owns the regex tables for every supported
//! reporter family; the extractor walks the original text, dedups
//! overlapping matches, filters statutes, and recovers case-name/year
//! context from sentence-clipped windows. Spans always index the original
//! text, never a normalized copy.

pub mod context;
pub mod extractor;
pub mod normalize;
pub mod patterns;
pub mod reporters;
pub mod similarity;

pub use extractor::extract;
pub use normalize::{clean_case_name, names_agree, squash_whitespace, strip_signal_words};
pub use reporters::{family_of, jurisdiction_of, ReporterClass, ReporterFamily};
pub use similarity::token_set_similarity;
