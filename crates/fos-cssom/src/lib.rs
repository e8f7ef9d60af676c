//! fOS CSS Object Model
//!
//! A small CSS dialect engine: an incremental parser that turns stylesheet
//! text into (selector chain, property list) rules, right-to-left selector
//! matching over a caller-owned document tree, and a canonical serializer.
//!
//! Property names and values are opaque to the engine. The caller injects
//! name/id mapping and value parsing as plain functions, and walks its own
//! tree through the [`Crawler`] trait.
//!
//! ```
//! use fos_cssom::{PropertyId, Stylesheet};
//!
//! const FILL: PropertyId = PropertyId(0);
//!
//! let sheet = Stylesheet::parse(
//!     "rect { fill: red; }",
//!     |name| (name == "fill").then_some(FILL),
//!     |_, value| Some(value),
//! )
//! .unwrap();
//! assert_eq!(sheet.len(), 1);
//! ```

mod matching;
mod parser;
mod selector;
mod stylesheet;
mod writer;

pub use matching::{chain_matches, Crawler, Styleable};
pub use parser::{CssParser, ParseEvent, ParseListener};
pub use selector::{Combinator, Selector, SelectorChain, Specificity};
pub use stylesheet::{PropertyId, PropertyList, QueryResult, Style, StyleBuilder, Stylesheet};
pub use writer::WriteOptions;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CssError>;

/// CSS parsing and serialization errors
#[derive(Debug, thiserror::Error)]
pub enum CssError {
    /// The input does not follow the supported grammar
    #[error("Malformed CSS at line {line}: {message}")]
    Malformed { line: u32, message: String },

    /// The input uses a CSS feature this engine does not implement
    #[error("Unsupported CSS feature at line {line}: {feature}")]
    Unsupported { line: u32, feature: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl CssError {
    /// Line number the error was raised at, if it came from the parser
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Malformed { line, .. } | Self::Unsupported { line, .. } => Some(*line),
            Self::Io(_) | Self::Fmt(_) => None,
        }
    }
}
