//! Frame tokenizer for ODAS JSON output files
//!
//! `odaslive` writes one JSON object per hop, back to back, with no separator
//! beyond the closing brace of one object meeting the opening brace of the
//! next. This module turns such a file into an ordered list of [`Frame`]s.
//!
//! Two strategies are available:
//! - [`TokenizerMode::Scanner`] tracks brace depth and string state
//! - [`TokenizerMode::Boundary`] splits on `}\s*{` adjacency
//!
//! Both are lexical. Payloads are never parsed or validated; the receiver owns
//! that. Tokenizing the same text twice always yields the same frames.
//!
//! ```rust
//! use odas_replay::tokenizer::{tokenize, TokenizerMode};
//!
//! let text = "{\n  \"timeStamp\": 0\n}\n{\n  \"timeStamp\": 1\n}\n";
//! let frames = tokenize(text, TokenizerMode::Scanner);
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].as_str(), "{\n  \"timeStamp\": 1\n}\n");
//! ```

mod boundary;
mod reader;
mod scanner;

pub use boundary::BoundaryFrames;
pub use reader::{load_sequence, sequence_from_text};
pub use scanner::ScanFrames;

use serde::{Deserialize, Serialize};

use crate::types::Frame;

/// Strategy used to find frame boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerMode {
    /// Brace-depth scanner aware of string literals and escapes
    #[default]
    Scanner,

    /// `}\s*{` adjacency split with brace repair
    Boundary,
}

/// Lazy frame iterator for either strategy.
#[derive(Debug, Clone)]
pub enum Frames<'a> {
    Scanner(ScanFrames<'a>),
    Boundary(BoundaryFrames<'a>),
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        match self {
            Frames::Scanner(inner) => inner.next(),
            Frames::Boundary(inner) => inner.next(),
        }
    }
}

/// Iterate the frames in `text` without materializing them.
pub fn frames(text: &str, mode: TokenizerMode) -> Frames<'_> {
    match mode {
        TokenizerMode::Scanner => Frames::Scanner(ScanFrames::new(text)),
        TokenizerMode::Boundary => Frames::Boundary(BoundaryFrames::new(text)),
    }
}

/// Tokenize `text` into frames in file order.
pub fn tokenize(text: &str, mode: TokenizerMode) -> Vec<Frame> {
    frames(text, mode).collect()
}
