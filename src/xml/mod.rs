//! Minimal XML reader for mapping descriptors.

mod lexer;
mod parser;

pub use parser::{parse_document, Element, XmlError};
