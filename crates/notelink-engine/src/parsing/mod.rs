//! Parsing for stored document data.
//!
//! [`html::parse_fragment`] turns the HTML subset a document is saved as
//! into a tree that the conversion layer upcasts into model blocks.

pub mod cursor;
pub mod html;

pub use html::{HtmlElement, HtmlNode, parse_fragment};
