//! DOM-like document tree.
//!
//! This module handles:
//! - Arena storage with stable [`NodeId`] handles
//! - Attribute, class-list, and inline-style accessors
//! - Parsing the HTML-like fixture format and serializing back to it

mod parser;
mod types;

pub use parser::ParseError;
pub use types::{Ancestors, Descendants, Document, ElementData, NodeData, NodeId};
