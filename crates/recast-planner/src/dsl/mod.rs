//! Pipeline document front-ends.

pub mod document;
