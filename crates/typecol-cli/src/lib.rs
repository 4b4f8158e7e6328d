//! Library components of the `typecol` command-line tool.

pub mod document;
pub mod logging;
