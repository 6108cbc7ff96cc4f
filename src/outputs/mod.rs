//! Output generation for the Atom feed.
//!
//! # Submodules
//!
//! - [`content`]: HTML fragment summarizing one program and its scope
//! - [`atom`]: Atom XML rendering and the final file write

pub mod atom;
pub mod content;
