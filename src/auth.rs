//! Auth-domain identifiers and the fixed scope enumeration.

pub mod id;
pub mod scope;

pub use id::*;
pub use scope::*;
