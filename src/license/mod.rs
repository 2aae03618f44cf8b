//! License identification.
//!
//! - [`classifier`] — maps a license document's raw text to a coarse license name.
//! - [`fetch`] — HTTP access to license documents and the GitHub license API.
//! - [`resolver`] — decides where to look for a package's license and in which order.

pub mod classifier;
pub mod fetch;
pub mod resolver;
