//! Read-only access to the local NuGet package cache.
//!
//! - [`cache`] — recognises the cache layout and lists the cached packages.
//! - [`nuspec`] — parses the package manifest of one cached package.

pub mod cache;
pub mod nuspec;
