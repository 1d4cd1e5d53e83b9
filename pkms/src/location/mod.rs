//! Canonical location addressing.
//!
//! This module defines [`PathSegments`], the ordered tuple form of a URI
//! path, and [`FileLocation`], the (scheme, authority, segments) value built
//! on it. Parsing is deterministic and never normalizes: repeated slashes,
//! empty segments, and dot segments are kept exactly. Projection to OS paths
//! lives in [`projection`] and is deliberately lossy.

pub mod matcher;
pub mod projection;
pub mod segments;
pub mod uri;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use matcher::LocationMatcher;
pub use projection::PathTarget;
pub use segments::PathSegments;
pub use uri::FileLocation;
