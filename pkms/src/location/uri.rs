//! `FileLocation`: a structured (scheme, authority, segments) address.
//!
//! Parsing accepts the scheme/authority/path subset of RFC 3986. Query and
//! fragment components are rejected with an explicit `InvalidUri` rather than
//! being dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, ParseError};
use crate::location::segments::{validate_escapes, PathSegments};

/// A location addressed as `scheme:[//authority]path`.
///
/// An absent authority (`None`) and a present-but-empty one (`Some("")`) are
/// distinct values. Equality is structural over the three fields.
///
/// # Examples
///
/// ```
/// use pkms::location::FileLocation;
///
/// let absent = FileLocation::from_uri("scheme:/a").unwrap();
/// let empty = FileLocation::from_uri("scheme:///a").unwrap();
/// assert_eq!(absent.authority(), None);
/// assert_eq!(empty.authority(), Some(""));
/// assert_ne!(absent, empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LocationParts")]
pub struct FileLocation {
    scheme: String,
    authority: Option<String>,
    segments: PathSegments,
}

/// Unvalidated deserialization shape of a `FileLocation`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LocationParts {
    scheme: String,
    authority: Option<String>,
    segments: PathSegments,
}

impl TryFrom<LocationParts> for FileLocation {
    type Error = ConstructionError;

    fn try_from(parts: LocationParts) -> Result<Self, Self::Error> {
        Self::new(parts.scheme, parts.authority, parts.segments)
    }
}

impl FileLocation {
    /// Assembles a location from its parts.
    ///
    /// # Errors
    ///
    /// - `InvalidScheme` if the scheme does not match
    ///   `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
    /// - `InvalidAuthority` if the authority contains `/`, `?` or `#`
    /// - `InvalidSegments` if an authority is combined with rootless segments
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::{FileLocation, PathSegments};
    ///
    /// let segments = PathSegments::rooted(["vault", "a.md"]).unwrap();
    /// let location = FileLocation::new("file", Some(String::new()), segments).unwrap();
    /// assert_eq!(location.to_uri(), "file:///vault/a.md");
    /// ```
    pub fn new(
        scheme: impl Into<String>,
        authority: Option<String>,
        segments: PathSegments,
    ) -> Result<Self, ConstructionError> {
        let scheme = scheme.into();
        if !is_valid_scheme(&scheme) {
            return Err(ConstructionError::InvalidScheme { scheme });
        }
        if let Some(ref authority) = authority {
            if authority.contains(['/', '?', '#']) {
                return Err(ConstructionError::InvalidAuthority {
                    authority: authority.clone(),
                    reason: "must not contain '/', '?' or '#'".into(),
                });
            }
            if !segments.is_empty() && !segments.is_rooted() {
                return Err(ConstructionError::InvalidSegments {
                    reason: "segments following an authority must start with the root marker"
                        .into(),
                });
            }
        }
        Ok(Self {
            scheme,
            authority,
            segments,
        })
    }

    /// Parses URI text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUri` for a missing or malformed scheme, a query or
    /// fragment component, control characters, or a rootless path after an
    /// authority; `InvalidEscape` for malformed percent-escapes.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::FileLocation;
    ///
    /// let location = FileLocation::from_uri("scheme://a/b/").unwrap();
    /// assert_eq!(location.authority(), Some("a"));
    /// assert_eq!(
    ///     location.segments().to_tuple(),
    ///     vec![None, Some("b".to_string()), Some(String::new())]
    /// );
    /// assert!(FileLocation::from_uri("invalid_uri").is_err());
    /// assert!(FileLocation::from_uri("file:///a?q=1").is_err());
    /// ```
    pub fn from_uri(input: &str) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidUri {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.chars().any(char::is_control) {
            return Err(invalid("control characters are not allowed"));
        }

        let (scheme, rest) = input
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' after scheme"))?;
        if !is_valid_scheme(scheme) {
            return Err(invalid(
                "scheme must start with a letter followed by letters, digits, '+', '-' or '.'",
            ));
        }

        if rest.contains('?') {
            return Err(invalid("query components are not supported"));
        }
        if rest.contains('#') {
            return Err(invalid("fragment components are not supported"));
        }

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };

        if let Some(authority) = authority {
            validate_escapes(authority)?;
        }

        let segments = PathSegments::parse(path, authority.is_some()).map_err(|err| match err {
            ParseError::InvalidUri { reason, .. } => ParseError::InvalidUri {
                input: input.to_string(),
                reason,
            },
            other => other,
        })?;

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.map(str::to_string),
            segments,
        })
    }

    /// Renders the location as URI text.
    ///
    /// Always succeeds. For every value produced by [`FileLocation::from_uri`]
    /// the output parses back to an equal value. Values that have no unique
    /// spelling (an absent authority before a path starting with an empty
    /// segment, `//x`) are rendered with an empty authority.
    #[must_use]
    pub fn to_uri(&self) -> String {
        let path = self.segments.render();
        let mut uri = String::with_capacity(self.scheme.len() + path.len() + 3);
        uri.push_str(&self.scheme);
        uri.push(':');
        match self.authority {
            Some(ref authority) => {
                uri.push_str("//");
                uri.push_str(authority);
            }
            None if path.starts_with("//") => uri.push_str("//"),
            None => {}
        }
        uri.push_str(&path);
        uri
    }

    /// The scheme, exactly as parsed.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The authority: `None` when absent, `Some("")` when present but empty.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The path segments.
    #[must_use]
    pub fn segments(&self) -> &PathSegments {
        &self.segments
    }

    /// Splits the location into (scheme, authority, segments).
    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>, PathSegments) {
        (self.scheme, self.authority, self.segments)
    }

    pub(crate) fn from_parts_unchecked(
        scheme: &str,
        authority: Option<String>,
        segments: PathSegments,
    ) -> Self {
        Self {
            scheme: scheme.to_string(),
            authority,
            segments,
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for FileLocation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
