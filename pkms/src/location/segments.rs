//! Canonical ordered-tuple representation of a URI path.
//!
//! A `PathSegments` value is either empty, or an optional leading root
//! marker followed by one or more string elements. Elements are kept exactly
//! as parsed: empty elements produced by repeated or trailing slashes are
//! preserved and no dot-segment removal is ever applied.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, ParseError};

/// Characters escaped when rendering a single segment.
///
/// `/` and `%` must always be escaped so that a rendered segment splits and
/// decodes back to exactly one element; `?` and `#` would otherwise start a
/// query or fragment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// An ordered path tuple with an optional leading root marker.
///
/// As a tuple, the value reads `()` for the empty path, `(root, "a", "")` for
/// `/a/`, and `("a", "b")` for the rootless `a/b`. The root marker can only
/// ever sit at index 0, and a root marker with nothing after it is rejected
/// by every public constructor.
///
/// # Examples
///
/// ```
/// use pkms::location::PathSegments;
///
/// let segments = PathSegments::parse("/notes//2024/", true).unwrap();
/// assert!(segments.is_rooted());
/// assert_eq!(segments.names(), ["notes", "", "2024", ""]);
/// assert_eq!(segments.render(), "/notes//2024/");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Option<String>>",
    into = "Vec<Option<String>>"
)]
pub struct PathSegments {
    rooted: bool,
    names: Vec<String>,
}

impl PathSegments {
    /// The empty path `()`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rooted: false,
            names: Vec::new(),
        }
    }

    /// Builds a rooted path `(root, names...)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSegments` if `names` is empty: a bare root marker is
    /// not a representable public value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::PathSegments;
    ///
    /// let segments = PathSegments::rooted(["a", "b"]).unwrap();
    /// assert_eq!(segments.render(), "/a/b");
    /// assert!(PathSegments::rooted(Vec::<String>::new()).is_err());
    /// ```
    pub fn rooted<I, S>(names: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Self::bare_root_error());
        }
        Ok(Self {
            rooted: true,
            names,
        })
    }

    /// Builds a rootless path `(names...)`. An empty iterator yields `()`.
    #[must_use]
    pub fn relative<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rooted: false,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds segments from the tuple form, where `None` is the root marker.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSegments` if a `None` appears anywhere but index 0,
    /// appears more than once, or is the only element.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::PathSegments;
    ///
    /// assert!(PathSegments::new(vec![None, Some("a".into())]).is_ok());
    /// assert!(PathSegments::new(vec![Some("a".into()), None]).is_err());
    /// assert!(PathSegments::new(vec![None, None]).is_err());
    /// assert!(PathSegments::new(vec![None]).is_err());
    /// ```
    pub fn new(tuple: Vec<Option<String>>) -> Result<Self, ConstructionError> {
        let markers = tuple.iter().filter(|element| element.is_none()).count();
        if markers > 1 {
            return Err(ConstructionError::InvalidSegments {
                reason: format!("found {markers} root markers, at most one is allowed"),
            });
        }
        if let Some(index) = tuple.iter().skip(1).position(Option::is_none) {
            return Err(ConstructionError::InvalidSegments {
                reason: format!("root marker at index {}, only index 0 is allowed", index + 1),
            });
        }

        let rooted = matches!(tuple.first(), Some(None));
        let names: Vec<String> = tuple.into_iter().flatten().collect();
        if rooted && names.is_empty() {
            return Err(Self::bare_root_error());
        }
        Ok(Self { rooted, names })
    }

    /// Parses the path portion of a URI.
    ///
    /// `has_authority` records whether an authority component preceded the
    /// path; in that case the path must be empty or begin with `/`. Each
    /// `/`-delimited element is percent-decoded independently, so `%2F`
    /// yields a literal `/` inside one element.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEscape` for a malformed percent-escape and
    /// `InvalidUri` for a rootless path after an authority.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::PathSegments;
    ///
    /// assert!(PathSegments::parse("", true).unwrap().is_empty());
    /// let segments = PathSegments::parse("/a%2Fb", true).unwrap();
    /// assert_eq!(segments.names(), ["a/b"]);
    /// ```
    pub fn parse(path: &str, has_authority: bool) -> Result<Self, ParseError> {
        if path.is_empty() {
            return Ok(Self::empty());
        }

        if let Some(rest) = path.strip_prefix('/') {
            let names = rest
                .split('/')
                .map(decode_component)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self {
                rooted: true,
                names,
            });
        }

        if has_authority {
            return Err(ParseError::InvalidUri {
                input: path.to_string(),
                reason: "a path after an authority must be empty or start with '/'".into(),
            });
        }

        let names = path
            .split('/')
            .map(decode_component)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rooted: false,
            names,
        })
    }

    /// Renders the segments as percent-encoded URI path text.
    ///
    /// Rendering is best-effort: a rootless tuple whose first element is
    /// empty has no spelling that parses back to itself.
    #[must_use]
    pub fn render(&self) -> String {
        let encoded: Vec<String> = self
            .names
            .iter()
            .map(|name| utf8_percent_encode(name, SEGMENT_ENCODE_SET).to_string())
            .collect();
        let joined = encoded.join("/");
        if self.rooted {
            format!("/{joined}")
        } else {
            joined
        }
    }

    /// Whether this is the empty path `()`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.rooted && self.names.is_empty()
    }

    /// Whether the tuple starts with the root marker.
    #[must_use]
    pub const fn is_rooted(&self) -> bool {
        self.rooted
    }

    /// The string elements, excluding the root marker.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Tuple length, counting the root marker.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len() + usize::from(self.rooted)
    }

    /// Iterates over the tuple, yielding `None` for the root marker.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rooted
            .then_some(None)
            .into_iter()
            .chain(self.names.iter().map(|name| Some(name.as_str())))
    }

    /// The tuple form, with `None` standing for the root marker.
    #[must_use]
    pub fn to_tuple(&self) -> Vec<Option<String>> {
        self.iter().map(|element| element.map(str::to_string)).collect()
    }

    /// Whether `prefix` is an element-wise tuple prefix of `self`.
    ///
    /// No normalization happens first, so `/vault/` (`(root, "vault", "")`)
    /// is not a prefix of `/vault/a`.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.rooted == prefix.rooted
            && prefix.names.len() <= self.names.len()
            && self.names.iter().zip(&prefix.names).all(|(a, b)| a == b)
    }

    fn bare_root_error() -> ConstructionError {
        ConstructionError::InvalidSegments {
            reason: "a root marker must be followed by at least one segment".into(),
        }
    }
}

impl fmt::Display for PathSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl TryFrom<Vec<Option<String>>> for PathSegments {
    type Error = ConstructionError;

    fn try_from(tuple: Vec<Option<String>>) -> Result<Self, Self::Error> {
        Self::new(tuple)
    }
}

impl From<PathSegments> for Vec<Option<String>> {
    fn from(segments: PathSegments) -> Self {
        segments.to_tuple()
    }
}

/// Checks that every `%` in `raw` starts a two-digit hex escape.
pub(crate) fn validate_escapes(raw: &str) -> Result<(), ParseError> {
    let bytes = raw.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let well_formed = bytes.len() > index + 2
                && bytes[index + 1].is_ascii_hexdigit()
                && bytes[index + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(ParseError::InvalidEscape {
                    segment: raw.to_string(),
                    position: index,
                });
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    Ok(())
}

/// Percent-decodes one already-split component.
pub(crate) fn decode_component(raw: &str) -> Result<String, ParseError> {
    validate_escapes(raw)?;
    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| ParseError::InvalidEscape {
            segment: raw.to_string(),
            position: raw.find('%').unwrap_or(0),
        })
}
