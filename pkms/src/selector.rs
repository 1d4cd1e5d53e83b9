//! Logical references: `pkms:///file/<selector>:<value>.<extension>`.
//!
//! A selector is a tagged value (`{kind, value}`) whose kind must appear in
//! the recognised-name table [`SELECTOR_KINDS`]. Supporting a new selector
//! means adding a table row, not a new type.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ResolverError;
use crate::identity::normalize_extension;
use crate::location::FileLocation;

/// Scheme of logical reference URIs.
pub const REFERENCE_SCHEME: &str = "pkms";

/// First path segment of a logical file reference.
pub const FILE_NAMESPACE: &str = "file";

/// Longest accepted selector name.
const MAX_SELECTOR_NAME_LEN: usize = 16;

/// Which identity field a selector is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    /// The human-assigned `file_id`, paired with the extension.
    FileId,
    /// The content/generation-derived `file_uid`.
    FileUid,
    /// The `content_hash` of any revision.
    ContentHash,
}

/// A row of the recognised-selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectorKind {
    name: &'static str,
    field: LookupField,
    uses_extension: bool,
    hex_value: bool,
}

impl SelectorKind {
    /// The selector name as written in references.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The identity field this selector matches.
    #[must_use]
    pub const fn field(&self) -> LookupField {
        self.field
    }

    /// Whether the extension takes part in matching.
    #[must_use]
    pub const fn uses_extension(&self) -> bool {
        self.uses_extension
    }

    /// Looks up a selector name in the recognised table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for names that are not short lowercase
    /// tokens (`[a-z][a-z0-9]*`), compound names such as `id+ext`, and
    /// names missing from the table.
    pub fn lookup(name: &str) -> Result<Self, ResolverError> {
        let invalid = |reason: String| ResolverError::InvalidReference {
            reference: name.to_string(),
            reason,
        };

        if name.contains('+') {
            return Err(invalid("compound selectors are not supported".into()));
        }
        let mut chars = name.chars();
        let well_formed = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && name.len() <= MAX_SELECTOR_NAME_LEN;
        if !well_formed {
            return Err(invalid(
                "selector must be a short lowercase token like 'id'".into(),
            ));
        }

        SELECTOR_KINDS
            .iter()
            .find(|kind| kind.name == name)
            .copied()
            .ok_or_else(|| invalid(format!("unknown selector '{name}'")))
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for SelectorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// The recognised selectors.
pub const SELECTOR_KINDS: &[SelectorKind] = &[
    SelectorKind {
        name: "id",
        field: LookupField::FileId,
        uses_extension: true,
        hex_value: false,
    },
    SelectorKind {
        name: "uid",
        field: LookupField::FileUid,
        uses_extension: false,
        hex_value: false,
    },
    SelectorKind {
        name: "sha256",
        field: LookupField::ContentHash,
        uses_extension: false,
        hex_value: true,
    },
];

/// A validated `{kind, value}` pair.
///
/// # Examples
///
/// ```
/// use pkms::selector::Selector;
///
/// let selector = Selector::new("id", "2024-01-01-0001").unwrap();
/// assert_eq!(selector.kind().name(), "id");
/// assert!(Selector::new("id+ext", "x").is_err());
/// assert!(Selector::new("path", "x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Selector {
    kind: SelectorKind,
    value: String,
}

impl Selector {
    /// Validates and builds a selector. The value is lowercased.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for an unrecognised kind, an empty value,
    /// a value containing whitespace, `/`, `:` or `.`, or a non-hex value
    /// for hash selectors.
    pub fn new(kind: &str, value: &str) -> Result<Self, ResolverError> {
        let kind = SelectorKind::lookup(kind)?;
        let invalid = |reason: &str| ResolverError::InvalidReference {
            reference: format!("{}:{value}", kind.name),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("selector value must be non-empty"));
        }
        if value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | ':' | '.'))
        {
            return Err(invalid(
                "selector value must not contain whitespace, '/', ':' or '.'",
            ));
        }
        if kind.hex_value && !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("hash selector value must be hexadecimal"));
        }

        Ok(Self {
            kind,
            value: value.to_lowercase(),
        })
    }

    /// The selector kind.
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// The lowercased selector value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A logical reference: a selector plus an optional extension.
///
/// # Examples
///
/// ```
/// use pkms::selector::Reference;
///
/// let reference = Reference::parse_uri("pkms:///file/id:2024-01-01-0001.MD").unwrap();
/// assert_eq!(reference.selector().value(), "2024-01-01-0001");
/// assert_eq!(reference.extension(), Some(".md"));
/// assert_eq!(reference.to_uri(), "pkms:///file/id:2024-01-01-0001.md");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    selector: Selector,
    extension: Option<String>,
}

impl Reference {
    /// Builds a reference from its parts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if the selector or extension is invalid.
    pub fn new(kind: &str, value: &str, extension: Option<&str>) -> Result<Self, ResolverError> {
        let selector = Selector::new(kind, value)?;
        let extension = match extension {
            Some(extension) => {
                normalize_extension(extension).map_err(|err| ResolverError::InvalidReference {
                    reference: format!("{kind}:{value}{extension}"),
                    reason: err.message,
                })?
            }
            None => None,
        };
        Ok(Self {
            selector,
            extension,
        })
    }

    /// Parses a logical reference URI.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if the text is not a URI, uses a scheme
    /// other than `pkms`, names a remote authority, or does not have the
    /// path shape `/file/<selector>:<value>[.<extension>]`.
    pub fn parse_uri(input: &str) -> Result<Self, ResolverError> {
        let location =
            FileLocation::from_uri(input).map_err(|err| ResolverError::InvalidReference {
                reference: input.to_string(),
                reason: err.to_string(),
            })?;
        Self::from_location(&location)
    }

    /// Interprets a parsed location as a logical reference.
    ///
    /// # Errors
    ///
    /// See [`Reference::parse_uri`].
    pub fn from_location(location: &FileLocation) -> Result<Self, ResolverError> {
        let invalid = |reason: &str| ResolverError::InvalidReference {
            reference: location.to_uri(),
            reason: reason.to_string(),
        };

        if location.scheme() != REFERENCE_SCHEME {
            return Err(invalid("unsupported scheme, expected 'pkms'"));
        }
        if location.authority().is_some_and(|authority| !authority.is_empty()) {
            return Err(invalid("logical references do not take an authority"));
        }

        let segments = location.segments();
        let target = match segments.names() {
            [namespace, target] if segments.is_rooted() && namespace == FILE_NAMESPACE => target,
            _ => return Err(invalid("expected path '/file/<selector>:<value>.<extension>'")),
        };

        let (kind, rest) = target
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' between selector and value"))?;
        let (value, extension) = match rest.split_once('.') {
            Some((value, extension)) => (value, Some(extension)),
            None => (rest, None),
        };

        Self::new(kind, value, extension)
    }

    /// The selector.
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The normalized extension, including the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Renders the canonical reference URI.
    #[must_use]
    pub fn to_uri(&self) -> String {
        format!(
            "{REFERENCE_SCHEME}:///{FILE_NAMESPACE}/{}:{}{}",
            self.selector.kind.name,
            self.selector.value,
            self.extension.as_deref().unwrap_or_default()
        )
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for Reference {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_uri(s)
    }
}
