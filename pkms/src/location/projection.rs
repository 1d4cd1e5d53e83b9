//! Lossy projection between `FileLocation` values and OS path strings.
//!
//! Projection is one-way by contract: drive letters are inferred from the
//! first segment, separators are chosen per target, and nothing guarantees
//! that importing the projected path yields the original location. Neither
//! direction touches the filesystem.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ProjectionError};
use crate::location::{FileLocation, PathSegments};

/// Path convention to project a location onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathTarget {
    /// `/`-separated paths, no drives.
    Posix,
    /// `\`-separated paths with drive letters and UNC shares.
    Windows,
}

impl PathTarget {
    /// The convention of the platform this binary was built for.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

impl fmt::Display for PathTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => write!(f, "posix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for PathTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posix" => Ok(Self::Posix),
            "windows" => Ok(Self::Windows),
            _ => Err(format!("invalid path target: {s}")),
        }
    }
}

/// Characters Windows refuses inside a path component.
const WINDOWS_RESERVED: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\'];

impl FileLocation {
    /// Projects the location onto an OS path string for `target`.
    ///
    /// # Errors
    ///
    /// Returns `Unprojectable` when the location has no path, when a segment
    /// contains a character the target cannot express (NUL and `/`
    /// everywhere, the reserved set on Windows), or when a remote authority
    /// is projected to POSIX.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::{FileLocation, PathTarget};
    ///
    /// let location = FileLocation::from_uri("file:///d:/example/path").unwrap();
    /// assert_eq!(
    ///     location.to_filesystem_path(PathTarget::Windows).unwrap(),
    ///     r"d:\example\path"
    /// );
    /// assert_eq!(
    ///     location.to_filesystem_path(PathTarget::Posix).unwrap(),
    ///     "/d:/example/path"
    /// );
    /// ```
    pub fn to_filesystem_path(&self, target: PathTarget) -> Result<String, ProjectionError> {
        let unprojectable = |reason: String| ProjectionError::Unprojectable { target, reason };
        let segments = self.segments();

        if segments.is_empty() {
            return Err(unprojectable("location has no path".into()));
        }
        for name in segments.names() {
            if name.contains('\0') {
                return Err(unprojectable(format!("segment {name:?} contains NUL")));
            }
            if name.contains('/') {
                return Err(unprojectable(format!("segment {name:?} contains '/'")));
            }
        }

        match target {
            PathTarget::Posix => self.project_posix(segments).map_err(unprojectable),
            PathTarget::Windows => self.project_windows(segments).map_err(unprojectable),
        }
    }

    fn remote_host(&self) -> Option<&str> {
        self.authority()
            .filter(|authority| !authority.is_empty() && !authority.eq_ignore_ascii_case("localhost"))
    }

    fn project_posix(&self, segments: &PathSegments) -> Result<String, String> {
        if let Some(host) = self.remote_host() {
            return Err(format!("remote authority '{host}' has no POSIX form"));
        }
        let joined = segments.names().join("/");
        Ok(if segments.is_rooted() {
            format!("/{joined}")
        } else {
            joined
        })
    }

    fn project_windows(&self, segments: &PathSegments) -> Result<String, String> {
        let names = segments.names();
        let drive = segments
            .is_rooted()
            .then(|| names.first().and_then(|first| drive_letter(first)))
            .flatten();
        let rest = if drive.is_some() { &names[1..] } else { names };

        for name in rest {
            if let Some(c) = name
                .chars()
                .find(|c| WINDOWS_RESERVED.contains(c) || c.is_control())
            {
                return Err(format!("segment {name:?} contains {c:?}"));
            }
        }

        if let Some(host) = self.remote_host() {
            if drive.is_some() {
                return Err(format!("drive letter under remote authority '{host}'"));
            }
            match rest.first() {
                Some(share) if !share.is_empty() => {}
                _ => return Err(format!("UNC path on '{host}' has no share name")),
            }
            return Ok(format!(r"\\{host}\{}", rest.join("\\")));
        }

        Ok(match drive {
            Some(letter) => format!(r"{letter}:\{}", rest.join("\\")),
            None if segments.is_rooted() => format!(r"\{}", rest.join("\\")),
            None => rest.join("\\"),
        })
    }

    /// Imports an OS path string as a `file` location.
    ///
    /// POSIX paths must be absolute. Windows paths may use either separator
    /// and must carry a drive (`C:\notes`), a UNC share (`\\host\share`), or
    /// a leading separator. Segment text is taken literally, so a `%` in a
    /// file name stays a `%`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilesystemPath` for empty, relative, or drive-relative
    /// paths, UNC paths without a share, and paths containing NUL.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkms::location::{FileLocation, PathTarget};
    ///
    /// let location = FileLocation::from_filesystem_path("/notes/a.md", PathTarget::Posix).unwrap();
    /// assert_eq!(location.to_uri(), "file:///notes/a.md");
    ///
    /// let unc = FileLocation::from_filesystem_path(r"\\nas\vault\a.md", PathTarget::Windows).unwrap();
    /// assert_eq!(unc.to_uri(), "file://nas/vault/a.md");
    /// ```
    pub fn from_filesystem_path(path: &str, target: PathTarget) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidFilesystemPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }
        if path.contains('\0') {
            return Err(invalid("path contains NUL"));
        }

        let (authority, names) = match target {
            PathTarget::Posix => {
                let rest = path
                    .strip_prefix('/')
                    .ok_or_else(|| invalid("path must be absolute"))?;
                (String::new(), rest.split('/').map(str::to_string).collect())
            }
            PathTarget::Windows => {
                let unified = path.replace('/', "\\");
                split_windows_path(&unified).map_err(invalid)?
            }
        };

        let segments = PathSegments::rooted(names).map_err(|err| invalid(&err.to_string()))?;
        Ok(Self::from_parts_unchecked("file", Some(authority), segments))
    }
}

/// Returns the drive letter if `segment` is `X:` or `X|`.
fn drive_letter(segment: &str) -> Option<char> {
    let mut chars = segment.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(letter), Some(':' | '|'), None) if letter.is_ascii_alphabetic() => Some(letter),
        _ => None,
    }
}

/// Splits a backslash-only Windows path into (authority, rooted names).
fn split_windows_path(path: &str) -> Result<(String, Vec<String>), &'static str> {
    if let Some(unc) = path.strip_prefix(r"\\") {
        let mut parts = unc.split('\\');
        let host = parts.next().unwrap_or_default();
        if host.is_empty() {
            return Err("UNC path has no host");
        }
        let names: Vec<String> = parts.map(str::to_string).collect();
        if names.first().map_or(true, String::is_empty) {
            return Err("UNC path has no share name");
        }
        return Ok((host.to_string(), names));
    }

    if let Some(rest) = path.strip_prefix('\\') {
        return Ok((String::new(), rest.split('\\').map(str::to_string).collect()));
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let drive = path[..2].to_string();
        return match &path[2..] {
            "" => Ok((String::new(), vec![drive])),
            rest => match rest.strip_prefix('\\') {
                Some(tail) => Ok((
                    String::new(),
                    std::iter::once(drive)
                        .chain(tail.split('\\').map(str::to_string))
                        .collect(),
                )),
                None => Err("drive-relative paths are not supported"),
            },
        };
    }

    Err("path must be absolute")
}
