//! Longest-prefix matching of locations against a set of bases.

use crate::location::FileLocation;

/// Maps a location to the most specific base location that contains it.
///
/// A base contains a location when both share scheme and authority and the
/// base's segments are an element-wise prefix of the location's. Among
/// several containing bases the one with the most segments wins; ties go to
/// the base listed first.
///
/// # Examples
///
/// ```
/// use pkms::location::{FileLocation, LocationMatcher};
///
/// let matcher = LocationMatcher::new([
///     FileLocation::from_uri("file:///vault").unwrap(),
///     FileLocation::from_uri("file:///vault/journal").unwrap(),
/// ]);
/// let entry = FileLocation::from_uri("file:///vault/journal/2024.md").unwrap();
/// assert_eq!(matcher.find_match_index(&entry), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocationMatcher {
    bases: Vec<FileLocation>,
}

impl LocationMatcher {
    /// Creates a matcher over the given bases.
    pub fn new(bases: impl IntoIterator<Item = FileLocation>) -> Self {
        Self {
            bases: bases.into_iter().collect(),
        }
    }

    /// The bases, in the order they were supplied.
    #[must_use]
    pub fn bases(&self) -> &[FileLocation] {
        &self.bases
    }

    /// Index of the longest base containing `location`.
    #[must_use]
    pub fn find_match_index(&self, location: &FileLocation) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (index, base) in self.bases.iter().enumerate() {
            if base.scheme() != location.scheme()
                || base.authority() != location.authority()
                || !location.segments().starts_with(base.segments())
            {
                continue;
            }
            let length = base.segments().len();
            if best.map_or(true, |(_, best_length)| length > best_length) {
                best = Some((index, length));
            }
        }
        best.map(|(index, _)| index)
    }

    /// The longest base containing `location`.
    #[must_use]
    pub fn find_match(&self, location: &FileLocation) -> Option<&FileLocation> {
        self.find_match_index(location).map(|index| &self.bases[index])
    }
}
