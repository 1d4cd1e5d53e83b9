//! Property-based tests for location parsing and rendering.

use super::{FileLocation, LocationMatcher, PathSegments};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use proptest::prelude::*;

fn scheme_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9+.-]{0,6}"
}

// Raw segment text, before escaping; may contain '/', '%' and non-ASCII
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9 ./%éü_-]{0,6}"
}

fn encode(name: &str) -> String {
    utf8_percent_encode(name, NON_ALPHANUMERIC).to_string()
}

fn authority_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-z0-9.@-]{1,8}".prop_map(Some),
    ]
}

// URI text built from scheme, authority, and a rooted or rootless path
fn uri_strategy() -> impl Strategy<Value = String> {
    (
        scheme_strategy(),
        authority_strategy(),
        any::<bool>(),
        prop::collection::vec(name_strategy(), 0..6),
    )
        .prop_map(|(scheme, authority, rooted, mut names)| {
            // A leading empty name without an authority would read as "//authority"
            if authority.is_none() && names.first().is_some_and(String::is_empty) {
                names[0] = "n".to_string();
            }
            let encoded: Vec<String> = names.iter().map(|name| encode(name)).collect();
            let mut path = encoded.join("/");
            if !names.is_empty() && (rooted || authority.is_some()) {
                path.insert(0, '/');
            }
            match authority {
                Some(authority) => format!("{scheme}://{authority}{path}"),
                None => format!("{scheme}:{path}"),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // from_uri(to_uri(from_uri(s))) == from_uri(s)
    #[test]
    fn parse_render_parse_is_stable(uri in uri_strategy()) {
        let parsed = FileLocation::from_uri(&uri).unwrap();
        let reparsed = FileLocation::from_uri(&parsed.to_uri()).unwrap();
        prop_assert_eq!(parsed, reparsed);
    }

    // Only index 0 can hold the root marker
    #[test]
    fn parsed_segments_have_valid_shape(uri in uri_strategy()) {
        let parsed = FileLocation::from_uri(&uri).unwrap();
        let tuple = parsed.segments().to_tuple();
        prop_assert!(tuple.iter().skip(1).all(Option::is_some));
        if parsed.authority().is_some() {
            prop_assert!(tuple.is_empty() || tuple[0].is_none());
        }
        prop_assert_eq!(tuple.len(), parsed.segments().len());
    }

    // Rendered rooted segments parse back to the same names
    #[test]
    fn rooted_segments_render_and_parse(names in prop::collection::vec(name_strategy(), 1..6)) {
        let segments = PathSegments::rooted(names).unwrap();
        let reparsed = PathSegments::parse(&segments.render(), true).unwrap();
        prop_assert_eq!(reparsed, segments);
    }

    // Parsing never panics on arbitrary input
    #[test]
    fn from_uri_total(input in "\\PC{0,24}") {
        let _ = FileLocation::from_uri(&input);
    }

    // Every location matches itself as a base
    #[test]
    fn matcher_reflexive(uri in uri_strategy()) {
        let location = FileLocation::from_uri(&uri).unwrap();
        let matcher = LocationMatcher::new([location.clone()]);
        prop_assert_eq!(matcher.find_match_index(&location), Some(0));
    }
}
