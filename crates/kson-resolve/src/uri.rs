//! Simplified RFC 3986 URI handling (spec.md §4.K): just enough to
//! resolve `$id`/`$ref` against a base URI. No query-string or
//! userinfo support — KSON schemas don't need it.

/// `{origin, path, fragment}`, split out of a URI string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub origin: String,
    pub path: String,
    pub fragment: String,
}

/// Split `uri` into its `scheme://authority` origin (if any), path, and
/// fragment (without the leading `#`).
#[must_use]
pub fn parse(uri: &str) -> UriParts {
    let (before_fragment, fragment) = match uri.split_once('#') {
        Some((head, tail)) => (head, tail.to_string()),
        None => (uri, String::new()),
    };
    match before_fragment.find("://") {
        Some(scheme_end) => {
            let after_scheme = &before_fragment[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(slash) => UriParts {
                    origin: before_fragment[..scheme_end + 3 + slash].to_string(),
                    path: after_scheme[slash..].to_string(),
                    fragment,
                },
                None => UriParts {
                    origin: before_fragment.to_string(),
                    path: String::new(),
                    fragment,
                },
            }
        }
        None => UriParts {
            origin: String::new(),
            path: before_fragment.to_string(),
            fragment,
        },
    }
}

/// The directory component of `path`: everything up to and including the
/// last `/`, or empty if there is none.
fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Resolve `uri` against `base_uri`, per spec.md §4.K: the resolved
/// origin is `uri`'s origin, falling back to `base`'s; the resolved path
/// is `uri`'s path if absolute, `base`'s directory joined with `uri`'s
/// path if relative and non-blank, else `base`'s path untouched.
/// Returns the resolved `origin + path` (no fragment) and `uri`'s own
/// fragment, kept separate since callers treat it differently (a direct
/// `$id` fragment vs. a `$ref` JSON-Pointer fragment).
#[must_use]
pub fn resolve(uri: &str, base_uri: &str) -> (String, String) {
    let u = parse(uri);
    let b = parse(base_uri);
    let origin = if u.origin.is_empty() { b.origin } else { u.origin };
    let path = if u.path.starts_with('/') {
        u.path
    } else if !u.path.is_empty() {
        format!("{}{}", directory_of(&b.path), u.path)
    } else {
        b.path
    };
    (format!("{origin}{path}"), u.fragment)
}

/// Join a fragment-less URI and a fragment back into one string, as
/// recorded in the ID index.
#[must_use]
pub fn with_fragment(uri_no_fragment: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        uri_no_fragment.to_string()
    } else {
        format!("{uri_no_fragment}#{fragment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_uri_ignores_base() {
        let (resolved, frag) = resolve("http://example.com/schemas/a.json", "http://other.com/x.json");
        assert_eq!(resolved, "http://example.com/schemas/a.json");
        assert!(frag.is_empty());
    }

    #[test]
    fn relative_uri_joins_base_directory() {
        let (resolved, _) = resolve("b.json", "http://example.com/schemas/a.json");
        assert_eq!(resolved, "http://example.com/schemas/b.json");
    }

    #[test]
    fn blank_uri_keeps_base_path() {
        let (resolved, frag) = resolve("#foo", "http://example.com/schemas/a.json");
        assert_eq!(resolved, "http://example.com/schemas/a.json");
        assert_eq!(frag, "foo");
    }

    #[test]
    fn fragment_only_pointer() {
        let (resolved, frag) = resolve("#/definitions/thing", "http://example.com/a.json");
        assert_eq!(resolved, "http://example.com/a.json");
        assert_eq!(frag, "/definitions/thing");
    }

    #[test]
    fn with_fragment_round_trips() {
        assert_eq!(with_fragment("http://example.com/a.json", ""), "http://example.com/a.json");
        assert_eq!(
            with_fragment("http://example.com/a.json", "foo"),
            "http://example.com/a.json#foo"
        );
    }
}
