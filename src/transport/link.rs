//! Continuation relations advertised through the `Link` response header.
//!
//! Paginated REST APIs answer with a header such as
//! `<https://host/api?page=2>; rel="next", <https://host/api?page=9>; rel="last"`.
//! Each comma-separated descriptor pairs a target URL with one or more
//! relation types.

use http::HeaderMap;
use http::header::LINK;

/// A single descriptor from a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    target: String,
    relations: Vec<String>,
}

impl LinkDescriptor {
    /// Returns the URL the descriptor points at.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns true when the descriptor carries the given relation type.
    #[must_use]
    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(relation))
    }
}

/// Parses every descriptor from a raw `Link` header value.
///
/// Descriptors that do not wrap their target in angle brackets are skipped.
///
/// # Example
///
/// ```
/// use git_pr::transport::link::parse_link_header;
///
/// let links = parse_link_header(r#"<https://x/a?page=2>; rel="next", <https://x/a?page=5>; rel="last""#);
/// assert_eq!(links.len(), 2);
/// assert!(links[0].has_relation("next"));
/// ```
#[must_use]
pub fn parse_link_header(value: &str) -> Vec<LinkDescriptor> {
    value.split(',').filter_map(parse_descriptor).collect()
}

fn parse_descriptor(raw: &str) -> Option<LinkDescriptor> {
    let mut parts = raw.split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?
        .to_owned();

    let relations = parts
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("rel")
                .then(|| value.trim().trim_matches('"').to_owned())
        })
        .flat_map(|value| {
            value
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .collect();

    Some(LinkDescriptor { target, relations })
}

/// Returns the target of the first `rel="next"` descriptor across all `Link`
/// headers in the response, if any.
#[must_use]
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_link_header)
        .find(|descriptor| descriptor.has_relation("next"))
        .map(|descriptor| descriptor.target)
}
