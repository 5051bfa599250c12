//! Query string helpers.
//!
//! [`build_from_params`] turns request params into an encoded query string and
//! [`join_url`] merges such a string into a URL. Joining is idempotent: a query
//! string the URL already ends with is not appended a second time.
use url::form_urlencoded::byte_serialize;

use crate::model::Param;

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

/// Encodes a single param. Params without a name are skipped, params without a
/// value are emitted as a bare name.
pub fn build(param: &Param) -> Option<String> {
    if param.name.is_empty() {
        return None;
    }

    if param.value.is_empty() {
        Some(encode(&param.name))
    } else {
        Some(format!("{}={}", encode(&param.name), encode(&param.value)))
    }
}

/// Builds an encoded query string (without leading `?`) from params, in order.
pub fn build_from_params(params: &[Param]) -> String {
    params.iter().filter_map(build).collect::<Vec<_>>().join("&")
}

/// Appends `qs` to `url`, using `?` or `&` as needed.
///
/// Any fragment stays at the end of the URL. If the URL's query already ends with
/// `qs` the URL is returned unchanged, so re-joining the same query string is a
/// no-op. Repeated pairs inside `qs` itself are kept.
pub fn join_url(url: &str, qs: &str) -> String {
    if qs.is_empty() {
        return url.to_string();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };

    if let Some((_, query)) = base.split_once('?') {
        let query = query.trim_end_matches('&');
        if query == qs || query.ends_with(&format!("&{qs}")) {
            return url.to_string();
        }
    }

    let mut out = base.to_string();
    if !base.contains('?') {
        out.push('?');
    } else if !(out.ends_with('?') || out.ends_with('&')) {
        out.push('&');
    }
    out.push_str(qs);

    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pairs_in_order_and_skips_unnamed() {
        let params = vec![Param::new("q", "1"), Param::new("", "ignored"), Param::new("page", "2")];
        assert_eq!(build_from_params(&params), "q=1&page=2");
    }

    #[test]
    fn empty_value_is_bare_name() {
        assert_eq!(build_from_params(&[Param::new("flag", "")]), "flag");
    }

    #[test]
    fn encodes_reserved_characters() {
        let qs = build_from_params(&[Param::new("a b", "x&y=z")]);
        assert_eq!(qs, "a+b=x%26y%3Dz");
    }

    #[test]
    fn join_adds_question_mark_or_ampersand() {
        assert_eq!(join_url("https://a.test/p", "q=1"), "https://a.test/p?q=1");
        assert_eq!(join_url("https://a.test/p?x=0", "q=1"), "https://a.test/p?x=0&q=1");
        assert_eq!(join_url("https://a.test/p?", "q=1"), "https://a.test/p?q=1");
    }

    #[test]
    fn join_with_empty_query_is_identity() {
        assert_eq!(join_url("https://a.test/p?x=0", ""), "https://a.test/p?x=0");
    }

    #[test]
    fn join_is_idempotent() {
        let once = join_url("https://a.test/p?x=0", "q=1&r=2");
        let twice = join_url(&once, "q=1&r=2");
        assert_eq!(once, twice);
        assert_eq!(twice.matches('?').count(), 1);
    }

    #[test]
    fn join_keeps_repeated_params() {
        let qs = build_from_params(&[Param::new("tag", "a"), Param::new("tag", "a")]);
        assert_eq!(join_url("https://a.test/p", &qs), "https://a.test/p?tag=a&tag=a");
    }

    #[test]
    fn join_appends_pair_already_in_the_middle_of_the_query() {
        assert_eq!(join_url("https://a.test/p?q=1&x=0", "q=1"), "https://a.test/p?q=1&x=0&q=1");
    }

    #[test]
    fn join_keeps_fragment_last() {
        assert_eq!(join_url("https://a.test/p#top", "q=1"), "https://a.test/p?q=1#top");
    }
}
