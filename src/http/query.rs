//! Query-string helpers for the environment selector.

use axum::http::uri::{PathAndQuery, Uri};
use url::form_urlencoded;

/// Query parameter carrying the environment selector across services.
pub const ENVIRONMENT_PARAM: &str = "environment";

/// First value of query parameter `name`, percent-decoded.
pub fn first_query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Append `name=value` to the query, keeping existing parameters.
pub fn append_query_param(uri: &Uri, name: &str, value: &str) -> Result<Uri, axum::http::Error> {
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(name, value)
        .finish();
    let query = match uri.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{pair}"),
        _ => pair,
    };
    with_query(uri, &query)
}

/// Replace every occurrence of `name` with a single `name=value`.
///
/// The parameter is appended when missing.
pub fn replace_query_param(uri: &Uri, name: &str, value: &str) -> Result<Uri, axum::http::Error> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut replaced = false;
    if let Some(query) = uri.query() {
        for (key, existing) in form_urlencoded::parse(query.as_bytes()) {
            if key != name {
                serializer.append_pair(&key, &existing);
            } else if !replaced {
                serializer.append_pair(name, value);
                replaced = true;
            }
        }
    }
    if !replaced {
        serializer.append_pair(name, value);
    }
    with_query(uri, &serializer.finish())
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, axum::http::Error> {
    let path = match uri.path() {
        "" => "/",
        path => path,
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(format!("{path}?{query}"))?);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_query_param() {
        let uri: Uri = "/config?page=1&environment=S115&environment=S116".parse().unwrap();
        assert_eq!(first_query_param(&uri, "environment").as_deref(), Some("S115"));
        assert_eq!(first_query_param(&uri, "missing"), None);

        let uri: Uri = "/config".parse().unwrap();
        assert_eq!(first_query_param(&uri, "environment"), None);

        let uri: Uri = "/config?environment=a%20b".parse().unwrap();
        assert_eq!(first_query_param(&uri, "environment").as_deref(), Some("a b"));
    }

    #[test]
    fn test_append_query_param() {
        let uri: Uri = "http://svc.internal/items?page=2".parse().unwrap();
        let uri = append_query_param(&uri, "environment", "S116").unwrap();
        assert_eq!(uri.to_string(), "http://svc.internal/items?page=2&environment=S116");

        let uri: Uri = "http://svc.internal".parse().unwrap();
        let uri = append_query_param(&uri, "environment", "S116").unwrap();
        assert_eq!(uri.to_string(), "http://svc.internal/?environment=S116");
    }

    #[test]
    fn test_replace_query_param() {
        let uri: Uri = "/config?environment=prod&x=1&environment=pr01".parse().unwrap();
        let uri = replace_query_param(&uri, "environment", "P2").unwrap();
        assert_eq!(uri.to_string(), "/config?environment=P2&x=1");

        let uri: Uri = "/config?x=1".parse().unwrap();
        let uri = replace_query_param(&uri, "environment", "P2").unwrap();
        assert_eq!(uri.to_string(), "/config?x=1&environment=P2");
    }
}
