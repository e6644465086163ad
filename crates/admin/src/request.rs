use sri_cache::Prefix;
use url::Url;
use url::form_urlencoded;

use crate::Action;

/// Query parameter carrying the verification token, e.g. `_wpsri_nonce`.
pub fn nonce_param(prefix: &Prefix) -> String {
    format!("_{}nonce", prefix)
}

/// The parameters of one admin request, as received.
///
/// Nothing is validated here: unknown actions and missing values are the
/// processor's business.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Option<String>,
    pub url: Option<String>,
    pub nonce: Option<String>,
}
impl ActionRequest {
    pub fn new(action: impl Into<String>, url: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            url: Some(url.into()),
            nonce: Some(nonce.into()),
        }
    }

    /// Read `action`, `url` and the prefixed nonce parameter from a query
    /// string (with or without the leading `?`). Values are percent-decoded;
    /// when a parameter repeats, the last occurrence wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use sri_admin::ActionRequest;
    /// use sri_cache::Prefix;
    ///
    /// let request = ActionRequest::from_query(
    ///     "?action=exclude&url=https%3A%2F%2Fcdn.example.com%2Flib.js&_wpsri_nonce=abc",
    ///     &Prefix::default(),
    /// );
    /// assert_eq!(request.action.as_deref(), Some("exclude"));
    /// assert_eq!(request.url.as_deref(), Some("https://cdn.example.com/lib.js"));
    /// assert_eq!(request.nonce.as_deref(), Some("abc"));
    /// ```
    pub fn from_query(query: &str, prefix: &Prefix) -> Self {
        let nonce_param = nonce_param(prefix);
        let mut request = Self::default();
        for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match name.as_ref() {
                "action" => request.action = Some(value.into_owned()),
                "url" => request.url = Some(value.into_owned()),
                n if n == nonce_param => request.nonce = Some(value.into_owned()),
                _ => {},
            }
        }
        request
    }

    /// Build the admin link that performs `action` on `url`.
    pub fn link(base: &Url, action: Action, url: &str, nonce: &str, prefix: &Prefix) -> Url {
        let mut link = base.clone();
        link.query_pairs_mut()
            .append_pair("action", action.as_str())
            .append_pair("url", url)
            .append_pair(&nonce_param(prefix), nonce);
        link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_param() {
        assert_eq!(nonce_param(&Prefix::default()), "_wpsri_nonce");
        assert_eq!(nonce_param(&Prefix::new("site2_").unwrap()), "_site2_nonce");
    }

    #[test]
    fn test_from_query_missing_values() {
        let request = ActionRequest::from_query("page=sri&action=include", &Prefix::default());
        assert_eq!(request.action.as_deref(), Some("include"));
        assert_eq!(request.url, None);
        assert_eq!(request.nonce, None);
    }

    #[test]
    fn test_from_query_other_prefix() {
        let request = ActionRequest::from_query("_wpsri_nonce=wrong&_site2_nonce=right", &Prefix::new("site2_").unwrap());
        assert_eq!(request.nonce.as_deref(), Some("right"));
    }

    #[test]
    fn test_link_round_trip() {
        let base = Url::parse("https://example.org/wp-admin/tools.php?page=sri").unwrap();
        let target = "https://fonts.googleapis.com/css?family=Lato%3A300%2C400%2C700&ver=1.0.0";
        let link = ActionRequest::link(&base, Action::Exclude, target, "token", &Prefix::default());
        let request = ActionRequest::from_query(link.query().unwrap(), &Prefix::default());
        assert_eq!(request, ActionRequest::new("exclude", target, "token"));
    }
}
