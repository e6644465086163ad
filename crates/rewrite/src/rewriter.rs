use exn::{OptionExt, ResultExt};
use sri_cache::{ExcludedUrls, KnownHashes};
use sri_resource::{Integrity, Origin, hash_resource};
use tracing::instrument;

use crate::consts::{
    CROSSORIGIN_ATTR_REGEX, HREF_ATTR_REGEX, INTEGRITY_ATTR_REGEX, REL_ATTR_REGEX, SRC_ATTR_REGEX, TAG_REGEX,
    attribute,
};
use crate::error::{ErrorKind, Result};
use crate::fetch::FetcherHandle;

/// Adds integrity attributes to script and stylesheet tags.
pub struct Rewriter {
    origin: Origin,
    known: KnownHashes,
    excluded: ExcludedUrls,
    fetcher: FetcherHandle,
}
impl Rewriter {
    /// `origin` is used to resolve relative and protocol-relative URLs.
    pub fn new(origin: Origin, known: KnownHashes, excluded: ExcludedUrls, fetcher: FetcherHandle) -> Self {
        Self { origin, known, excluded, fetcher }
    }

    /// Rewrite every external script and stylesheet tag in `html`. All other
    /// markup is copied through untouched.
    #[instrument(skip_all, fields(bytes = html.len()))]
    pub async fn rewrite(&self, html: &str) -> String {
        let mut output = String::with_capacity(html.len());
        let mut last = 0;
        for tag in TAG_REGEX.find_iter(html) {
            output.push_str(&html[last..tag.start()]);
            match subresource_url(tag.as_str()) {
                Some(url) => output.push_str(&self.filter_tag(tag.as_str(), &url).await),
                None => output.push_str(tag.as_str()),
            }
            last = tag.end();
        }
        output.push_str(&html[last..]);
        output
    }

    /// Add `crossorigin` and `integrity` attributes to a single tag that
    /// loads `url`.
    ///
    /// The tag comes back unchanged if the URL is excluded, if the tag
    /// already declares an integrity value, or if the resource can't be
    /// hashed. Failures are logged, never returned.
    pub async fn filter_tag(&self, tag: &str, url: &str) -> String {
        if INTEGRITY_ATTR_REGEX.is_match(tag) {
            tracing::trace!(url, "Tag already has an integrity attribute");
            return tag.to_string();
        }
        match self.integrity(url).await {
            Ok(Some(integrity)) => with_integrity(tag, &integrity),
            Ok(None) => tag.to_string(),
            Err(err) => {
                tracing::warn!(url, error = %err, "Leaving tag without integrity attribute");
                tag.to_string()
            },
        }
    }

    /// The integrity value for `url`, or `None` if it is excluded.
    ///
    /// URLs are compared in their resolved, absolute form, so an exclusion
    /// or cached digest recorded for `https://cdn.example.com/a.js` also
    /// applies to `//cdn.example.com/a.js` (and the other way round). Local
    /// and remote resources are treated the same; locality is only logged.
    #[instrument(level = "debug", skip(self), fields(local = self.origin.is_local_resource(url)))]
    async fn integrity(&self, url: &str) -> Result<Option<Integrity>> {
        let url = url.trim();
        let excluded = self.excluded.all().await.or_raise(|| ErrorKind::Cache)?;
        if excluded.iter().any(|entry| entry == url) {
            tracing::debug!("URL is excluded");
            return Ok(None);
        }
        let resolved = self.origin.resolve(url).ok_or_raise(|| ErrorKind::Unresolvable(url.to_string()))?;
        if excluded.iter().any(|entry| self.origin.resolve(entry).is_some_and(|entry| entry == resolved)) {
            tracing::debug!(%resolved, "URL is excluded");
            return Ok(None);
        }

        let key = resolved.as_str();
        let known = self.known.all().await.or_raise(|| ErrorKind::Cache)?;
        if let Some(digest) = known.get(key).or_else(|| known.get(url)) {
            match format!("sha256-{digest}").parse::<Integrity>() {
                Ok(integrity) => return Ok(Some(integrity)),
                Err(err) => tracing::warn!(error = %err, "Cached digest is corrupt, hashing again"),
            }
        }

        let body = self.fetcher.fetch(&resolved).await?;
        let digest = hash_resource(&body);
        self.known.put(key, &digest).await.or_raise(|| ErrorKind::Cache)?;
        Ok(Some(Integrity::sha256(digest)))
    }
}

/// The URL a `<script>` or stylesheet `<link>` tag loads, with the entities
/// WordPress uses in attribute values decoded.
fn subresource_url(tag: &str) -> Option<String> {
    let is_script = tag.get(1..7).is_some_and(|name| name.eq_ignore_ascii_case("script"));
    let url = if is_script {
        attribute(&SRC_ATTR_REGEX, tag)?
    } else {
        let rel = attribute(&REL_ATTR_REGEX, tag)?;
        if !rel.split_ascii_whitespace().any(|token| token.eq_ignore_ascii_case("stylesheet")) {
            return None;
        }
        attribute(&HREF_ATTR_REGEX, tag)?
    };
    let url = url.trim().replace("&#038;", "&").replace("&#38;", "&").replace("&amp;", "&");
    (!url.is_empty()).then_some(url)
}

/// Insert the attributes before the tag's closing `>` (or `/>`).
fn with_integrity(tag: &str, integrity: &Integrity) -> String {
    let trimmed = tag.trim_end();
    let Some(head) = trimmed.strip_suffix('>') else {
        return tag.to_string();
    };
    let (head, close) = match head.strip_suffix('/') {
        Some(head) => (head, "/>"),
        None => (head, ">"),
    };
    let attributes = head.trim_end();
    let gap = &head[attributes.len()..];
    let crossorigin = if CROSSORIGIN_ATTR_REGEX.is_match(tag) { "" } else { r#" crossorigin="anonymous""# };
    format!(r#"{attributes}{crossorigin} integrity="{integrity}"{gap}{close}{}"#, &tag[trimmed.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockFetcher;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use sri_cache::Prefix;
    use sri_storage::StoreHandle;
    use sri_storage::backend::MockBackend;
    use std::sync::Arc;

    const SITE: &str = "https://example.org";
    const HELLO: &str = r#"alert("Hello, world!");"#;
    const HELLO_INTEGRITY: &str = "sha256-niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=";
    const CSS_INTEGRITY: &str = "sha256-FcQqt3aNlV7AZnGV4zkQRVeCeJOxbMPnQSx258L803E=";
    const FONTS: &str = "https://fonts.googleapis.com/css?family=Lato%3A300%2C400%2C700&ver=1.0.0";

    struct Fixture {
        store: StoreHandle,
        fetcher: Arc<MockFetcher>,
        rewriter: Rewriter,
    }
    impl Fixture {
        async fn known(&self) -> serde_json::Value {
            self.store.get("wpsri_known_hashes").await.unwrap().unwrap_or(json!({}))
        }
    }

    #[fixture]
    fn fx() -> Fixture {
        let store: StoreHandle =
            Arc::new(MockBackend::with_options([("wpsri_excluded_hashes", json!([FONTS]))]));
        let fetcher = Arc::new(MockFetcher::with_bodies([
            ("https://cdn.example.com/hello.js", HELLO),
            ("https://example.org/wp-content/style.css", "body{color:red}"),
            (FONTS, "@font-face{}"),
        ]));
        let prefix = Prefix::default();
        let rewriter = Rewriter::new(
            Origin::parse(SITE).unwrap(),
            KnownHashes::new(store.clone(), &prefix),
            ExcludedUrls::new(store.clone(), &prefix),
            fetcher.clone(),
        );
        Fixture { store, fetcher, rewriter }
    }

    #[rstest]
    #[tokio::test]
    async fn test_filter_script_tag(fx: Fixture) {
        let url = "https://cdn.example.com/hello.js";
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{url}">"#), url).await;
        assert_eq!(tag, format!(r#"<script src="{url}" crossorigin="anonymous" integrity="{HELLO_INTEGRITY}">"#));
        assert_eq!(fx.known().await, json!({url: "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8="}));
    }

    #[rstest]
    #[case("<link rel='stylesheet' href='/wp-content/style.css' />")]
    #[case("<link rel='stylesheet' href='/wp-content/style.css'/>")]
    #[tokio::test]
    async fn test_filter_self_closing_link_tag(fx: Fixture, #[case] tag: &str) {
        let filtered = fx.rewriter.filter_tag(tag, "/wp-content/style.css").await;
        let expected_tail = if tag.ends_with(" />") { " />" } else { "/>" };
        assert_eq!(
            filtered,
            format!(
                r#"<link rel='stylesheet' href='/wp-content/style.css' crossorigin="anonymous" integrity="{CSS_INTEGRITY}"{expected_tail}"#
            )
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_cached_digest_is_used(fx: Fixture) {
        let url = "https://cdn.example.org/cached.js";
        fx.store
            .set("wpsri_known_hashes", &json!({url: "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="}))
            .await
            .unwrap();
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{url}">"#), url).await;
        assert!(tag.contains(r#"integrity="sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=""#));
        assert_eq!(fx.fetcher.requests(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_corrupt_cached_digest_is_replaced(fx: Fixture) {
        let url = "https://cdn.example.com/hello.js";
        fx.store.set("wpsri_known_hashes", &json!({url: "not base64!"})).await.unwrap();
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{url}">"#), url).await;
        assert!(tag.contains(HELLO_INTEGRITY));
        assert_eq!(fx.fetcher.requests(), 1);
        assert_eq!(fx.known().await, json!({url: "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8="}));
    }

    #[rstest]
    #[case(FONTS, "<link rel='stylesheet' href='https://fonts.googleapis.com/css?family=Lato%3A300%2C400%2C700&ver=1.0.0'>")]
    #[case("https://cdn.example.com/hello.js", r#"<script integrity="sha384-abc" src="https://cdn.example.com/hello.js">"#)]
    #[case("https://cdn.example.com/missing.js", r#"<script src="https://cdn.example.com/missing.js">"#)]
    #[case("mailto:someone@example.org", r#"<script src="mailto:someone@example.org">"#)]
    #[tokio::test]
    async fn test_tag_left_unchanged(fx: Fixture, #[case] url: &str, #[case] tag: &str) {
        assert_eq!(fx.rewriter.filter_tag(tag, url).await, tag);
        assert_eq!(fx.known().await, json!({}));
    }

    #[rstest]
    #[case("https://cdn.example.com/hello.js", "//cdn.example.com/hello.js")]
    #[case("//cdn.example.com/hello.js", "https://cdn.example.com/hello.js")]
    #[case("/wp-content/style.css", "https://example.org/wp-content/style.css")]
    #[case("https://example.org/wp-content/style.css", "/wp-content/style.css")]
    #[tokio::test]
    async fn test_exclusion_matches_any_url_form(fx: Fixture, #[case] excluded: &str, #[case] url: &str) {
        fx.store.set("wpsri_excluded_hashes", &json!([excluded])).await.unwrap();
        let tag = format!(r#"<script src="{url}">"#);
        assert_eq!(fx.rewriter.filter_tag(&tag, url).await, tag);
        assert_eq!(fx.fetcher.requests(), 0);
        assert_eq!(fx.known().await, json!({}));
    }

    #[rstest]
    #[tokio::test]
    async fn test_url_forms_share_cached_digest(fx: Fixture) {
        let relative = "//cdn.example.com/hello.js";
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{relative}">"#), relative).await;
        assert!(tag.contains(HELLO_INTEGRITY));
        let absolute = "https://cdn.example.com/hello.js";
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{absolute}">"#), absolute).await;
        assert!(tag.contains(HELLO_INTEGRITY));
        assert_eq!(fx.fetcher.requests(), 1);
        assert_eq!(fx.known().await, json!({absolute: "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8="}));
    }

    #[rstest]
    #[tokio::test]
    async fn test_digest_cached_under_written_form(fx: Fixture) {
        let url = "/wp-content/theme.js";
        fx.store
            .set("wpsri_known_hashes", &json!({url: "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="}))
            .await
            .unwrap();
        let tag = fx.rewriter.filter_tag(&format!(r#"<script src="{url}">"#), url).await;
        assert!(tag.contains(r#"integrity="sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=""#));
        assert_eq!(fx.fetcher.requests(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_existing_crossorigin_is_kept(fx: Fixture) {
        let url = "https://cdn.example.com/hello.js";
        let tag = fx.rewriter.filter_tag(&format!(r#"<script crossorigin="use-credentials" src="{url}">"#), url).await;
        assert_eq!(
            tag,
            format!(r#"<script crossorigin="use-credentials" src="{url}" integrity="{HELLO_INTEGRITY}">"#)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_rewrite_document(fx: Fixture) {
        let html = concat!(
            "<!DOCTYPE html>\n<html><head>\n",
            "<link rel='stylesheet' id='theme-css' href='https://example.org/wp-content/style.css?' media='all' />\n",
            "<link rel='icon' href='/favicon.ico'>\n",
            "<link rel='stylesheet' href='https://fonts.googleapis.com/css?family=Lato%3A300%2C400%2C700&#038;ver=1.0.0'>\n",
            "<script>var inline = true;</script>\n",
            "<SCRIPT type=\"text/javascript\" src=\"https://cdn.example.com/hello.js\"></SCRIPT>\n",
            "</head><body><p>Hello</p></body></html>\n",
        );
        let rewritten = fx.rewriter.rewrite(html).await;
        let expected = format!(
            concat!(
                "<!DOCTYPE html>\n<html><head>\n",
                "<link rel='stylesheet' id='theme-css' href='https://example.org/wp-content/style.css?' media='all' />\n",
                "<link rel='icon' href='/favicon.ico'>\n",
                "<link rel='stylesheet' href='https://fonts.googleapis.com/css?family=Lato%3A300%2C400%2C700&#038;ver=1.0.0'>\n",
                "<script>var inline = true;</script>\n",
                "<SCRIPT type=\"text/javascript\" src=\"https://cdn.example.com/hello.js\" crossorigin=\"anonymous\" integrity=\"{}\"></SCRIPT>\n",
                "</head><body><p>Hello</p></body></html>\n",
            ),
            HELLO_INTEGRITY,
        );
        // The stylesheet URL has a query string the fetcher doesn't know, so
        // it's left alone; the fonts URL is excluded once its entity is
        // decoded.
        assert_eq!(rewritten, expected);
        assert_eq!(fx.fetcher.requests(), 2);
    }

    #[rstest]
    #[case(r#"<script src="https://cdn.example.com/a.js">"#, Some("https://cdn.example.com/a.js"))]
    #[case(r#"<script data-src="https://cdn.example.com/a.js">"#, None)]
    #[case("<script src=/wp-includes/js/jquery.js defer>", Some("/wp-includes/js/jquery.js"))]
    #[case(r#"<link rel="preload stylesheet" href="/a.css">"#, Some("/a.css"))]
    #[case(r#"<link rel="alternate" href="/feed/">"#, None)]
    #[case(r#"<link href="/a.css">"#, None)]
    #[case(r#"<link rel="stylesheet" href="/a.css?x=1&amp;y=2">"#, Some("/a.css?x=1&y=2"))]
    #[case(r#"<script src="  ">"#, None)]
    fn test_subresource_url(#[case] tag: &str, #[case] expected: Option<&str>) {
        assert_eq!(subresource_url(tag).as_deref(), expected);
    }
}
