//! One function per subcommand. Each returns what should be printed.

use exn::{OptionExt, ResultExt};
use sri_admin::{Action, ActionRequest, NONCE_ACTION, Outcome, Processor};
use sri_nonce::Session;
use sri_resource::{Integrity, hash_resource};
use sri_rewrite::{FetcherHandle, Rewriter};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use url::Url;

use crate::cli::{ExcludedCommands, KnownCommands, SessionArgs};
use crate::context::Context;
use crate::error::{ErrorKind, Result};

/// Read a file, or stdin for `None` and `-`.
pub async fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) if path != Path::new("-") => {
            tokio::fs::read(path).await.or_raise(|| ErrorKind::Input(path.display().to_string()))
        },
        _ => {
            let mut buffer = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buffer)
                .await
                .or_raise(|| ErrorKind::Input("stdin".to_string()))?;
            Ok(buffer)
        },
    }
}

pub fn hash(content: &[u8], integrity: bool) -> String {
    if integrity { Integrity::of(content).to_string() } else { hash_resource(content) }
}

pub fn is_local(ctx: &Context, url: &str) -> Result<String> {
    let local = ctx.origin()?.is_local_resource(url);
    Ok(if local { "local" } else { "remote" }.to_string())
}

pub async fn known(ctx: &Context, command: KnownCommands) -> Result<String> {
    let known = ctx.known();
    match command {
        KnownCommands::List => {
            let hashes = known.all().await.or_raise(|| ErrorKind::Cache)?;
            Ok(hashes.iter().map(|(url, digest)| format!("{digest}  {url}")).collect::<Vec<_>>().join("\n"))
        },
        KnownCommands::Get { url } => {
            known.get(&url).await.or_raise(|| ErrorKind::Cache)?.ok_or_raise(|| ErrorKind::NotFound(url.clone()))
        },
        KnownCommands::Set { url, digest } => {
            let digest = digest.trim();
            let digest = digest.strip_prefix("sha256-").unwrap_or(digest);
            let integrity = format!("sha256-{digest}")
                .parse::<Integrity>()
                .or_raise(|| ErrorKind::InvalidArgument(format!("not a base64 SHA-256 digest: {digest}")))?;
            known.put(&url, &integrity.digest).await.or_raise(|| ErrorKind::Cache)?;
            Ok(String::new())
        },
        KnownCommands::Delete { url } => {
            if !known.delete(&url).await.or_raise(|| ErrorKind::Cache)? {
                tracing::info!(url, "No digest was recorded");
            }
            Ok(String::new())
        },
        KnownCommands::Clear => {
            let cleared = known.clear().await.or_raise(|| ErrorKind::Cache)?;
            Ok(format!("cleared {cleared} digest(s)"))
        },
    }
}

pub async fn excluded(ctx: &Context, command: ExcludedCommands) -> Result<String> {
    let excluded = ctx.excluded();
    match command {
        ExcludedCommands::List => Ok(excluded.all().await.or_raise(|| ErrorKind::Cache)?.join("\n")),
        ExcludedCommands::Add { url } => {
            let changed = excluded.add(&url).await.or_raise(|| ErrorKind::Cache)?;
            Ok(describe(&Outcome::Excluded { url, changed }))
        },
        ExcludedCommands::Remove { url } => {
            let changed = excluded.remove(&url).await.or_raise(|| ErrorKind::Cache)?;
            Ok(describe(&Outcome::Included { url, changed }))
        },
    }
}

/// Issue a token, or a complete admin link when `link` is given.
pub fn nonce(ctx: &Context, session: &SessionArgs, link: Option<&str>, action: &str, url: Option<&str>) -> Result<String> {
    let session = Session::new(session.user, session.session.as_str());
    let token = ctx.nonces()?.create(NONCE_ACTION, &session);
    let Some(link) = link else {
        return Ok(token);
    };
    let base = Url::parse(link).or_raise(|| ErrorKind::InvalidArgument(format!("not a URL: {link}")))?;
    let action =
        action.parse::<Action>().or_raise(|| ErrorKind::InvalidArgument(format!("unknown action: {action}")))?;
    let url = url.ok_or_raise(|| ErrorKind::InvalidArgument("--url is required with --link".to_string()))?;
    Ok(ActionRequest::link(&base, action, url, &token, &ctx.prefix).to_string())
}

pub async fn action(ctx: &Context, query: &str, session: &SessionArgs, silent: bool) -> Result<String> {
    let session = Session::new(session.user, session.session.as_str());
    let request = ActionRequest::from_query(query, &ctx.prefix);
    let processor = Processor::new(ctx.excluded(), Arc::new(ctx.nonces()?));
    let outcome = if silent {
        processor.process_silently(&request, &session).await
    } else {
        processor.process(&request, &session).await
    };
    Ok(describe(&outcome.or_raise(|| ErrorKind::Action)?))
}

pub async fn rewrite(ctx: &Context, html: &str, fetcher: FetcherHandle) -> Result<String> {
    let rewriter = Rewriter::new(ctx.origin()?, ctx.known(), ctx.excluded(), fetcher);
    Ok(rewriter.rewrite(html).await)
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Excluded { url, changed: true } => format!("excluded {url}"),
        Outcome::Excluded { url, changed: false } => format!("{url} was already excluded"),
        Outcome::Included { url, changed: true } => format!("included {url}"),
        Outcome::Included { url, changed: false } => format!("{url} was not excluded"),
        Outcome::Ignored => "ignored: not an action request".to_string(),
        Outcome::Rejected => "rejected: invalid, expired or reused token".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use sri_config::{Config, NonceConfig};
    use sri_rewrite::MockFetcher;
    use sri_storage::StoreHandle;
    use sri_storage::backend::MockBackend;
    use tempfile::TempDir;

    const CDN: &str = "https://cdn.example.com/lib.js";

    #[fixture]
    fn ctx() -> Context {
        let config = Config {
            site_url: Some("https://example.org".to_string()),
            nonce: NonceConfig { secret: Some("secret".to_string()), ..NonceConfig::default() },
            ..Config::default()
        };
        let store: StoreHandle = Arc::new(MockBackend::default());
        Context::with_store(config, store).unwrap()
    }

    fn session() -> SessionArgs {
        SessionArgs { user: 1, session: "session".to_string() }
    }

    #[test]
    fn test_hash() {
        let content = br#"alert("Hello, world!");"#;
        assert_eq!(hash(content, false), "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=");
        assert_eq!(hash(content, true), "sha256-niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=");
    }

    #[tokio::test]
    async fn test_read_input_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();
        assert_eq!(read_input(Some(path.as_path())).await.unwrap(), b"<p>hi</p>");
        let err = read_input(Some(dir.path().join("missing.html").as_path())).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Input(_)));
    }

    #[rstest]
    #[case("https://example.org/wp-content/app.js", "local")]
    #[case("/wp-content/app.js", "local")]
    #[case(CDN, "remote")]
    fn test_is_local(ctx: Context, #[case] url: &str, #[case] expected: &str) {
        assert_eq!(is_local(&ctx, url).unwrap(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn test_known(ctx: Context) {
        let digest = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
        let set = KnownCommands::Set { url: CDN.to_string(), digest: format!("sha256-{digest}") };
        known(&ctx, set).await.unwrap();
        assert_eq!(known(&ctx, KnownCommands::Get { url: CDN.to_string() }).await.unwrap(), digest);
        assert_eq!(known(&ctx, KnownCommands::List).await.unwrap(), format!("{digest}  {CDN}"));
        known(&ctx, KnownCommands::Delete { url: CDN.to_string() }).await.unwrap();
        let err = known(&ctx, KnownCommands::Get { url: CDN.to_string() }).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(CDN.to_string()));
        assert_eq!(known(&ctx, KnownCommands::Clear).await.unwrap(), "cleared 0 digest(s)");
    }

    #[rstest]
    #[case("47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=")]
    #[case(" sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=\n")]
    #[tokio::test]
    async fn test_known_set_digest_forms(ctx: Context, #[case] digest: &str) {
        let set = KnownCommands::Set { url: CDN.to_string(), digest: digest.to_string() };
        known(&ctx, set).await.unwrap();
        let stored = known(&ctx, KnownCommands::Get { url: CDN.to_string() }).await.unwrap();
        assert_eq!(stored, "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[rstest]
    #[case("abc")]
    #[case("sha384-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=")]
    #[tokio::test]
    async fn test_known_set_rejects_bad_digest(ctx: Context, #[case] digest: &str) {
        let set = KnownCommands::Set { url: CDN.to_string(), digest: digest.to_string() };
        let err = known(&ctx, set).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_excluded(ctx: Context) {
        let add = || ExcludedCommands::Add { url: CDN.to_string() };
        assert_eq!(excluded(&ctx, add()).await.unwrap(), format!("excluded {CDN}"));
        assert_eq!(excluded(&ctx, add()).await.unwrap(), format!("{CDN} was already excluded"));
        assert_eq!(excluded(&ctx, ExcludedCommands::List).await.unwrap(), CDN);
        let remove = ExcludedCommands::Remove { url: CDN.to_string() };
        assert_eq!(excluded(&ctx, remove).await.unwrap(), format!("included {CDN}"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_nonce_then_action(ctx: Context) {
        let token = nonce(&ctx, &session(), None, "exclude", None).unwrap();
        let query = format!("action=exclude&url={}&_wpsri_nonce={token}", "https%3A%2F%2Fcdn.example.com%2Flib.js");
        assert_eq!(action(&ctx, &query, &session(), false).await.unwrap(), format!("excluded {CDN}"));

        let err = action(&ctx, &query, &session(), false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Action);
        assert_eq!(action(&ctx, &query, &session(), true).await.unwrap(), "rejected: invalid, expired or reused token");
        assert_eq!(action(&ctx, "page=sri", &session(), false).await.unwrap(), "ignored: not an action request");
    }

    #[rstest]
    fn test_nonce_link(ctx: Context) {
        let link = nonce(&ctx, &session(), Some("https://example.org/wp-admin/tools.php?page=sri"), "include", Some(CDN))
            .unwrap();
        assert!(link.starts_with("https://example.org/wp-admin/tools.php?page=sri&action=include&url="));
        assert!(link.contains("&_wpsri_nonce="));
        let err = nonce(&ctx, &session(), Some("https://example.org/"), "delete", Some(CDN)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
    }

    #[rstest]
    fn test_nonce_without_secret() {
        let config = Config { site_url: Some("https://example.org".to_string()), ..Config::default() };
        let ctx = Context::with_store(config, Arc::new(MockBackend::default())).unwrap();
        let err = nonce(&ctx, &session(), None, "exclude", None).unwrap_err();
        assert_eq!(*err, ErrorKind::Config);
    }

    #[rstest]
    #[tokio::test]
    async fn test_rewrite(ctx: Context) {
        let fetcher = Arc::new(MockFetcher::with_bodies([(CDN, r#"alert("Hello, world!");"#)]));
        let html = format!(r#"<script src="{CDN}"></script>"#);
        let rewritten = rewrite(&ctx, &html, fetcher).await.unwrap();
        assert_eq!(
            rewritten,
            format!(
                r#"<script src="{CDN}" crossorigin="anonymous" integrity="sha256-niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8="></script>"#
            )
        );
    }
}
