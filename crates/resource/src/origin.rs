//! Same-origin classification of resource URLs.

use exn::ResultExt;
use tracing::instrument;
use url::{Origin as UrlOrigin, ParseError, Url};

use crate::error::{ErrorKind, Result};

const SCHEMES: [&str; 2] = ["http", "https"];

/// The site's own origin (scheme, host and port).
///
/// Resources are "local" when they are served from exactly this origin.
///
/// # Examples
///
/// ```
/// use sri_resource::Origin;
///
/// let site = Origin::parse("https://example.org/blog/").unwrap();
/// assert!(site.is_local_resource("https://example.org/wp-includes/js/jquery.js"));
/// assert!(site.is_local_resource("//example.org/style.css"));
/// assert!(site.is_local_resource("/wp-content/themes/theme/app.js"));
/// assert!(!site.is_local_resource("https://cdn.datatables.net/1.10.7/js/jquery.dataTables.min.js"));
/// assert!(!site.is_local_resource("http://example.org/insecure.js"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    base: Url,
    origin: UrlOrigin,
}
impl Origin {
    /// Parse the site URL.
    ///
    /// Only absolute `http://` and `https://` URLs with a host are accepted.
    pub fn parse(site_url: impl AsRef<str>) -> Result<Self> {
        let site_url = site_url.as_ref().trim();
        let base = Url::parse(site_url).or_raise(|| ErrorKind::InvalidSiteUrl(site_url.to_string()))?;
        if !SCHEMES.contains(&base.scheme()) || base.host_str().is_none() {
            exn::bail!(ErrorKind::InvalidSiteUrl(site_url.to_string()));
        }
        let origin = base.origin();
        Ok(Self { base, origin })
    }

    /// The site URL this origin was parsed from.
    pub fn site_url(&self) -> &Url {
        &self.base
    }

    /// Serialized origin, e.g. `https://example.org` (default ports omitted).
    pub fn ascii(&self) -> String {
        self.origin.ascii_serialization()
    }

    /// Resolve a resource URL as it appears in markup into an absolute URL.
    ///
    /// Scheme-relative URLs (`//cdn.example/x.js`) take the site's scheme,
    /// and path-relative URLs are joined onto the site URL. Returns `None`
    /// for malformed URLs and anything that isn't http(s) (`data:`,
    /// `javascript:`, ...).
    pub fn resolve(&self, url: &str) -> Option<Url> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        let resolved = match Url::parse(url) {
            Ok(resolved) => resolved,
            // Covers both `//host/path` and `/path`; `join` gives the former
            // the base's scheme and the latter the base's origin.
            Err(ParseError::RelativeUrlWithoutBase) => self.base.join(url).ok()?,
            Err(_) => return None,
        };
        match SCHEMES.contains(&resolved.scheme()) && resolved.host_str().is_some() {
            true => Some(resolved),
            false => None,
        }
    }

    /// Returns `true` if the URL is served from the site's own origin.
    ///
    /// Fails closed: malformed URLs are never local.
    #[instrument(level = "trace", skip(self), fields(site = %self.ascii()))]
    pub fn is_local_resource(&self, url: &str) -> bool {
        self.resolve(url).is_some_and(|resolved| resolved.origin() == self.origin)
    }
}
