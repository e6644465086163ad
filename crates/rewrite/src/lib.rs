//! Adds `integrity` attributes to rendered markup.
//!
//! [`Rewriter`] looks at every external `<script src>` and stylesheet
//! `<link href>` in a page, hashes the resource it points at (fetching it
//! through a [`Fetcher`] the first time, then from the known hash cache) and
//! adds `crossorigin` and `integrity` attributes to the tag. Anything that
//! goes wrong along the way leaves the tag exactly as it was.
//!
//! Resources on the site's own origin are fetched and hashed like any
//! other; whether a URL is local is recorded on the `integrity` span.

mod consts;
pub mod error;
mod fetch;
mod rewriter;

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
#[cfg(any(test, feature = "mock"))]
pub use fetch::MockFetcher;
pub use fetch::{Fetcher, FetcherHandle};
pub use rewriter::Rewriter;
