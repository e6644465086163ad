use exn::ResultExt;
use sri_cache::{ExcludedUrls, canonical_url};
use sri_nonce::{Session, ValidatorHandle};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{Action, ActionRequest, NONCE_ACTION};

/// What processing a request did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The URL is now excluded. `changed` is `false` if it already was.
    Excluded { url: String, changed: bool },
    /// The URL is no longer excluded. `changed` is `false` if it wasn't.
    Included { url: String, changed: bool },
    /// Not an action request (unknown or missing action, or no usable URL).
    Ignored,
    /// The token didn't verify; nothing was changed. Only returned by
    /// [`Processor::process_silently`].
    Rejected,
}

/// Applies admin requests to the exclusion list.
pub struct Processor {
    excluded: ExcludedUrls,
    validator: ValidatorHandle,
}
impl Processor {
    pub fn new(excluded: ExcludedUrls, validator: ValidatorHandle) -> Self {
        Self { excluded, validator }
    }

    /// Process one request on behalf of `session`.
    ///
    /// Requests that aren't actions, or whose URL could never be stored, are
    /// [`Outcome::Ignored`] without looking at the token. For `exclude`/`include`, the token is verified (and
    /// consumed) first; a missing or invalid token is
    /// [`Unauthorized`](ErrorKind::Unauthorized) and the list is untouched.
    #[instrument(skip(self, request, session), fields(action = request.action.as_deref(), user_id = session.user_id))]
    pub async fn process(&self, request: &ActionRequest, session: &Session) -> Result<Outcome> {
        let Some(action) = request.action.as_deref().and_then(|action| action.parse::<Action>().ok()) else {
            tracing::trace!("Not an action request");
            return Ok(Outcome::Ignored);
        };
        let Some(url) = request.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) else {
            tracing::debug!("Action request without a URL");
            return Ok(Outcome::Ignored);
        };
        let url = match canonical_url(url) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(error = %err, "Action request with an unusable URL");
                return Ok(Outcome::Ignored);
            },
        };

        let token = request.nonce.as_deref().unwrap_or_default();
        let verdict = self.validator.verify(NONCE_ACTION, session, token).await.or_raise(|| ErrorKind::Validator)?;
        if !verdict.is_valid() {
            exn::bail!(ErrorKind::Unauthorized(action.to_string()));
        }

        match action {
            Action::Exclude => {
                let changed = self.excluded.add(&url).await.or_raise(|| ErrorKind::Cache)?;
                Ok(Outcome::Excluded { url, changed })
            },
            Action::Include => {
                let changed = self.excluded.remove(&url).await.or_raise(|| ErrorKind::Cache)?;
                Ok(Outcome::Included { url, changed })
            },
        }
    }

    /// Like [`process()`](Self::process), but authorization failures are
    /// logged and reported as [`Outcome::Rejected`] instead of raised. Use
    /// this where the request comes straight from a browser.
    pub async fn process_silently(&self, request: &ActionRequest, session: &Session) -> Result<Outcome> {
        match self.process(request, session).await {
            Err(err) if matches!(&*err, ErrorKind::Unauthorized(_)) => {
                tracing::warn!(user_id = session.user_id, error = %err, "Rejected admin action");
                Ok(Outcome::Rejected)
            },
            other => other,
        }
    }
}
