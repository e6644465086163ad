use async_trait::async_trait;
use exn::ResultExt;
use sri_cache::Prefix;
use sri_storage::StoreHandle;
use std::collections::BTreeMap;
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{Session, TokenValidator, Verdict};

/// One day, split into two twelve hour ticks.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

const KEY_CONTEXT: &str = "sri 2025-01-01 admin action nonce v1";
const CONSUMED_NONCES: &str = "consumed_nonces";
const SALT_LEN: usize = 16;

/// Token -> unix timestamp after which it can no longer verify.
type Consumed = BTreeMap<String, i64>;

/// Time-windowed, session-bound, single-use tokens.
///
/// A token is a random salt followed by the BLAKE3 keyed hash of
/// `(tick, action, user, session, salt)`, where a tick is half of the
/// configured lifetime. The salt means every token issued is distinct, so
/// one session can perform several actions within a tick. Tokens verify during
/// the tick they were issued in ([`Verdict::Fresh`]) and the one after
/// ([`Verdict::Aging`]), so a token lives between half and all of the
/// lifetime depending on when in the tick it was issued.
///
/// Tokens that verify are recorded in the `{prefix}consumed_nonces` option
/// until they would have expired anyway, which is what makes them single
/// use.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sri_cache::Prefix;
/// use sri_nonce::{Nonces, Session, TokenValidator, Verdict};
/// use sri_storage::backend::MockBackend;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let nonces = Nonces::new("correct horse battery staple", Arc::new(MockBackend::default()), &Prefix::default())?;
/// let session = Session::new(1, "login-session-token");
/// let token = nonces.create("update_sri_hash", &session);
/// assert_eq!(nonces.verify("update_sri_hash", &session, &token).await?, Verdict::Fresh);
/// // Single use.
/// assert_eq!(nonces.verify("update_sri_hash", &session, &token).await?, Verdict::Invalid);
/// # Ok(())
/// # }
/// ```
pub struct Nonces {
    key: [u8; 32],
    half_life: i64,
    store: StoreHandle,
    consumed_key: String,
}
impl Nonces {
    /// Create a validator signing with `secret`, using [`DEFAULT_LIFETIME`].
    pub fn new(secret: impl AsRef<[u8]>, store: StoreHandle, prefix: &Prefix) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            exn::bail!(ErrorKind::MissingSecret);
        }
        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, secret),
            half_life: Self::half_life(DEFAULT_LIFETIME),
            store,
            consumed_key: prefix.key(CONSUMED_NONCES),
        })
    }

    /// Change how long tokens live.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.half_life = Self::half_life(lifetime);
        self
    }

    fn half_life(lifetime: Duration) -> i64 {
        i64::try_from(lifetime.as_secs() / 2).unwrap_or(i64::MAX).max(1)
    }

    fn tick(&self, now: UtcDateTime) -> i64 {
        (now.unix_timestamp() + self.half_life - 1).div_euclid(self.half_life)
    }

    fn token(&self, tick: i64, action: &str, session: &Session, salt: &str) -> blake3::Hash {
        let message = format!("{}|{}|{}|{}|{}", tick, action, session.user_id, session.token, salt);
        blake3::keyed_hash(&self.key, message.as_bytes())
    }

    /// Issue a token for `action` on behalf of `session`.
    pub fn create(&self, action: &str, session: &Session) -> String {
        self.create_at(action, session, UtcDateTime::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn create_at(&self, action: &str, session: &Session, now: UtcDateTime) -> String {
        let salt: String = rand::random::<[u8; SALT_LEN]>().iter().map(|byte| format!("{byte:02x}")).collect();
        let mac = self.token(self.tick(now), action, session, &salt);
        format!("{salt}-{mac}")
    }

    /// Split a presented token into its (lowercased) salt and MAC.
    fn parse(token: &str) -> Option<(String, blake3::Hash)> {
        let (salt, mac) = token.trim().split_once('-')?;
        if salt.len() != SALT_LEN * 2 || !salt.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return None;
        }
        Some((salt.to_ascii_lowercase(), blake3::Hash::from_hex(mac).ok()?))
    }

    /// Verify (and consume) a token as if the current time were `now`.
    #[instrument(level = "debug", skip(self, session, token), fields(user_id = session.user_id))]
    pub async fn verify_at(&self, action: &str, session: &Session, token: &str, now: UtcDateTime) -> Result<Verdict> {
        // `blake3::Hash` equality is constant-time, so compare hashes rather
        // than hex strings.
        let Some((salt, presented)) = Self::parse(token) else {
            tracing::debug!("Token is not a well-formed nonce");
            return Ok(Verdict::Invalid);
        };
        let tick = self.tick(now);
        let (verdict, issued) = if presented == self.token(tick, action, session, &salt) {
            (Verdict::Fresh, tick)
        } else if presented == self.token(tick - 1, action, session, &salt) {
            (Verdict::Aging, tick - 1)
        } else {
            tracing::debug!("Token does not match this action and session, or has expired");
            return Ok(Verdict::Invalid);
        };

        let key = format!("{salt}-{presented}");
        let mut consumed = self.load_consumed().await?;
        if consumed.contains_key(&key) {
            tracing::warn!(action, "Rejecting reused nonce");
            return Ok(Verdict::Invalid);
        }
        let now = now.unix_timestamp();
        consumed.retain(|_, expires| *expires > now);
        consumed.insert(key, (issued + 1) * self.half_life);
        self.save_consumed(&consumed).await?;
        Ok(verdict)
    }

    async fn load_consumed(&self) -> Result<Consumed> {
        let consumed = sri_storage::load(self.store.as_ref(), &self.consumed_key)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))?;
        Ok(consumed.unwrap_or_default())
    }

    async fn save_consumed(&self, consumed: &Consumed) -> Result<()> {
        sri_storage::save(self.store.as_ref(), &self.consumed_key, consumed)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))
    }
}

#[async_trait]
impl TokenValidator for Nonces {
    async fn verify(&self, action: &str, session: &Session, token: &str) -> Result<Verdict> {
        self.verify_at(action, session, token, UtcDateTime::now()).await
    }
}
