use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Name the verification token is issued for. Both actions share it.
pub const NONCE_ACTION: &str = "update_sri_hash";

/// Something an administrator can do to the exclusion list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Stop enforcing integrity for a URL.
    Exclude,
    /// Resume enforcing integrity for a URL.
    Include,
}
impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exclude => "exclude",
            Self::Include => "include",
        }
    }
}
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Action {
    type Err = Error;
    /// Exact, case-sensitive match; anything else is not an action.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exclude" => Ok(Self::Exclude),
            "include" => Ok(Self::Include),
            _ => exn::bail!(ErrorKind::UnknownAction(s.to_string())),
        }
    }
}
