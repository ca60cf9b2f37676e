//! The requesting identity.

use serde::{Deserialize, Serialize};

use super::ids::PrincipalId;

/// The user on whose behalf an invocation is composed.
///
/// Only used as the owner attached to the invocation's targeting.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::{Principal, PrincipalId};
///
/// let admin = Principal::new(PrincipalId(1), "admin");
/// assert_eq!(admin.login, "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier of the principal.
    pub id: PrincipalId,
    /// Login name, used in log output.
    pub login: String,
}

impl Principal {
    /// Creates a principal.
    pub fn new(id: PrincipalId, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}
