//! Record identifier newtypes.
//!
//! Every persisted entity and every collaborator record is keyed by a plain
//! `u64`; the newtypes keep a template id from being passed where a bookmark
//! id is expected.

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(
    /// Identifier of a job template held by the template catalog.
    TemplateId
);
record_id!(
    /// Identifier of a saved search (bookmark).
    BookmarkId
);
record_id!(
    /// Identifier of the requesting principal.
    PrincipalId
);
record_id!(
    /// Identifier assigned to a persisted job invocation.
    InvocationId
);
record_id!(
    /// Identifier assigned to a persisted targeting.
    TargetingId
);
record_id!(
    /// Identifier assigned to a persisted template invocation.
    TemplateInvocationId
);
record_id!(
    /// Identifier assigned to a persisted input value.
    InputValueId
);
