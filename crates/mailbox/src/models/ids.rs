//! Integer identifiers for mailbox records
//!
//! Every record in the mailbox schema is keyed by a database integer. Each
//! key gets its own newtype so an owner id can never be passed where a
//! folder id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Primary key of an `email_user` association row
    EmailUserId
);
record_id!(
    /// Primary key of a logical email
    EmailId
);
record_id!(
    /// Owning user
    UserId
);
record_id!(
    /// Organization the ownership is scoped to
    OrganizationId
);
record_id!(
    /// Mail folder
    FolderId
);
record_id!(
    /// Mail account / source a folder belongs to
    OriginId
);
record_id!(
    /// Conversation thread
    ThreadId
);
record_id!(
    /// Shared (team) mailbox that owns an association
    MailboxId
);

/// Convert a slice of typed ids into raw integers for query parameters
pub fn raw_ids<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|id| (*id).into()).collect()
}

macro_rules! into_raw {
    ($($name:ident),*) => {
        $(impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        })*
    };
}

into_raw!(EmailUserId, EmailId, UserId, OrganizationId, FolderId, OriginId, ThreadId, MailboxId);
