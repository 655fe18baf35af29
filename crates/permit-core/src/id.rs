//! UUID-backed record identifiers.
//!
//! One newtype per persisted entity so a [`CaseId`] can never be handed
//! to an API expecting a [`ProjectId`]. All identifiers are valid by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier for an organization.
    OrgId
);
uuid_id!(
    /// Identifier for a physical location record.
    LocationId
);
uuid_id!(
    /// Identifier for a construction project.
    ProjectId
);
uuid_id!(
    /// Identifier for a permit case.
    CaseId
);
uuid_id!(
    /// Identifier for a stored document.
    DocumentId
);
uuid_id!(
    /// Identifier for an inspection record.
    InspectionId
);
uuid_id!(
    /// Identifier for an audit event.
    EventId
);
uuid_id!(
    /// Identifier for an authenticated session.
    SessionId
);
