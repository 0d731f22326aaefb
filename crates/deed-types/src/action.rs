use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of land-ownership event recorded in a chain.
///
/// The set is closed. The canonical name (see [`Action::as_str`]) is what the
/// hash engine feeds into a digest, so renaming a variant's canonical name
/// invalidates every existing digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// An award (compensation decision) was declared for the parcel.
    AwardDeclared,
    /// Ownership of the parcel changed hands.
    OwnershipUpdated,
    /// Compensation was paid out.
    Compensated,
    /// Any other recorded event; `details` carries the description.
    Other,
}

impl Action {
    /// All actions, in declaration order.
    pub const ALL: [Action; 4] = [
        Action::AwardDeclared,
        Action::OwnershipUpdated,
        Action::Compensated,
        Action::Other,
    ];

    /// Canonical name used in digests and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwardDeclared => "AwardDeclared",
            Self::OwnershipUpdated => "OwnershipUpdated",
            Self::Compensated => "Compensated",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s.trim())
            .ok_or_else(|| TypeError::UnknownAction(s.to_string()))
    }
}
