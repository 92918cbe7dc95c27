use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of one of the router's network interfaces (NICs).
///
/// "No interface" (broadcast, or a withdrawn route) is expressed as
/// `Option<InterfaceId>::None` rather than a magic index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(pub usize);

impl InterfaceId {
    /// Builds an interface id, rejecting indexes the router does not have.
    pub fn checked(index: usize, num_nics: usize) -> Result<Self, RouterError> {
        if index >= num_nics {
            return Err(RouterError::InterfaceOutOfRange { index, num_nics });
        }
        Ok(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn ensure_within(self, num_nics: usize) -> Result<Self, RouterError> {
        Self::checked(self.0, num_nics)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric code printed in router output: the index, or `-1` for none.
pub fn interface_code(interface: Option<InterfaceId>) -> i64 {
    interface.map_or(-1, |nic| nic.0 as i64)
}
