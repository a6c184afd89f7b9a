use std::cmp::Ordering;

use super::crypto::DhPublicKey;
use super::{Error, Result};

/// Which side of a key binding we are on. Decided by comparing the two public
/// values, so both peers agree on it without exchanging anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// One half of the binding is still missing.
    #[default]
    Unknown,
    High,
    Low,
}

impl Role {
    #[inline]
    pub fn is_known(self) -> bool {
        self != Role::Unknown
    }

    /// The role the peer holds for the same binding.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Role::High => Role::Low,
            Role::Low => Role::High,
            Role::Unknown => Role::Unknown,
        }
    }
}

/// `High` if the local public value is strictly larger than the remote one.
/// Equal values cannot come out of an honest exchange and are rejected.
pub fn resolve_role(local: &DhPublicKey, remote: &DhPublicKey) -> Result<Role> {
    match local.cmp_magnitude(remote) {
        Ordering::Greater => Ok(Role::High),
        Ordering::Less => Ok(Role::Low),
        Ordering::Equal => Err(Error::InvalidRoleComparison),
    }
}
