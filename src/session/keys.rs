use std::fmt::{self, Debug, Formatter};

use tracing::{debug, trace};

use super::counter::{CounterLayout, NonceCounters, COUNTER_LEN, TOP_HALF_LEN};
use super::crypto::{DhKeyPair, DhPublicKey, SharedSecret, AES_KEY_LEN, SHA1_LEN};
use super::kdf::{self, CipherKey, Direction, MacKey};
use super::role::{resolve_role, Role};
use super::{Error, Result};
use crate::config::KeyScheduleConfig;

/// Position of a key generation in the rotation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Previous,
    Current,
}

impl Slot {
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Slot::Previous => 0,
            Slot::Current => 1,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Slot::Previous => "previous",
            Slot::Current => "current",
        }
    }
}

/// Whether the receiving MAC key has been used to verify a message. Used
/// keys are revealed to the peer once the binding is rotated away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacKeyUsage {
    /// Nothing has been bound yet.
    #[default]
    Unknown,
    Unused,
    Used,
}

/// Lazily derived material of one binding. Replaced as a whole on reset;
/// dropping it wipes every key.
#[derive(Default)]
struct DerivedKeys {
    shared_secret: Option<SharedSecret>,
    sending_key: Option<CipherKey>,
    receiving_key: Option<CipherKey>,
    sending_mac_key: Option<MacKey>,
    receiving_mac_key: Option<MacKey>,
}

impl DerivedKeys {
    #[inline]
    fn cipher_key(&self, direction: Direction) -> Option<&[u8; AES_KEY_LEN]> {
        match direction {
            Direction::Sending => self.sending_key.as_deref(),
            Direction::Receiving => self.receiving_key.as_deref(),
        }
    }

    #[inline]
    fn cipher_key_mut(&mut self, direction: Direction) -> &mut Option<CipherKey> {
        match direction {
            Direction::Sending => &mut self.sending_key,
            Direction::Receiving => &mut self.receiving_key,
        }
    }

    #[inline]
    fn mac_key(&self, direction: Direction) -> Option<&[u8; SHA1_LEN]> {
        match direction {
            Direction::Sending => self.sending_mac_key.as_deref(),
            Direction::Receiving => self.receiving_mac_key.as_deref(),
        }
    }

    #[inline]
    fn mac_key_mut(&mut self, direction: Direction) -> &mut Option<MacKey> {
        match direction {
            Direction::Sending => &mut self.sending_mac_key,
            Direction::Receiving => &mut self.receiving_mac_key,
        }
    }
}

/// Keys and counters for one (local key generation, remote key generation)
/// binding.
///
/// Every change to either half of the binding resets the counters and drops
/// all derived material. Keys are derived on first use and cached until the
/// next reset:
///
/// ```text
/// shared secret --SHA1(tag || MPI(s))[..16]--> cipher key --SHA1--> MAC key
/// ```
pub struct SessionKeys {
    description: String,
    local_key_id: u32,
    remote_key_id: u32,
    local_pair: Option<DhKeyPair>,
    remote_public: Option<DhPublicKey>,
    role: Role,
    counters: NonceCounters,
    derived: DerivedKeys,
    receiving_mac_key_usage: MacKeyUsage,
}

impl SessionKeys {
    pub fn new(local: Slot, remote: Slot) -> Self {
        Self::with_layout(local, remote, CounterLayout::default())
    }

    pub fn with_config(local: Slot, remote: Slot, config: &KeyScheduleConfig) -> Self {
        Self::with_layout(local, remote, config.counter_layout)
    }

    fn with_layout(local: Slot, remote: Slot, layout: CounterLayout) -> Self {
        Self {
            description: format!(
                "({} local, {} remote)",
                local.describe(),
                remote.describe()
            ),
            local_key_id: 0,
            remote_key_id: 0,
            local_pair: None,
            remote_public: None,
            role: Role::Unknown,
            counters: NonceCounters::new(layout),
            derived: DerivedKeys::default(),
            receiving_mac_key_usage: MacKeyUsage::Unknown,
        }
    }

    /// Binds a new local key pair and resets the slot. A pair whose public
    /// value is outside the group range is rejected and leaves the slot
    /// untouched.
    pub fn set_local_pair(&mut self, pair: DhKeyPair, key_id: u32) -> Result<()> {
        pair.public().validate()?;
        self.local_pair = Some(pair);
        self.local_key_id = key_id;
        debug!("{} current local key id: {}", self.description, key_id);
        self.reset()
    }

    /// Binds a new remote public value and resets the slot. Values outside
    /// the group range are rejected and leave the slot untouched.
    pub fn set_remote_public_key(&mut self, public: DhPublicKey, key_id: u32) -> Result<()> {
        public.validate()?;
        self.remote_public = Some(public);
        self.remote_key_id = key_id;
        debug!("{} current remote key id: {}", self.description, key_id);
        self.reset()
    }

    fn reset(&mut self) -> Result<()> {
        trace!("resetting {} session keys", self.description);
        self.counters.reset();
        self.derived = DerivedKeys::default();
        self.receiving_mac_key_usage = MacKeyUsage::Unused;
        self.role = Role::Unknown;
        if let (Some(local), Some(remote)) = (&self.local_pair, &self.remote_public) {
            self.role = resolve_role(local.public(), remote)?;
        }
        Ok(())
    }

    /// The Diffie-Hellman shared secret, computed once per binding.
    pub fn shared_secret(&mut self) -> Result<&SharedSecret> {
        if self.derived.shared_secret.is_none() {
            let (Some(local), Some(remote)) = (&self.local_pair, &self.remote_public) else {
                return Err(Error::MissingKeyMaterial);
            };
            trace!("{} computing shared secret", self.description);
            self.derived.shared_secret = Some(local.shared_secret(remote));
        }
        self.derived
            .shared_secret
            .as_ref()
            .ok_or(Error::MissingKeyMaterial)
    }

    /// Replaces the shared secret with one computed elsewhere. Keys derived
    /// from the old secret are dropped; role and counters are kept.
    pub fn set_shared_secret(&mut self, secret: SharedSecret) {
        self.derived = DerivedKeys {
            shared_secret: Some(secret),
            ..DerivedKeys::default()
        };
        trace!("{} shared secret replaced", self.description);
    }

    fn cipher_key(&mut self, direction: Direction) -> Result<&[u8; AES_KEY_LEN]> {
        if !self.role.is_known() {
            return Err(Error::MissingKeyMaterial);
        }
        if self.derived.cipher_key(direction).is_none() {
            let role = self.role;
            let key = kdf::derive_cipher_key(self.shared_secret()?, role, direction)?;
            trace!("{} derived {:?} cipher key", self.description, direction);
            *self.derived.cipher_key_mut(direction) = Some(key);
        }
        self.derived
            .cipher_key(direction)
            .ok_or(Error::MissingKeyMaterial)
    }

    fn mac_key(&mut self, direction: Direction) -> Result<&[u8; SHA1_LEN]> {
        if self.derived.mac_key(direction).is_none() {
            let key = kdf::derive_mac_key(self.cipher_key(direction)?);
            trace!("{} derived {:?} MAC key", self.description, direction);
            *self.derived.mac_key_mut(direction) = Some(key);
        }
        self.derived
            .mac_key(direction)
            .ok_or(Error::MissingKeyMaterial)
    }

    #[inline]
    pub fn sending_key(&mut self) -> Result<&[u8; AES_KEY_LEN]> {
        self.cipher_key(Direction::Sending)
    }

    #[inline]
    pub fn receiving_key(&mut self) -> Result<&[u8; AES_KEY_LEN]> {
        self.cipher_key(Direction::Receiving)
    }

    #[inline]
    pub fn sending_mac_key(&mut self) -> Result<&[u8; SHA1_LEN]> {
        self.mac_key(Direction::Sending)
    }

    #[inline]
    pub fn receiving_mac_key(&mut self) -> Result<&[u8; SHA1_LEN]> {
        self.mac_key(Direction::Receiving)
    }

    pub fn increment_sending_ctr(&mut self) {
        trace!(
            "incrementing counter for (local key id, remote key id) = ({}, {})",
            self.local_key_id,
            self.remote_key_id
        );
        self.counters.increment_sending();
    }

    #[inline]
    pub fn sending_ctr(&self) -> &[u8; COUNTER_LEN] {
        self.counters.sending()
    }

    #[inline]
    pub fn receiving_ctr(&self) -> &[u8; COUNTER_LEN] {
        self.counters.receiving()
    }

    #[inline]
    pub fn set_receiving_ctr(&mut self, counter: &[u8]) -> Result<()> {
        self.counters.set_receiving(counter)
    }

    #[inline]
    pub fn sending_ctr_top_half(&self) -> [u8; TOP_HALF_LEN] {
        self.counters.sending_top_half()
    }

    #[inline]
    pub fn set_receiving_ctr_top_half(&mut self, top: [u8; TOP_HALF_LEN]) {
        self.counters.set_receiving_top_half(top)
    }

    #[inline]
    pub fn counter_layout(&self) -> CounterLayout {
        self.counters.layout()
    }

    #[inline]
    pub fn receiving_mac_key_usage(&self) -> MacKeyUsage {
        self.receiving_mac_key_usage
    }

    #[inline]
    pub fn mark_receiving_mac_key_used(&mut self) {
        self.receiving_mac_key_usage = MacKeyUsage::Used;
    }

    #[inline]
    pub fn local_key_id(&self) -> u32 {
        self.local_key_id
    }

    #[inline]
    pub fn remote_key_id(&self) -> u32 {
        self.remote_key_id
    }

    #[inline]
    pub fn local_pair(&self) -> Option<&DhKeyPair> {
        self.local_pair.as_ref()
    }

    #[inline]
    pub fn remote_public_key(&self) -> Option<&DhPublicKey> {
        self.remote_public.as_ref()
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }
}

impl Debug for SessionKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("description", &self.description)
            .field("local_key_id", &self.local_key_id)
            .field("remote_key_id", &self.remote_key_id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
