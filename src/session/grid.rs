use std::fmt::{self, Debug, Formatter};

use tracing::debug;
use zeroize::Zeroizing;

use super::crypto::{DhKeyPair, DhPublicKey};
use super::kdf::MacKey;
use super::keys::{MacKeyUsage, SessionKeys, Slot};
use super::role::resolve_role;
use super::{Error, Result};
use crate::config::KeyScheduleConfig;

const SLOTS: [(Slot, Slot); 4] = [
    (Slot::Previous, Slot::Previous),
    (Slot::Previous, Slot::Current),
    (Slot::Current, Slot::Previous),
    (Slot::Current, Slot::Current),
];

#[inline]
fn index(local: Slot, remote: Slot) -> usize {
    local.index() * 2 + remote.index()
}

/// The four bindings of a session: previous and current local key
/// generation crossed with previous and current remote key generation.
pub struct KeyGrid {
    slots: [SessionKeys; 4],
}

impl KeyGrid {
    /// Binds all four slots to the key generations agreed by the handshake.
    pub fn new(
        config: &KeyScheduleConfig,
        local_pair: DhKeyPair,
        local_key_id: u32,
        remote_public: DhPublicKey,
        remote_key_id: u32,
    ) -> Result<Self> {
        let mut slots = SLOTS.map(|(local, remote)| SessionKeys::with_config(local, remote, config));
        for slot in slots.iter_mut() {
            slot.set_local_pair(local_pair.clone(), local_key_id)?;
            slot.set_remote_public_key(remote_public.clone(), remote_key_id)?;
        }
        Ok(Self { slots })
    }

    #[inline]
    pub fn get(&self, local: Slot, remote: Slot) -> &SessionKeys {
        &self.slots[index(local, remote)]
    }

    #[inline]
    pub fn get_mut(&mut self, local: Slot, remote: Slot) -> &mut SessionKeys {
        &mut self.slots[index(local, remote)]
    }

    /// The binding used for outgoing messages: the newest remote key with
    /// the newest local key the peer has already seen.
    #[inline]
    pub fn encryption_keys(&mut self) -> &mut SessionKeys {
        self.get_mut(Slot::Previous, Slot::Current)
    }

    /// The binding a received message refers to by its key ids.
    pub fn find_by_ids(&mut self, local_key_id: u32, remote_key_id: u32) -> Option<&mut SessionKeys> {
        self.slots
            .iter_mut()
            .find(|s| s.local_key_id() == local_key_id && s.remote_key_id() == remote_key_id)
    }

    /// Replaces the local key generation. The current local pair moves to the
    /// previous slots and `new_pair` takes the current ones with the next key
    /// id. Returns the receiving MAC keys of the retired bindings that were
    /// used, for the caller to reveal.
    ///
    /// Every binding is checked before any slot changes, so an error leaves
    /// the grid as it was.
    pub fn rotate_local(&mut self, new_pair: DhKeyPair) -> Result<Vec<MacKey>> {
        new_pair.public().validate()?;
        let mut moves = Vec::with_capacity(2);
        for remote in [Slot::Current, Slot::Previous] {
            let current = self.get(Slot::Current, remote);
            let pair = current.local_pair().cloned().ok_or(Error::MissingKeyMaterial)?;
            check_pairing(Some(new_pair.public()), current.remote_public_key())?;
            check_pairing(
                Some(pair.public()),
                self.get(Slot::Previous, remote).remote_public_key(),
            )?;
            moves.push((remote, pair, current.local_key_id()));
        }
        let revealed = self.used_mac_keys([
            (Slot::Previous, Slot::Current),
            (Slot::Previous, Slot::Previous),
        ])?;

        for (remote, pair, key_id) in moves {
            self.get_mut(Slot::Previous, remote).set_local_pair(pair, key_id)?;
            self.get_mut(Slot::Current, remote)
                .set_local_pair(new_pair.clone(), key_id.wrapping_add(1))?;
        }

        debug!(
            "rotated local keys, current local key id: {}",
            self.get(Slot::Current, Slot::Current).local_key_id()
        );
        Ok(revealed)
    }

    /// Replaces the remote key generation, mirroring [`KeyGrid::rotate_local`].
    pub fn rotate_remote(&mut self, new_public: DhPublicKey) -> Result<Vec<MacKey>> {
        new_public.validate()?;
        let mut moves = Vec::with_capacity(2);
        for local in [Slot::Current, Slot::Previous] {
            let current = self.get(local, Slot::Current);
            let public = current
                .remote_public_key()
                .cloned()
                .ok_or(Error::MissingKeyMaterial)?;
            check_pairing(
                current.local_pair().map(DhKeyPair::public),
                Some(&new_public),
            )?;
            check_pairing(
                self.get(local, Slot::Previous)
                    .local_pair()
                    .map(DhKeyPair::public),
                Some(&public),
            )?;
            moves.push((local, public, current.remote_key_id()));
        }
        let revealed = self.used_mac_keys([
            (Slot::Current, Slot::Previous),
            (Slot::Previous, Slot::Previous),
        ])?;

        for (local, public, key_id) in moves {
            self.get_mut(local, Slot::Previous)
                .set_remote_public_key(public, key_id)?;
            self.get_mut(local, Slot::Current)
                .set_remote_public_key(new_public.clone(), key_id.wrapping_add(1))?;
        }

        debug!(
            "rotated remote keys, current remote key id: {}",
            self.get(Slot::Current, Slot::Current).remote_key_id()
        );
        Ok(revealed)
    }

    fn used_mac_keys(&mut self, slots: [(Slot, Slot); 2]) -> Result<Vec<MacKey>> {
        let mut keys = Vec::new();
        for (local, remote) in slots {
            let slot = self.get_mut(local, remote);
            if slot.receiving_mac_key_usage() == MacKeyUsage::Used {
                keys.push(Zeroizing::new(*slot.receiving_mac_key()?));
            }
        }
        Ok(keys)
    }
}

/// Fails if binding these two values would fail. A missing half cannot fail.
fn check_pairing(local: Option<&DhPublicKey>, remote: Option<&DhPublicKey>) -> Result<()> {
    if let (Some(local), Some(remote)) = (local, remote) {
        resolve_role(local, remote)?;
    }
    Ok(())
}

impl Debug for KeyGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.iter()).finish()
    }
}
