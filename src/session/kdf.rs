use zeroize::Zeroizing;

use super::crypto::{self, SharedSecret, AES_KEY_LEN, SHA1_LEN};
use super::mpi;
use super::role::Role;
use super::{Error, Result};

// The high side's sending tag is the low side's receiving tag and the other
// way round, so each peer's sending key is the other's receiving key.
pub const HIGH_SEND_BYTE: u8 = 0x01;
pub const HIGH_RECEIVE_BYTE: u8 = 0x02;
pub const LOW_SEND_BYTE: u8 = 0x02;
pub const LOW_RECEIVE_BYTE: u8 = 0x01;

pub type CipherKey = Zeroizing<[u8; AES_KEY_LEN]>;
pub type MacKey = Zeroizing<[u8; SHA1_LEN]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sending,
    Receiving,
}

#[inline]
pub fn direction_tag(role: Role, direction: Direction) -> Result<u8> {
    match (role, direction) {
        (Role::High, Direction::Sending) => Ok(HIGH_SEND_BYTE),
        (Role::High, Direction::Receiving) => Ok(HIGH_RECEIVE_BYTE),
        (Role::Low, Direction::Sending) => Ok(LOW_SEND_BYTE),
        (Role::Low, Direction::Receiving) => Ok(LOW_RECEIVE_BYTE),
        (Role::Unknown, _) => Err(Error::MissingKeyMaterial),
    }
}

/// `SHA1(tag || MPI(secret))`.
pub fn directional_hash(secret: &SharedSecret, tag: u8) -> Result<Zeroizing<[u8; SHA1_LEN]>> {
    let (len, magnitude) = mpi::mpi_parts(secret.as_bytes())?;
    Ok(Zeroizing::new(crypto::sha1_concat(&[&[tag][..], &len[..], magnitude])))
}

/// Cipher key for one direction: the directional hash truncated to the
/// cipher key length.
pub fn derive_cipher_key(
    secret: &SharedSecret,
    role: Role,
    direction: Direction,
) -> Result<CipherKey> {
    let digest = directional_hash(secret, direction_tag(role, direction)?)?;
    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    key.copy_from_slice(&digest[..AES_KEY_LEN]);
    Ok(key)
}

#[inline]
pub fn derive_sending_key(secret: &SharedSecret, role: Role) -> Result<CipherKey> {
    derive_cipher_key(secret, role, Direction::Sending)
}

#[inline]
pub fn derive_receiving_key(secret: &SharedSecret, role: Role) -> Result<CipherKey> {
    derive_cipher_key(secret, role, Direction::Receiving)
}

/// MAC keys hash the cipher key, never the shared secret.
#[inline]
pub fn derive_mac_key(cipher_key: &[u8; AES_KEY_LEN]) -> MacKey {
    Zeroizing::new(crypto::sha1(cipher_key))
}
