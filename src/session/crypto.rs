use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand_core::{OsRng, RngCore};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use bytes::BufMut;

use super::counter::COUNTER_LEN;
use super::mpi;
use super::{Error, Result};

pub const SHA1_LEN: usize = 20;
pub const AES_KEY_LEN: usize = 16;
pub const DH_PRIVATE_KEY_LEN: usize = 40;
pub const MIN_PRIVATE_KEY_LEN: usize = 16;

const GENERATOR: u32 = 2;

// 1536-bit MODP group, RFC 3526 section 2.
const MODULUS: [u8; 192] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xc9, 0x0f, 0xda, 0xa2,
    0x21, 0x68, 0xc2, 0x34, 0xc4, 0xc6, 0x62, 0x8b, 0x80, 0xdc, 0x1c, 0xd1,
    0x29, 0x02, 0x4e, 0x08, 0x8a, 0x67, 0xcc, 0x74, 0x02, 0x0b, 0xbe, 0xa6,
    0x3b, 0x13, 0x9b, 0x22, 0x51, 0x4a, 0x08, 0x79, 0x8e, 0x34, 0x04, 0xdd,
    0xef, 0x95, 0x19, 0xb3, 0xcd, 0x3a, 0x43, 0x1b, 0x30, 0x2b, 0x0a, 0x6d,
    0xf2, 0x5f, 0x14, 0x37, 0x4f, 0xe1, 0x35, 0x6d, 0x6d, 0x51, 0xc2, 0x45,
    0xe4, 0x85, 0xb5, 0x76, 0x62, 0x5e, 0x7e, 0xc6, 0xf4, 0x4c, 0x42, 0xe9,
    0xa6, 0x37, 0xed, 0x6b, 0x0b, 0xff, 0x5c, 0xb6, 0xf4, 0x06, 0xb7, 0xed,
    0xee, 0x38, 0x6b, 0xfb, 0x5a, 0x89, 0x9f, 0xa5, 0xae, 0x9f, 0x24, 0x11,
    0x7c, 0x4b, 0x1f, 0xe6, 0x49, 0x28, 0x66, 0x51, 0xec, 0xe4, 0x5b, 0x3d,
    0xc2, 0x00, 0x7c, 0xb8, 0xa1, 0x63, 0xbf, 0x05, 0x98, 0xda, 0x48, 0x36,
    0x1c, 0x55, 0xd3, 0x9a, 0x69, 0x16, 0x3f, 0xa8, 0xfd, 0x24, 0xcf, 0x5f,
    0x83, 0x65, 0x5d, 0x23, 0xdc, 0xa3, 0xad, 0x96, 0x1c, 0x62, 0xf3, 0x56,
    0x20, 0x85, 0x52, 0xbb, 0x9e, 0xd5, 0x29, 0x07, 0x70, 0x96, 0x96, 0x6d,
    0x67, 0x0c, 0x35, 0x4e, 0x4a, 0xbc, 0x98, 0x04, 0xf1, 0x74, 0x6c, 0x08,
    0xca, 0x23, 0x73, 0x27, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];

type HmacSha1 = Hmac<Sha1>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

#[inline]
fn modulus() -> BigUint {
    BigUint::from_bytes_be(&MODULUS)
}

#[inline]
pub fn sha1(data: &[u8]) -> [u8; SHA1_LEN] {
    Sha1::digest(data).into()
}

/// SHA-1 over the concatenation of `parts`.
#[inline]
pub fn sha1_concat(parts: &[&[u8]]) -> [u8; SHA1_LEN] {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[inline]
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<[u8; SHA1_LEN]> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| Error::InvalidKeyLength)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Constant-time check of `tag` against the HMAC-SHA1 of `data`.
#[inline]
pub fn verify_hmac_sha1(key: &[u8], data: &[u8], tag: &[u8]) -> Result<bool> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| Error::InvalidKeyLength)?;
    mac.update(data);
    Ok(mac.verify_slice(tag).is_ok())
}

/// Applies the AES-128-CTR keystream starting at the given counter block.
/// Encryption and decryption are the same operation.
#[inline]
pub fn aes_ctr_apply(key: &[u8], counter: &[u8; COUNTER_LEN], data: &mut [u8]) -> Result<()> {
    let mut cipher =
        Aes128Ctr::new_from_slices(key, counter).map_err(|_| Error::InvalidKeyLength)?;
    cipher.apply_keystream(data);
    Ok(())
}

/// A Diffie-Hellman public value `g^x mod p`.
#[derive(Clone, PartialEq, Eq)]
pub struct DhPublicKey(BigUint);

impl DhPublicKey {
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    #[inline]
    pub fn write_mpi<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        mpi::write_mpi(buf, &self.0.to_bytes_be())
    }

    /// Rejects values outside `[2, p - 2]`.
    pub fn validate(&self) -> Result<()> {
        if self.0 < BigUint::from(2u32) || self.0 > modulus() - 2u32 {
            return Err(Error::InvalidPublicKey);
        }
        Ok(())
    }

    /// Compares magnitudes. Values are non-negative, so this is the plain
    /// integer ordering.
    #[inline]
    pub fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Debug for DhPublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhPublicKey")
            .field("bits", &self.0.bits())
            .finish()
    }
}

/// A Diffie-Hellman key pair. The private exponent is wiped on drop.
///
/// Exponentiation goes through `num_bigint::BigUint`, which has no zeroize
/// support. The exponent and shared secret are wiped where they are stored,
/// but the `BigUint` temporaries built inside [`DhKeyPair::from_private_bytes`]
/// and [`DhKeyPair::shared_secret`] are freed without being overwritten.
#[derive(Clone)]
pub struct DhKeyPair {
    private: Zeroizing<Vec<u8>>,
    public: DhPublicKey,
}

impl DhKeyPair {
    #[inline]
    pub fn generate() -> Self {
        Self::random(DH_PRIVATE_KEY_LEN)
    }

    /// Generates a pair with a `len`-byte private exponent. Lengths below
    /// [`MIN_PRIVATE_KEY_LEN`] are rejected.
    pub fn generate_with_len(len: usize) -> Result<Self> {
        if len < MIN_PRIVATE_KEY_LEN {
            return Err(Error::InvalidKeyLength);
        }
        Ok(Self::random(len))
    }

    fn random(len: usize) -> Self {
        let mut private = Zeroizing::new(vec![0u8; len]);
        OsRng.fill_bytes(private.as_mut_slice());
        Self::from_private_bytes(&private)
    }

    pub fn from_private_bytes(private: &[u8]) -> Self {
        let exponent = BigUint::from_bytes_be(private);
        let public = BigUint::from(GENERATOR).modpow(&exponent, &modulus());
        Self {
            private: Zeroizing::new(private.to_vec()),
            public: DhPublicKey(public),
        }
    }

    #[inline]
    pub fn public(&self) -> &DhPublicKey {
        &self.public
    }

    /// Computes `remote^x mod p`.
    pub fn shared_secret(&self, remote: &DhPublicKey) -> SharedSecret {
        let exponent = BigUint::from_bytes_be(&self.private);
        let secret = Zeroizing::new(remote.0.modpow(&exponent, &modulus()).to_bytes_be());
        SharedSecret::from_bytes_be(&secret)
    }
}

impl Debug for DhKeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// The Diffie-Hellman shared secret, kept as its minimal big-endian
/// magnitude and wiped on drop.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self(Zeroizing::new(bytes[start..].to_vec()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SharedSecret {}

impl Debug for SharedSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

#[cfg(test)]
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        write!(&mut s, "{:02x}", b).unwrap();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1() {
        assert_eq!(
            encode_hex(&sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_sha1_concat() {
        assert_eq!(sha1_concat(&[&b"a"[..], &b"bc"[..]]), sha1(b"abc"));
        assert_eq!(sha1_concat(&[&b"abc"[..], &b""[..]]), sha1(b"abc"));
        assert_eq!(sha1_concat(&[]), sha1(b""));
    }

    #[test]
    fn test_hmac_sha1() {
        let tag = hmac_sha1(b"key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            encode_hex(&tag),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
        assert!(verify_hmac_sha1(b"key", b"The quick brown fox jumps over the lazy dog", &tag).unwrap());
        assert!(!verify_hmac_sha1(b"key", b"The quick brown fox jumps over the lazy cat", &tag).unwrap());
    }

    #[test]
    fn test_aes_ctr() {
        let key = [0x2bu8; AES_KEY_LEN];
        let counter = [0u8; COUNTER_LEN];
        let mut data = *b"attack at dawn";
        aes_ctr_apply(&key, &counter, &mut data).unwrap();
        assert_ne!(&data, b"attack at dawn");
        aes_ctr_apply(&key, &counter, &mut data).unwrap();
        assert_eq!(&data, b"attack at dawn");

        assert_eq!(
            aes_ctr_apply(&[0u8; 7], &counter, &mut data),
            Err(Error::InvalidKeyLength)
        );
    }

    #[test]
    fn test_generate_with_len() {
        assert!(matches!(
            DhKeyPair::generate_with_len(0),
            Err(Error::InvalidKeyLength)
        ));
        assert!(matches!(
            DhKeyPair::generate_with_len(MIN_PRIVATE_KEY_LEN - 1),
            Err(Error::InvalidKeyLength)
        ));
        let pair = DhKeyPair::generate_with_len(MIN_PRIVATE_KEY_LEN).unwrap();
        assert!(pair.public().validate().is_ok());
    }

    #[test]
    fn test_public_key_mpi() {
        let mut buf = Vec::new();
        DhPublicKey::from_bytes_be(&[0, 0x01, 0x02]).write_mpi(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 2, 0x01, 0x02]);
    }

    #[test]
    fn test_modulus() {
        assert_eq!(modulus().bits(), 1536);
    }

    #[test]
    fn test_small_exponent() {
        let pair = DhKeyPair::from_private_bytes(&[35]);
        assert_eq!(pair.public().to_bytes_be(), 34359738368u64.to_be_bytes()[3..]);
    }

    #[test]
    fn test_shared_secret_agreement() {
        let alice = DhKeyPair::generate();
        let bob = DhKeyPair::generate();
        assert!(alice.public().validate().is_ok());
        assert!(bob.public().validate().is_ok());

        let s1 = alice.shared_secret(bob.public());
        let s2 = bob.shared_secret(alice.public());
        assert_eq!(s1, s2);
        assert_ne!(s1.as_bytes().first(), Some(&0));
    }

    #[test]
    fn test_validate_public_key() {
        assert_eq!(
            DhPublicKey::from_bytes_be(&[]).validate(),
            Err(Error::InvalidPublicKey)
        );
        assert_eq!(
            DhPublicKey::from_bytes_be(&[1]).validate(),
            Err(Error::InvalidPublicKey)
        );
        assert!(DhPublicKey::from_bytes_be(&[2]).validate().is_ok());
        assert_eq!(
            DhPublicKey::from_bytes_be(&MODULUS).validate(),
            Err(Error::InvalidPublicKey)
        );

        let mut p_minus_1 = MODULUS;
        p_minus_1[191] -= 1;
        assert_eq!(
            DhPublicKey::from_bytes_be(&p_minus_1).validate(),
            Err(Error::InvalidPublicKey)
        );
        p_minus_1[191] -= 1;
        assert!(DhPublicKey::from_bytes_be(&p_minus_1).validate().is_ok());
    }

    #[test]
    fn test_shared_secret_strips_leading_zeros() {
        let s = SharedSecret::from_bytes_be(&[0, 0, 1, 2]);
        assert_eq!(s.as_bytes(), &[1, 2]);
        assert_eq!(format!("{:?}", s), "SharedSecret(..)");
    }
}
