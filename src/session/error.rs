#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("missing key material")]
    MissingKeyMaterial,
    #[error("shared secret could not be serialized")]
    SerializationFailure,
    #[error("local and remote public keys have equal magnitude")]
    InvalidRoleComparison,
    #[error("public key out of range")]
    InvalidPublicKey,
    #[error("invalid key length")]
    InvalidKeyLength,
    #[error("invalid counter length: {0}")]
    InvalidCounterLength(usize),
}
