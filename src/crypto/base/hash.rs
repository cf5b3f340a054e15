use crate::{
    error::{Error, Result},
    util::ser::{self, Binary},
};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

/// A cryptographic hash. By defining this as an enum, we allow expansion of
/// hash algorithms in the future.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hash {
    /// Blake3 256bit hash
    Blake3(Binary<32>),
}

impl Hash {
    /// Create a new blake3 hash from a message
    pub fn new_blake3(message: &[u8]) -> Result<Self> {
        Ok(Self::Blake3(Binary::new(*blake3::hash(message).as_bytes())))
    }

    /// Hash several chunks of data as though they were one message.
    pub fn new_blake3_multi(parts: &[&[u8]]) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Ok(Self::Blake3(Binary::new(*hasher.finalize().as_bytes())))
    }

    /// Return the byte slice representing this hash.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Blake3(bin) => bin.deref(),
        }
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ser::base64_encode(self.as_bytes()))
    }
}

impl TryFrom<&str> for Hash {
    type Error = Error;

    fn try_from(hash_str: &str) -> std::result::Result<Self, Self::Error> {
        let bytes = ser::base64_decode(hash_str)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::CryptoAlgoMismatch)?;
        Ok(Self::Blake3(Binary::new(arr)))
    }
}
