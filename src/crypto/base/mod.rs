//! The crypto base wraps a set of algorithms for encryption and decryption (both
//! symmetric and asymmetric) as well as cryptographic signing and hashing of data.
//!
//! The idea here is that specific algorithms are wrapped in descriptive
//! interfaces that allow high-level use of the encapsulated cryptographic
//! algorithms without needing to know the details of those algorithms.
//!
//! For instance, you have a `SignKeypair` which has a standard interface, but
//! can describe any number of signing algorithms. This allows expansion of the
//! cryptographic primitives used without needing to build new interfaces around
//! them.

use crate::{
    error::{Error, Result},
    util::ser::BinarySecret,
};
use rand::{rngs::OsRng, RngCore, SeedableRng};
use serde_derive::{Deserialize, Serialize};

mod crypto_key;
mod hash;
mod secret_key;
mod sign_key;

pub use crypto_key::*;
pub use hash::*;
pub use secret_key::*;
pub use sign_key::*;

/// A constant that provides a default for CPU difficulty for interactive key derivation
pub const KDF_OPS_INTERACTIVE: u32 = 2;
/// A constant that provides a default for mem difficulty for interactive key derivation
pub const KDF_MEM_INTERACTIVE: u32 = 65536;

/// A constant that provides a default for CPU difficulty for moderate key derivation
pub const KDF_OPS_MODERATE: u32 = 3;
/// A constant that provides a default for mem difficulty for moderate key derivation
pub const KDF_MEM_MODERATE: u32 = 262144;

/// A constant that provides a default for CPU difficulty for sensitive key derivation
pub const KDF_OPS_SENSITIVE: u32 = 4;
/// A constant that provides a default for mem difficulty for sensitive key derivation
pub const KDF_MEM_SENSITIVE: u32 = 1048576;

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random bytes. Use this if
/// you want a nice, strong random number generator, you don't want to wire one up yourself, and
/// your platform provides good entropy.
///
/// This can be used as an input to any function that accepts `&mut rng`. Otherwise, you can
/// bring your own RNG that implements [`RngCore`].
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}

/// Argon2id cost parameters. These get stored next to whatever they protect
/// so the same key can be derived later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::CopyGetters)]
#[getset(get_copy = "pub")]
pub struct KdfParams {
    /// Number of passes
    ops: u32,
    /// Memory, in KiB
    mem: u32,
}

impl KdfParams {
    /// Create a new set of KDF params.
    pub fn new(ops: u32, mem: u32) -> Self {
        Self { ops, mem }
    }

    /// Params suitable for something a human is waiting on.
    pub fn interactive() -> Self {
        Self::new(KDF_OPS_INTERACTIVE, KDF_MEM_INTERACTIVE)
    }

    /// Params for things that really matter.
    pub fn sensitive() -> Self {
        Self::new(KDF_OPS_SENSITIVE, KDF_MEM_SENSITIVE)
    }

    /// Params read from a file are untrusted; refuse anything outside what we
    /// would ever write ourselves.
    pub fn is_sane(&self) -> bool {
        self.ops >= 1 && self.ops <= KDF_OPS_SENSITIVE * 4 && self.mem >= 8 && self.mem <= KDF_MEM_SENSITIVE
    }

    /// Like [`is_sane`](Self::is_sane), but as an error.
    pub fn check(&self) -> Result<()> {
        if !self.is_sane() {
            Err(Error::CryptoKDFParamsInvalid(self.ops, self.mem))?;
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Generate a secret key from a passphrase/salt
pub fn derive_secret_key(passphrase: &[u8], salt_bytes: &[u8], params: &KdfParams) -> Result<SecretKey> {
    const LEN: usize = 32;
    let salt: &[u8; 16] = salt_bytes
        .get(0..16)
        .and_then(|x| x.try_into().ok())
        .ok_or(Error::CryptoBadSalt)?;
    let mut key = [0u8; LEN];
    let argon2_ctx = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(params.mem(), params.ops(), 1, Some(LEN)).map_err(|_| Error::CryptoKDFFailed)?,
    );
    argon2_ctx
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|_| Error::CryptoKDFFailed)?;
    Ok(SecretKey::XChaCha20Poly1305(BinarySecret::new(key)))
}

/// Given the bytes from a secret key, derive some other key of N length in a secure manner.
pub fn stretch_key<const N: usize>(input: &[u8], output: &mut [u8; N], info: Option<&[u8]>, salt: Option<&[u8]>) -> Result<()> {
    let hkdf = hkdf::SimpleHkdf::<blake3::Hasher>::new(salt, input);
    hkdf.expand(info.unwrap_or(b"trsst/hkdf"), output)
        .map_err(|_| Error::CryptoHKDFFailed)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn derives_secret_key() {
        let salt = [7u8; 16];
        let params = crate::util::test::kdf();
        let key1 = derive_secret_key(b"ZONING IS COMMUNISM", &salt, &params).unwrap();
        let key2 = derive_secret_key(b"ZONING IS COMMUNISM", &salt, &params).unwrap();
        let key3 = derive_secret_key(b"ZONING IS CAPITALISM", &salt, &params).unwrap();
        let key4 = derive_secret_key(b"ZONING IS COMMUNISM", &[8u8; 16], &params).unwrap();
        assert_eq!(key1.as_ref(), key2.as_ref());
        assert!(key1.as_ref() != key3.as_ref());
        assert!(key1.as_ref() != key4.as_ref());
    }

    #[test]
    fn derive_secret_key_short_salt() {
        let res = derive_secret_key(b"hunter22", &[1, 2, 3], &crate::util::test::kdf());
        assert_eq!(res.err(), Some(Error::CryptoBadSalt));
    }

    #[test]
    fn kdf_params_sanity() {
        assert!(KdfParams::interactive().is_sane());
        assert!(KdfParams::sensitive().is_sane());
        assert!(crate::util::test::kdf().is_sane());
        assert!(!KdfParams::new(0, 65536).is_sane());
        assert!(!KdfParams::new(2, KDF_MEM_SENSITIVE * 8).is_sane());
        assert_eq!(KdfParams::interactive().check(), Ok(()));
        assert_eq!(KdfParams::new(17, 64).check().err(), Some(Error::CryptoKDFParamsInvalid(17, 64)));
    }

    #[test]
    fn key_stretcher() {
        let secret1: [u8; 32] = [182, 32, 38, 195, 3, 106, 177, 19, 174, 37, 56, 19, 163, 193, 155, 49, 112, 238, 93, 96, 149, 145, 69, 19, 187, 251, 76, 227, 111, 136, 180, 43];

        let mut output1 = [0u8; 42];
        stretch_key(&secret1, &mut output1, None, None).unwrap();
        let mut output2 = [0u8; 16];
        stretch_key(&secret1, &mut output2, None, None).unwrap();
        assert_eq!(&output1[0..16], &output2[..]);

        let mut output3 = [0u8; 32];
        stretch_key(&secret1, &mut output3, Some(b"trsst/test/0"), None).unwrap();
        let mut output4 = [0u8; 32];
        stretch_key(&secret1, &mut output4, Some(b"trsst/test/1"), None).unwrap();
        assert!(output3 != output4);
    }
}
