use crate::{
    error::{Error, Result},
    util::ser::{Binary, BinarySecret, BinaryVec, SerdeBinary},
};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

/// A structure to help with the bundling of AAD (additional associated data) with our ciphertext.
#[derive(Debug, Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct DataWithAAD<'msg> {
    data: &'msg [u8],
    aad: Option<Vec<u8>>,
}

impl<'msg> DataWithAAD<'msg> {
    /// Create a new data+AAD payload
    pub fn new(data: &'msg [u8], aad: Vec<u8>) -> Self {
        Self { data, aad: Some(aad) }
    }
}

impl<'msg> From<&'msg Vec<u8>> for DataWithAAD<'msg> {
    fn from(data: &'msg Vec<u8>) -> Self {
        Self {
            data: data.as_slice(),
            aad: None,
        }
    }
}

impl<'msg> From<&'msg [u8]> for DataWithAAD<'msg> {
    fn from(data: &'msg [u8]) -> Self {
        Self { data, aad: None }
    }
}

impl<'msg, const N: usize> From<&'msg [u8; N]> for DataWithAAD<'msg> {
    fn from(data: &'msg [u8; N]) -> Self {
        Self {
            data: data.as_slice(),
            aad: None,
        }
    }
}

/// A self-describing, encrypted object that can be opened with the right key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Sealed {
    /// Our heroic nonce
    nonce: SecretKeyNonce,
    /// The ciphertext
    ciphertext: BinaryVec,
    /// Optional additional associated data to store with the ciphertext.
    aad: Option<BinaryVec>,
}

impl Sealed {
    fn new(nonce: SecretKeyNonce, ciphertext: Vec<u8>, aad: Option<Vec<u8>>) -> Self {
        Self {
            nonce,
            ciphertext: BinaryVec::from(ciphertext),
            aad: aad.map(BinaryVec::from),
        }
    }
}

impl SerdeBinary for Sealed {}

/// A symmetric encryption key nonce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SecretKeyNonce {
    XChaCha20Poly1305(Binary<24>),
}

/// A symmetric encryption key
#[derive(Debug, Serialize, Deserialize)]
pub enum SecretKey {
    XChaCha20Poly1305(BinarySecret<32>),
}

impl SecretKey {
    /// Create a new xchacha20poly1305 key
    pub fn new_xchacha20poly1305<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Ok(Self::XChaCha20Poly1305(BinarySecret::new(randbuf)))
    }

    /// Try to create a SecretKey from a byte slice
    pub fn new_xchacha20poly1305_from_bytes(secret_bytes: [u8; 32]) -> Result<Self> {
        Ok(Self::XChaCha20Poly1305(BinarySecret::new(secret_bytes)))
    }

    /// Create a nonce for use with this secret key
    pub fn gen_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<SecretKeyNonce> {
        match self {
            SecretKey::XChaCha20Poly1305(_) => {
                let mut randbuf = [0u8; 24];
                rng.fill_bytes(&mut randbuf);
                Ok(SecretKeyNonce::XChaCha20Poly1305(Binary::new(randbuf)))
            }
        }
    }

    /// Encrypt a value with a secret key and a fresh random nonce
    pub fn seal<'msg, D: Into<DataWithAAD<'msg>>, R: RngCore + CryptoRng>(&self, rng: &mut R, data: D) -> Result<Sealed> {
        let nonce = self.gen_nonce(rng)?;
        self.seal_with_nonce(nonce, data)
    }

    /// Encrypt a value with a secret key/nonce
    pub fn seal_with_nonce<'msg, D: Into<DataWithAAD<'msg>>>(&self, nonce: SecretKeyNonce, data: D) -> Result<Sealed> {
        match (self, &nonce) {
            (SecretKey::XChaCha20Poly1305(ref key), SecretKeyNonce::XChaCha20Poly1305(ref nonce_bin)) => {
                let cipher = chacha20poly1305::XChaCha20Poly1305::new(key.expose_secret().into());
                let DataWithAAD { data, aad } = data.into();
                let payload = match aad.as_ref() {
                    Some(aad) => Payload { msg: data, aad },
                    None => data.into(),
                };
                let enc = cipher
                    .encrypt(chacha20poly1305::XNonce::from_slice(nonce_bin.as_slice()), payload)
                    .map_err(|_| Error::CryptoSealFailed)?;
                Ok(Sealed::new(nonce, enc, aad))
            }
        }
    }

    /// Decrypt a value with a secret key/nonce
    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>> {
        match (self, sealed.nonce()) {
            (SecretKey::XChaCha20Poly1305(ref key), SecretKeyNonce::XChaCha20Poly1305(ref nonce)) => {
                let cipher = chacha20poly1305::XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.expose_secret().as_slice()));
                let ciphertext = match sealed.aad().as_ref() {
                    Some(aad) => Payload {
                        msg: sealed.ciphertext().deref().as_slice(),
                        aad: aad.deref().as_slice(),
                    },
                    None => sealed.ciphertext().deref().as_slice().into(),
                };
                let dec = cipher
                    .decrypt(chacha20poly1305::XNonce::from_slice(nonce.as_slice()), ciphertext)
                    .map_err(|_| Error::CryptoOpenFailed)?;
                Ok(dec)
            }
        }
    }
}

impl Clone for SecretKey {
    fn clone(&self) -> Self {
        match self {
            Self::XChaCha20Poly1305(secret) => Self::XChaCha20Poly1305(secret.clone()),
        }
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::XChaCha20Poly1305(ref key) => key.expose_secret().as_ref(),
        }
    }
}
