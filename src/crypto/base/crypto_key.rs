use crate::{
    crypto::base::{stretch_key, Hash, SignKeypair},
    error::{Error, Result},
    util::{
        ser::{self, Binary, BinarySecret},
        Public,
    },
};
use crypto_box::aead::{Aead, Payload};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// HKDF info string used when an encryption key has to be derived from a
/// signing seed.
const SHARED_KEY_INFO: &[u8] = b"trsst/crypto/shared-with-signing";

/// Build the (deterministic) nonce for an anonymous box from both public keys.
fn anonymous_nonce(ephemeral_pubkey: &[u8], recipient_pubkey: &[u8]) -> Result<crypto_box::aead::Nonce<crypto_box::ChaChaBox>> {
    let hash = Hash::new_blake3_multi(&[ephemeral_pubkey, recipient_pubkey])?;
    let nonce_arr: [u8; 24] = hash.as_bytes()[0..24].try_into().map_err(|_| Error::CryptoSealFailed)?;
    Ok(nonce_arr.into())
}

/// An asymmetric encryption keypair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CryptoKeypair {
    /// Curve25519XChaCha20Poly1305 keypair for encryption/decryption
    Curve25519XChaCha20Poly1305 { public: Binary<32>, secret: Option<BinarySecret<32>> },
}

impl CryptoKeypair {
    fn from_secret(secret: crypto_box::SecretKey) -> Self {
        let public = secret.public_key();
        Self::Curve25519XChaCha20Poly1305 {
            public: Binary::new(*public.as_bytes()),
            secret: Some(BinarySecret::new(secret.to_bytes())),
        }
    }

    /// Create a new keypair
    pub fn new_curve25519xchacha20poly1305<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = BinarySecret::new([0u8; 32]);
        rng.fill_bytes(randbuf.expose_secret_mut());
        Self::from_secret(crypto_box::SecretKey::from(*randbuf.expose_secret()))
    }

    /// Create a keypair from a raw secret key
    pub fn new_curve25519xchacha20poly1305_from_bytes(secret_bytes: [u8; 32]) -> Self {
        Self::from_secret(crypto_box::SecretKey::from(secret_bytes))
    }

    /// Derive an encryption keypair from a signing keypair's secret seed.
    ///
    /// The result is deterministic, so anyone holding the signing secret can
    /// always get back to the same encryption key. The signing bytes are run
    /// through HKDF first and never used as a curve25519 key directly.
    pub fn derive_from_sign(sign_keypair: &SignKeypair) -> Result<Self> {
        let seed = sign_keypair.secret().ok_or(Error::CryptoKeyMissing)?;
        let mut derived = BinarySecret::new([0u8; 32]);
        stretch_key(seed.expose_secret(), derived.expose_secret_mut(), Some(SHARED_KEY_INFO), None)?;
        Ok(Self::new_curve25519xchacha20poly1305_from_bytes(*derived.expose_secret()))
    }

    /// Rebuild a keypair from a stored public key and its secret, making sure
    /// the two actually belong together.
    pub fn from_parts(public: &CryptoKeypairPublic, secret_bytes: [u8; 32]) -> Result<Self> {
        let keypair = Self::new_curve25519xchacha20poly1305_from_bytes(secret_bytes);
        if &keypair.public() != public {
            Err(Error::CryptoAlgoMismatch)?;
        }
        Ok(keypair)
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> CryptoKeypairPublic {
        match self {
            Self::Curve25519XChaCha20Poly1305 { public, .. } => CryptoKeypairPublic::Curve25519XChaCha20Poly1305(public.clone()),
        }
    }

    /// The secret key bytes, if we have them.
    pub(crate) fn secret(&self) -> Option<&BinarySecret<32>> {
        match self {
            Self::Curve25519XChaCha20Poly1305 { secret, .. } => secret.as_ref(),
        }
    }

    /// Anonymously encrypt a message using our public key.
    pub fn seal_anonymous<R: RngCore + CryptoRng>(&self, rng: &mut R, data: &[u8]) -> Result<Vec<u8>> {
        self.public().seal_anonymous(rng, data)
    }

    /// Open an anonymous message encrypted with our public key. Requires the
    /// secret half of the keypair.
    pub fn open_anonymous(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Curve25519XChaCha20Poly1305 {
                public: ref pubkey,
                secret: ref seckey_opt,
            } => {
                let seckey_bytes = seckey_opt.as_ref().ok_or(Error::CryptoKeyMissing)?;
                let seckey = crypto_box::SecretKey::from(*seckey_bytes.expose_secret());
                if data.len() < 32 {
                    Err(Error::CryptoOpenFailed)?;
                }
                let ephemeral_pubkey_arr: [u8; 32] = data[0..32].try_into().map_err(|_| Error::CryptoOpenFailed)?;
                let ephemeral_pubkey = crypto_box::PublicKey::from(ephemeral_pubkey_arr);
                let ciphertext = &data[32..];
                let cardboard_box = crypto_box::ChaChaBox::new(&ephemeral_pubkey, &seckey);
                let nonce = anonymous_nonce(ephemeral_pubkey.as_bytes(), pubkey.deref())?;
                cardboard_box
                    .decrypt(&nonce, Payload::from(ciphertext))
                    .map_err(|_| Error::CryptoOpenFailed)
            }
        }
    }
}

impl Public for CryptoKeypair {
    fn strip_private(&self) -> Self {
        match self {
            Self::Curve25519XChaCha20Poly1305 { public: ref pubkey, .. } => Self::Curve25519XChaCha20Poly1305 {
                public: pubkey.clone(),
                secret: None,
            },
        }
    }

    fn has_private(&self) -> bool {
        match self {
            Self::Curve25519XChaCha20Poly1305 { secret: private_maybe, .. } => private_maybe.is_some(),
        }
    }
}

impl PartialEq for CryptoKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public() == other.public()
    }
}

/// An asymmetric encryption public key. This is what recipients hand out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CryptoKeypairPublic {
    /// Public key for Curve25519XChaCha20Poly1305
    Curve25519XChaCha20Poly1305(Binary<32>),
}

impl CryptoKeypairPublic {
    /// Anonymously encrypt a message to the holder of this public key.
    ///
    /// The output is the ephemeral public key followed by the ciphertext.
    /// Nobody (including us) can tell who sent it.
    pub fn seal_anonymous<R: RngCore + CryptoRng>(&self, rng: &mut R, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Curve25519XChaCha20Poly1305(ref pubkey) => {
                let mut randbuf = BinarySecret::new([0u8; 32]);
                rng.fill_bytes(randbuf.expose_secret_mut());
                let ephemeral_secret = crypto_box::SecretKey::from(*randbuf.expose_secret());
                let ephemeral_pubkey = ephemeral_secret.public_key();
                let cardboard_box = crypto_box::ChaChaBox::new(&crypto_box::PublicKey::from(*pubkey.deref()), &ephemeral_secret);
                let nonce = anonymous_nonce(ephemeral_pubkey.as_bytes(), pubkey.deref())?;
                let mut enc = cardboard_box
                    .encrypt(&nonce, Payload::from(data))
                    .map_err(|_| Error::CryptoSealFailed)?;
                let mut pubvec = Vec::from(ephemeral_pubkey.as_bytes().as_slice());
                pubvec.append(&mut enc);
                Ok(pubvec)
            }
        }
    }

    /// The raw public key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Curve25519XChaCha20Poly1305(pubkey) => pubkey.as_ref(),
        }
    }
}

impl std::fmt::Display for CryptoKeypairPublic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ser::base64_encode(self.as_bytes()))
    }
}

impl FromStr for CryptoKeypairPublic {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = ser::base64_decode(s.trim())?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::CryptoAlgoMismatch)?;
        Ok(Self::Curve25519XChaCha20Poly1305(Binary::new(arr)))
    }
}

impl From<CryptoKeypair> for CryptoKeypairPublic {
    fn from(kp: CryptoKeypair) -> Self {
        kp.public()
    }
}
