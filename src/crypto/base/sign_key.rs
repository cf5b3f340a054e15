use crate::{
    error::{Error, Result},
    util::{
        ser::{self, Binary, BinarySecret},
        Public,
    },
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// The name we give ed25519 wherever an algorithm has to be spelled out.
pub const SIGN_ALGO_ED25519: &str = "Ed25519";

/// A signature derived from a signing keypair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignKeypairSignature {
    Ed25519(Binary<64>),
}

impl AsRef<[u8]> for SignKeypairSignature {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(sig) => sig.as_ref(),
        }
    }
}

/// An asymmetric signing keypair.
///
/// The secret half lives in memory as plain (zeroize-on-drop) bytes. Sealing
/// it at rest is the keystore's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SignKeypair {
    /// Ed25519 signing keypair
    Ed25519 { public: Binary<32>, secret: Option<BinarySecret<32>> },
}

impl SignKeypair {
    fn new_ed25519_from_secret(secret: ed25519_consensus::SigningKey) -> Self {
        let public = secret.verification_key();
        Self::Ed25519 {
            public: Binary::new(public.to_bytes()),
            secret: Some(BinarySecret::new(secret.to_bytes())),
        }
    }

    /// Create a new ed25519 keypair
    pub fn new_ed25519<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = BinarySecret::new([0u8; 32]);
        rng.fill_bytes(randbuf.expose_secret_mut());
        let secret = ed25519_consensus::SigningKey::from(*randbuf.expose_secret());
        Self::new_ed25519_from_secret(secret)
    }

    /// Create a new ed25519 keypair from a cryptographic seed
    pub fn new_ed25519_from_bytes(secret_bytes: [u8; 32]) -> Self {
        let secret = ed25519_consensus::SigningKey::from(secret_bytes);
        Self::new_ed25519_from_secret(secret)
    }

    /// Rebuild a keypair from a stored public key and its secret seed, making
    /// sure the two actually belong together.
    pub fn from_parts(public: &SignKeypairPublic, secret_bytes: [u8; 32]) -> Result<Self> {
        let keypair = Self::new_ed25519_from_bytes(secret_bytes);
        if &keypair.public() != public {
            Err(Error::CryptoAlgoMismatch)?;
        }
        Ok(keypair)
    }

    /// Sign a value with our secret key. Fails if we only hold the public half.
    pub fn sign(&self, data: &[u8]) -> Result<SignKeypairSignature> {
        match self {
            Self::Ed25519 { secret: ref sec_opt, .. } => {
                let sec = sec_opt.as_ref().ok_or(Error::CryptoKeyMissing)?;
                let seckey = ed25519_consensus::SigningKey::from(*sec.expose_secret());
                let sig_obj = seckey.sign(data);
                Ok(SignKeypairSignature::Ed25519(Binary::new(sig_obj.to_bytes())))
            }
        }
    }

    /// Verify a value with a detached signature given the public key of the
    /// signer.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        self.public().verify(signature, data)
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> SignKeypairPublic {
        match self {
            Self::Ed25519 { public, .. } => SignKeypairPublic::Ed25519(public.clone()),
        }
    }

    /// The secret seed, if we have it.
    pub(crate) fn secret(&self) -> Option<&BinarySecret<32>> {
        match self {
            Self::Ed25519 { secret, .. } => secret.as_ref(),
        }
    }

    /// The algorithm name for this keypair.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Ed25519 { .. } => SIGN_ALGO_ED25519,
        }
    }
}

impl Public for SignKeypair {
    fn strip_private(&self) -> Self {
        match self {
            Self::Ed25519 { public: pubkey, .. } => Self::Ed25519 {
                public: pubkey.clone(),
                secret: None,
            },
        }
    }

    fn has_private(&self) -> bool {
        match self {
            Self::Ed25519 { secret: private_maybe, .. } => private_maybe.is_some(),
        }
    }
}

impl PartialEq for SignKeypair {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ed25519 { public: public1, .. }, Self::Ed25519 { public: public2, .. }) => public1 == public2,
        }
    }
}

/// An asymmetric signing public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignKeypairPublic {
    /// Ed25519 signing public key
    Ed25519(Binary<32>),
}

impl SignKeypairPublic {
    /// Verify a value with a detached signature given the public key of the
    /// signer.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        match (self, signature) {
            (Self::Ed25519(ref pubkey_bytes), SignKeypairSignature::Ed25519(ref sig_bytes)) => {
                let pubkey = ed25519_consensus::VerificationKey::try_from(*pubkey_bytes.deref())
                    .map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                let sig = ed25519_consensus::Signature::from(*sig_bytes.deref());
                pubkey.verify(&sig, data).map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                Ok(())
            }
        }
    }

    /// The raw public key bytes. Identifiers are derived from these.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(pubkey) => pubkey.as_ref(),
        }
    }

    /// The algorithm name for this key.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => SIGN_ALGO_ED25519,
        }
    }
}

impl std::fmt::Display for SignKeypairPublic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ser::base64_encode(self.as_bytes()))
    }
}

impl FromStr for SignKeypairPublic {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = ser::base64_decode(s)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::CryptoAlgoMismatch)?;
        ed25519_consensus::VerificationKey::try_from(arr).map_err(|_| Error::CryptoAlgoMismatch)?;
        Ok(Self::Ed25519(Binary::new(arr)))
    }
}

impl From<SignKeypair> for SignKeypairPublic {
    fn from(kp: SignKeypair) -> Self {
        kp.public()
    }
}
