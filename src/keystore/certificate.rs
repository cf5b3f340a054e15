//! Self-signed certificates for keystore entries.
//!
//! Every keystore entry carries a certificate binding its public key to a
//! fixed subject. These certificates say nothing about who owns the key: the
//! subject is the same for everyone and the signature comes from the very
//! identity being "certified". Never treat one as proof of identity.

use crate::{
    crypto::base::{SignKeypair, SignKeypairPublic, SIGN_ALGO_ED25519},
    error::{Error, Result},
    keystore::{KeyPair, KeyPublic},
    util::{sign::SignedValue, Timestamp},
};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// The subject (and issuer) of every keystore certificate.
pub const CERTIFICATE_SUBJECT: &str = "CN=Trsst Keystore,DC=trsst,DC=com";

/// How long a keystore certificate is valid for.
pub const CERTIFICATE_VALIDITY_YEARS: u32 = 100;

/// The algorithm a certificate is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    Ed25519,
}

impl SignatureAlgorithm {
    /// The canonical name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ed25519 => SIGN_ALGO_ED25519,
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(SIGN_ALGO_ED25519) {
            Ok(Self::Ed25519)
        } else {
            Err(Error::CryptoAlgoMismatch)
        }
    }
}

/// Whether the certified key may act as a CA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BasicConstraints {
    ca: bool,
    critical: bool,
}

/// What the certified key may be used for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::CopyGetters)]
#[getset(get_copy = "pub")]
pub struct KeyUsage {
    digital_signature: bool,
    key_encipherment: bool,
    key_cert_sign: bool,
    crl_sign: bool,
    critical: bool,
}

/// The signed portion of a certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct CertificateBody {
    /// Milliseconds since epoch at creation time.
    serial: u64,
    subject: String,
    issuer: String,
    not_before: Timestamp,
    not_after: Timestamp,
    public_key: KeyPublic,
    signature_algorithm: SignatureAlgorithm,
    basic_constraints: BasicConstraints,
    key_usage: KeyUsage,
}

/// A self-signed certificate over a keystore entry's public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate(SignedValue<CertificateBody>);

impl Certificate {
    /// Create a certificate for `key`, signed by `signer` with the named
    /// algorithm. For the signing key itself `key` and `signer` are the same
    /// keypair.
    pub fn generate(key: &KeyPair, signer: &SignKeypair, algorithm_name: &str) -> Result<Self> {
        let signature_algorithm = SignatureAlgorithm::from_str(algorithm_name)?;
        if signature_algorithm.name() != signer.algorithm_name() {
            Err(Error::CryptoAlgoMismatch)?;
        }
        let not_before = Timestamp::now();
        let not_after = not_before.add_years(CERTIFICATE_VALIDITY_YEARS).ok_or(Error::CryptoSignatureFailed)?;
        let body = CertificateBody {
            serial: u64::try_from(not_before.timestamp_millis()).unwrap_or_default(),
            subject: CERTIFICATE_SUBJECT.into(),
            issuer: CERTIFICATE_SUBJECT.into(),
            not_before,
            not_after,
            public_key: key.public(),
            signature_algorithm,
            basic_constraints: BasicConstraints { ca: false, critical: true },
            key_usage: KeyUsage {
                digital_signature: true,
                key_encipherment: true,
                key_cert_sign: true,
                crl_sign: true,
                critical: true,
            },
        };
        Ok(Self(SignedValue::new(signer, body)?))
    }

    /// Check the certificate's signature against the identity's signing key.
    /// This only proves the certificate wasn't tampered with.
    pub fn verify(&self, signer: &SignKeypairPublic) -> Result<()> {
        self.0.verify_value(signer)
    }

    /// Does this certificate cover the given public key?
    pub fn covers(&self, public: &KeyPublic) -> bool {
        self.0.public_key() == public
    }
}

impl Deref for Certificate {
    type Target = CertificateBody;
    fn deref(&self) -> &Self::Target {
        self.0.value()
    }
}
