//! Includes some utilities helpful for generating signatures.

use crate::{
    crypto::base::{SignKeypair, SignKeypairPublic, SignKeypairSignature},
    error::{Error, Result},
    util::ser,
};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

/// A struct that wraps any type and requires it to be signed in order to be
/// created. The signature covers the full (msgpack) serialization of the
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct SignedValue<T> {
    /// The value we wish to sign.
    value: T,
    /// The signature for our value.
    signature: SignKeypairSignature,
}

impl<T: serde::Serialize> SignedValue<T> {
    /// Create a new signed value. The keypair must hold its secret half.
    pub fn new(sign_keypair: &SignKeypair, value: T) -> Result<Self> {
        let serialized = ser::serialize(&value)?;
        let signature = sign_keypair.sign(&serialized).map_err(|_| Error::CryptoSignatureFailed)?;
        Ok(Self { value, signature })
    }

    /// Make sure the stored value's signature can be verified with the given
    /// public key.
    pub fn verify_value(&self, public: &SignKeypairPublic) -> Result<()> {
        let serialized = ser::serialize(&self.value)?;
        public.verify(&self.signature, &serialized)
    }

    /// Unwrap the value, dropping the signature.
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> Deref for SignedValue<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Public;

    #[test]
    fn signed_value_verify() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        let signed = SignedValue::new(&keypair, String::from("the old man leaned back in his chair")).unwrap();
        assert_eq!(signed.deref(), "the old man leaned back in his chair");
        signed.verify_value(&keypair.public()).unwrap();

        let other = SignKeypair::new_ed25519(&mut rng);
        assert_eq!(signed.verify_value(&other.public()), Err(Error::CryptoSignatureVerificationFailed));

        let mut tampered = signed.clone();
        *tampered.value_mut() = String::from("the old man leaned forward in his chair");
        assert_eq!(tampered.verify_value(&keypair.public()), Err(Error::CryptoSignatureVerificationFailed));
    }

    #[test]
    fn signed_value_needs_secret() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng).strip_private();
        let res = SignedValue::new(&keypair, 42u32);
        assert_eq!(res.err(), Some(Error::CryptoSignatureFailed));
    }
}
