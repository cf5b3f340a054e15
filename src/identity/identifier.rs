//! Public identifiers.
//!
//! An identifier is a Base58Check string derived from the signing public key:
//! a zero version byte, then the first 20 bytes of the blake3 hash of the key,
//! then a four byte checksum. The zero version byte means every identifier
//! starts with a "1". Identifiers can't be reversed back into a key and they
//! never change, so they work as the stable name of a feed.

use crate::{
    crypto::base::SignKeypairPublic,
    error::Error,
};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// The Base58Check version byte for identifiers.
pub const IDENTIFIER_VERSION: u8 = 0x00;

/// What every identifier starts with, thanks to the zero version byte.
pub const IDENTIFIER_LEAD: &str = "1";

/// How many hash bytes make it into the identifier.
const IDENTIFIER_PAYLOAD_LEN: usize = 20;

/// A feed identifier, derived one-way from a signing public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Derive the identifier for a signing public key. Same key in, same
    /// identifier out.
    pub fn from_public(public: &SignKeypairPublic) -> Self {
        let payload = Self::payload_for(public);
        Self(bs58::encode(payload).with_check_version(IDENTIFIER_VERSION).into_string())
    }

    /// Check whether this identifier belongs to the given public key.
    pub fn matches(&self, public: &SignKeypairPublic) -> bool {
        &Self::from_public(public) == self
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn payload_for(public: &SignKeypairPublic) -> [u8; IDENTIFIER_PAYLOAD_LEN] {
        let mut payload = [0u8; IDENTIFIER_PAYLOAD_LEN];
        let digest = blake3::hash(public.as_bytes());
        payload.copy_from_slice(&digest.as_bytes()[0..IDENTIFIER_PAYLOAD_LEN]);
        payload
    }
}

impl Deref for Identifier {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .with_check(Some(IDENTIFIER_VERSION))
            .into_vec()
            .map_err(|_| Error::IdentifierInvalid(s.into()))?;
        // the version byte may come back attached to the payload
        let payload_len = match decoded.len() {
            n if n == IDENTIFIER_PAYLOAD_LEN + 1 && decoded[0] == IDENTIFIER_VERSION => IDENTIFIER_PAYLOAD_LEN,
            n => n,
        };
        if payload_len != IDENTIFIER_PAYLOAD_LEN {
            Err(Error::IdentifierInvalid(s.into()))?;
        }
        Ok(Self(s.into()))
    }
}

impl TryFrom<String> for Identifier {
    type Error = Error;
    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::base::SignKeypair;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn identifier_starts_with_lead() {
        let mut rng = crate::util::test::rng();
        for _ in 0..50 {
            let keypair = SignKeypair::new_ed25519(&mut rng);
            let id = Identifier::from_public(&keypair.public());
            assert!(id.starts_with(IDENTIFIER_LEAD), "{}", id);
            assert!(id.matches(&keypair.public()));
        }
    }

    #[test]
    fn identifier_parse() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        let id = Identifier::from_public(&keypair.public());
        let parsed: Identifier = id.as_str().parse().unwrap();
        assert_eq!(parsed, id);

        // flip the last char and the checksum should catch it
        let mut broken = id.to_string();
        let last = broken.pop().unwrap();
        broken.push(if last == 'z' { 'y' } else { 'z' });
        assert_eq!(broken.parse::<Identifier>().err(), Some(Error::IdentifierInvalid(broken.clone())));

        assert!("".parse::<Identifier>().is_err());
        assert!("0OIl".parse::<Identifier>().is_err());
        // valid base58check, wrong version
        let wrong_version = bs58::encode([1u8; 20]).with_check_version(5).into_string();
        assert!(wrong_version.parse::<Identifier>().is_err());
    }

    #[test]
    fn identifier_serde() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        let id = Identifier::from_public(&keypair.public());
        let bytes = crate::util::ser::serialize(&id).unwrap();
        let back: Identifier = crate::util::ser::deserialize(&bytes).unwrap();
        assert_eq!(back, id);

        let bad = crate::util::ser::serialize(&String::from("1notanidentifier")).unwrap();
        let res: crate::error::Result<Identifier> = crate::util::ser::deserialize(&bad);
        assert!(res.is_err());
    }

    #[test]
    fn identifier_no_collisions() {
        let mut rng = crate::util::test::rng();
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            let keypair = SignKeypair::new_ed25519(&mut rng);
            assert!(seen.insert(Identifier::from_public(&keypair.public())));
        }
    }

    proptest! {
        #[test]
        fn identifier_is_deterministic(seed in any::<[u8; 32]>()) {
            let keypair = SignKeypair::new_ed25519_from_bytes(seed);
            let id1 = Identifier::from_public(&keypair.public());
            let id2 = Identifier::from_public(&keypair.public());
            prop_assert_eq!(&id1, &id2);
            prop_assert!(id1.starts_with(IDENTIFIER_LEAD));
            prop_assert_eq!(id1.as_str().parse::<Identifier>().unwrap(), id1);
        }

        #[test]
        fn identifier_distinct_keys_distinct_ids(seed1 in any::<[u8; 32]>(), seed2 in any::<[u8; 32]>()) {
            prop_assume!(seed1 != seed2);
            let id1 = Identifier::from_public(&SignKeypair::new_ed25519_from_bytes(seed1).public());
            let id2 = Identifier::from_public(&SignKeypair::new_ed25519_from_bytes(seed2).public());
            prop_assert_ne!(id1, id2);
        }
    }
}
