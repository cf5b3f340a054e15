//! This module holds the identity structure and its key handling.
//!
//! An identity is a signing keypair (which every entry we publish is signed
//! with), a source for an encryption keypair (which people use to address
//! entries to us), and the identifier derived from the signing key.

use crate::{
    credential::Password,
    crypto::base::{CryptoKeypair, CryptoKeypairPublic, KdfParams, SignKeypair},
    error::{Error, Result},
    identity::Identifier,
    keystore::{certificate::Certificate, write_key_pairs, KeyAlias, KeyPair, KeyRole, KeyStore},
};
use rand::{CryptoRng, RngCore};
use std::path::Path;
use tracing::debug;

/// Where an identity's encryption keys come from.
#[derive(Debug, Clone, PartialEq)]
pub enum EncryptionKeySource {
    /// The identity has its own encryption keypair.
    Dedicated(CryptoKeypair),
    /// No separate encryption keypair exists, so one is derived from the
    /// signing secret whenever it's needed (see
    /// [`CryptoKeypair::derive_from_sign`]). Both the posting and the
    /// pulling side use the same derived key.
    SharedWithSigning,
}

/// A publishing identity.
#[derive(Debug, Clone, PartialEq, getset::Getters)]
#[getset(get = "pub")]
pub struct Identity {
    /// Derived from the signing public key, never changes.
    identifier: Identifier,
    /// Signs everything we publish.
    signing: SignKeypair,
    /// How we get our encryption keypair.
    encryption: EncryptionKeySource,
}

impl Identity {
    /// Build an identity around existing keys.
    pub fn new(signing: SignKeypair, encryption: EncryptionKeySource) -> Self {
        let identifier = Identifier::from_public(&signing.public());
        Self {
            identifier,
            signing,
            encryption,
        }
    }

    /// Generate a brand new identity with its own encryption keypair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let signing = SignKeypair::new_ed25519(rng);
        let encryption = CryptoKeypair::new_curve25519xchacha20poly1305(rng);
        Self::new(signing, EncryptionKeySource::Dedicated(encryption))
    }

    /// The keypair we decrypt with and advertise to others.
    pub fn encryption_keypair(&self) -> Result<CryptoKeypair> {
        match &self.encryption {
            EncryptionKeySource::Dedicated(keypair) => Ok(keypair.clone()),
            EncryptionKeySource::SharedWithSigning => CryptoKeypair::derive_from_sign(&self.signing),
        }
    }

    /// The public key others should encrypt entries to.
    pub fn encryption_public(&self) -> Result<CryptoKeypairPublic> {
        Ok(self.encryption_keypair()?.public())
    }

    /// All the keys we should try when opening an envelope, best guess first.
    pub fn decryption_keys(&self) -> Result<DecryptionKeys> {
        DecryptionKeys::from_identity(self)
    }

    /// Write this identity's keys into the keystore at `path`, merging with
    /// whatever is already in there. The encryption key is only written when
    /// it's a dedicated one. Both keys go out in one write.
    pub fn save<R: RngCore + CryptoRng, P: AsRef<Path>>(&self, rng: &mut R, path: P, password: &Password, kdf: &KdfParams) -> Result<()> {
        let path = path.as_ref();
        let sign_alias = KeyAlias::new(self.identifier.clone(), KeyRole::Sign);
        let sign_pair = KeyPair::Sign(self.signing.clone());
        let sign_cert = Certificate::generate(&sign_pair, &self.signing, self.signing.algorithm_name())?;
        let crypto = match &self.encryption {
            EncryptionKeySource::Dedicated(encryption) => {
                let crypto_pair = KeyPair::Crypto(encryption.clone());
                let crypto_cert = Certificate::generate(&crypto_pair, &self.signing, self.signing.algorithm_name())?;
                Some((KeyAlias::new(self.identifier.clone(), KeyRole::Encrypt), crypto_pair, crypto_cert))
            }
            EncryptionKeySource::SharedWithSigning => None,
        };
        let mut entries = vec![(&sign_alias, &sign_pair, &sign_cert)];
        if let Some((alias, pair, cert)) = crypto.as_ref() {
            entries.push((alias, pair, cert));
        }
        write_key_pairs(rng, path, password, &entries, kdf)?;
        debug!(identifier = %self.identifier, path = %path.display(), "saved identity");
        Ok(())
    }

    /// Load an identity from the keystore at `path`.
    ///
    /// The signing key must be present. If there's no encryption key the
    /// identity falls back to [`EncryptionKeySource::SharedWithSigning`].
    pub fn load<P: AsRef<Path>>(path: P, password: &Password, identifier: &Identifier) -> Result<Self> {
        let store = KeyStore::open(path, password)?;
        Self::from_keystore(&store, identifier)
    }

    /// Pull an identity out of an already-opened keystore.
    pub fn from_keystore(store: &KeyStore, identifier: &Identifier) -> Result<Self> {
        let signing = store
            .read_key_pair(&KeyAlias::new(identifier.clone(), KeyRole::Sign))?
            .into_sign()?;
        if !identifier.matches(&signing.public()) {
            Err(Error::FeedIDMismatch)?;
        }
        let encryption = match store.read_key_pair(&KeyAlias::new(identifier.clone(), KeyRole::Encrypt)) {
            Ok(keypair) => EncryptionKeySource::Dedicated(keypair.into_crypto()?),
            Err(Error::KeystoreAliasNotFound(_)) => {
                debug!(identifier = %identifier, "no encryption key stored, deriving one from the signing key");
                EncryptionKeySource::SharedWithSigning
            }
            Err(e) => Err(e)?,
        };
        Ok(Self::new(signing, encryption))
    }
}

/// An ordered list of keys to try when opening envelopes.
#[derive(Debug, Clone, Default)]
pub struct DecryptionKeys(Vec<CryptoKeypair>);

impl DecryptionKeys {
    /// Gather an identity's decryption keys. A dedicated encryption key comes
    /// first, followed by the key derived from the signing secret so entries
    /// sent while we had no dedicated key still open.
    pub fn from_identity(identity: &Identity) -> Result<Self> {
        let derived = CryptoKeypair::derive_from_sign(identity.signing())?;
        let keys = match identity.encryption() {
            EncryptionKeySource::Dedicated(keypair) => vec![keypair.clone(), derived],
            EncryptionKeySource::SharedWithSigning => vec![derived],
        };
        Ok(Self(keys))
    }

    /// Iterate over the keys in the order they should be tried.
    pub fn iter(&self) -> impl Iterator<Item = &CryptoKeypair> {
        self.0.iter()
    }

    /// How many keys we hold.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Do we hold any keys at all?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The public halves, mostly useful for checking whether an entry was
    /// addressed to one of our keys.
    pub fn publics(&self) -> Vec<CryptoKeypairPublic> {
        self.0.iter().map(|k| k.public()).collect()
    }
}

impl From<Vec<CryptoKeypair>> for DecryptionKeys {
    fn from(keys: Vec<CryptoKeypair>) -> Self {
        Self(keys)
    }
}
