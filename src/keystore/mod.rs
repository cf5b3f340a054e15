//! A password-protected, file-backed store for key material.
//!
//! A keystore file holds any number of entries, each one a keypair plus a
//! [`Certificate`] under a structured [`KeyAlias`] (identifier + role). On
//! disk it looks like this:
//!
//! ```text
//! msgpack {
//!     header: { version, kdf: { ops, mem }, salt },
//!     body:   Sealed(msgpack [ StoredEntry, ... ]),   // aad = header bytes
//! }
//! ```
//!
//! The master key is Argon2id(password, salt). The body is sealed with the
//! master key, and on top of that the secret half of each entry is sealed with
//! its own key stretched from the master key and the alias. Opening a store
//! decrypts the body but leaves each secret sealed until it's asked for.
//!
//! Writes are load-then-merge-then-replace: the existing file (if any) is
//! opened with the same password, the new entry replaces any entry with the
//! same alias, and the whole thing is written to a temp file in the same
//! directory, synced, and renamed over the original. If anything fails along
//! the way the original file is left alone.
//!
//! There is no file locking. Two processes writing the same keystore at the
//! same time will see the last writer win.

pub mod certificate;

use crate::{
    credential::Password,
    crypto::{
        base::{
            derive_secret_key, stretch_key, CryptoKeypair, CryptoKeypairPublic, DataWithAAD, KdfParams, Sealed, SecretKey,
            SignKeypair, SignKeypairPublic,
        },
        private::Private,
    },
    error::{Error, Result},
    identity::Identifier,
    util::ser::{self, Binary, BinarySecret},
};
use certificate::Certificate;
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// The current keystore file format version.
pub const KEYSTORE_VERSION: u16 = 1;

/// What a key in the keystore is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRole {
    /// Signs entries.
    Sign,
    /// Opens envelopes addressed to us.
    Encrypt,
}

impl KeyRole {
    /// The role's short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Encrypt => "encrypt",
        }
    }
}

/// Names a keystore entry. Stored structurally, so nothing about the format
/// of an identifier can make two aliases collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct KeyAlias {
    identifier: Identifier,
    role: KeyRole,
}

impl KeyAlias {
    /// Create a new alias.
    pub fn new(identifier: Identifier, role: KeyRole) -> Self {
        Self { identifier, role }
    }
}

impl std::fmt::Display for KeyAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.identifier, self.role.as_str())
    }
}

/// A keypair that can live in a keystore.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPair {
    Sign(SignKeypair),
    Crypto(CryptoKeypair),
}

impl KeyPair {
    /// The public half of this keypair.
    pub fn public(&self) -> KeyPublic {
        match self {
            Self::Sign(keypair) => KeyPublic::Sign(keypair.public()),
            Self::Crypto(keypair) => KeyPublic::Crypto(keypair.public()),
        }
    }

    /// Grab the signing keypair, or complain if this is some other type.
    pub fn into_sign(self) -> Result<SignKeypair> {
        match self {
            Self::Sign(keypair) => Ok(keypair),
            other => Err(Error::KeystoreKeyWrongType(format!("{:?}", other.public()))),
        }
    }

    /// Grab the encryption keypair, or complain if this is some other type.
    pub fn into_crypto(self) -> Result<CryptoKeypair> {
        match self {
            Self::Crypto(keypair) => Ok(keypair),
            other => Err(Error::KeystoreKeyWrongType(format!("{:?}", other.public()))),
        }
    }

    fn secret_bytes(&self) -> Option<&BinarySecret<32>> {
        match self {
            Self::Sign(keypair) => keypair.secret(),
            Self::Crypto(keypair) => keypair.secret(),
        }
    }
}

/// The public half of a [`KeyPair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPublic {
    Sign(SignKeypairPublic),
    Crypto(CryptoKeypairPublic),
}

/// The file header. Its serialized bytes are bound to the body as AAD, so
/// fiddling with the KDF params or salt breaks decryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct KeystoreHeader {
    version: u16,
    kdf: KdfParams,
    salt: Binary<16>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeystoreFile {
    header: KeystoreHeader,
    body: Sealed,
}

/// One entry, with its secret still sealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    alias: KeyAlias,
    public: KeyPublic,
    secret: Private<BinarySecret<32>>,
    certificate: Certificate,
}

/// An opened keystore. Holds the master key and the decrypted entry list;
/// entry secrets are only unsealed in [`KeyStore::read_key_pair`].
pub struct KeyStore {
    path: PathBuf,
    header: KeystoreHeader,
    master_key: SecretKey,
    entries: Vec<StoredEntry>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("path", &self.path)
            .field("aliases", &self.entries.iter().map(|e| e.alias.to_string()).collect::<Vec<_>>())
            .finish()
    }
}

/// Derive the key that seals one entry's secret.
fn entry_key(master_key: &SecretKey, alias: &KeyAlias) -> Result<SecretKey> {
    let info = format!("trsst/keystore/entry/{}", alias);
    let mut key = BinarySecret::new([0u8; 32]);
    stretch_key(master_key.as_ref(), key.expose_secret_mut(), Some(info.as_bytes()), None)?;
    SecretKey::new_xchacha20poly1305_from_bytes(*key.expose_secret())
}

impl KeyStore {
    /// Open and decrypt the keystore at `path`.
    ///
    /// Fails with [`Error::KeystoreNotFound`] if there's no file, and
    /// [`Error::KeystoreDecryption`] if the password is wrong or the file is
    /// damaged. Those two cases can't be told apart, on purpose.
    pub fn open<P: AsRef<Path>>(path: P, password: &Password) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::KeystoreNotFound(path.display().to_string()))?,
            Err(e) => Err(e)?,
        };
        let file: KeystoreFile = ser::deserialize(&contents).map_err(|e| {
            warn!(path = %path.display(), error = %e, "keystore file could not be parsed");
            Error::KeystoreDecryption
        })?;
        let KeystoreFile { header, body } = file;
        if header.version != KEYSTORE_VERSION || !header.kdf.is_sane() {
            warn!(path = %path.display(), version = header.version, "keystore header rejected");
            Err(Error::KeystoreDecryption)?;
        }
        let header_bytes = ser::serialize(&header)?;
        if body.aad().as_ref().map(|aad| aad.as_slice()) != Some(header_bytes.as_slice()) {
            Err(Error::KeystoreDecryption)?;
        }
        let master_key = derive_secret_key(password.as_bytes(), header.salt.as_ref(), &header.kdf)?;
        let plaintext = Zeroizing::new(master_key.open(&body).map_err(|_| Error::KeystoreDecryption)?);
        let entries: Vec<StoredEntry> = ser::deserialize(&plaintext).map_err(|_| Error::KeystoreDecryption)?;
        debug!(path = %path.display(), entries = entries.len(), "opened keystore");
        Ok(Self {
            path: path.to_path_buf(),
            header,
            master_key,
            entries,
        })
    }

    /// Start a fresh, empty keystore (in memory only until written). The KDF
    /// params have to pass the same check [`KeyStore::open`] applies, or we'd
    /// write a file nobody can open.
    fn create<R: RngCore + CryptoRng, P: AsRef<Path>>(rng: &mut R, path: P, password: &Password, kdf: &KdfParams) -> Result<Self> {
        kdf.check()?;
        let mut salt = [0u8; 16];
        rng.fill_bytes(&mut salt);
        let header = KeystoreHeader {
            version: KEYSTORE_VERSION,
            kdf: kdf.clone(),
            salt: Binary::new(salt),
        };
        let master_key = derive_secret_key(password.as_bytes(), header.salt.as_ref(), &header.kdf)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            header,
            master_key,
            entries: Vec::new(),
        })
    }

    /// Where this keystore lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All the aliases in this keystore.
    pub fn aliases(&self) -> impl Iterator<Item = &KeyAlias> {
        self.entries.iter().map(|e| &e.alias)
    }

    /// Is there an entry under this alias?
    pub fn contains(&self, alias: &KeyAlias) -> bool {
        self.find(alias).is_some()
    }

    fn find(&self, alias: &KeyAlias) -> Option<&StoredEntry> {
        self.entries.iter().find(|e| &e.alias == alias)
    }

    /// Read (and unseal) the keypair stored under `alias`.
    pub fn read_key_pair(&self, alias: &KeyAlias) -> Result<KeyPair> {
        let entry = self.find(alias).ok_or_else(|| Error::KeystoreAliasNotFound(alias.to_string()))?;
        let seal_key = entry_key(&self.master_key, alias)?;
        let secret = entry.secret.open(&seal_key).map_err(|_| Error::KeystoreDecryption)?;
        let keypair = match &entry.public {
            KeyPublic::Sign(public) => KeyPair::Sign(SignKeypair::from_parts(public, *secret.expose_secret())?),
            KeyPublic::Crypto(public) => KeyPair::Crypto(CryptoKeypair::from_parts(public, *secret.expose_secret())?),
        };
        Ok(keypair)
    }

    /// The certificate stored with `alias`.
    pub fn certificate(&self, alias: &KeyAlias) -> Result<&Certificate> {
        self.find(alias)
            .map(|e| &e.certificate)
            .ok_or_else(|| Error::KeystoreAliasNotFound(alias.to_string()))
    }

    /// Add an entry, replacing anything already stored under the same alias.
    fn merge<R: RngCore + CryptoRng>(&mut self, rng: &mut R, alias: &KeyAlias, keypair: &KeyPair, certificate: &Certificate) -> Result<()> {
        let secret_bytes = keypair.secret_bytes().ok_or(Error::CryptoKeyMissing)?;
        let seal_key = entry_key(&self.master_key, alias)?;
        let entry = StoredEntry {
            alias: alias.clone(),
            public: keypair.public(),
            secret: Private::seal(rng, &seal_key, secret_bytes)?,
            certificate: certificate.clone(),
        };
        match self.entries.iter_mut().find(|e| &e.alias == alias) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Serialize and seal the whole store, then atomically replace the file.
    fn persist<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<()> {
        let header_bytes = ser::serialize(&self.header)?;
        let plaintext = Zeroizing::new(ser::serialize(&self.entries)?);
        let body = self.master_key.seal(rng, DataWithAAD::new(&plaintext, header_bytes))?;
        let file = KeystoreFile {
            header: self.header.clone(),
            body,
        };
        let bytes = ser::serialize(&file)?;
        write_atomic(&self.path, &bytes)
    }
}

/// Write `bytes` to a temp file next to `path`, sync it, and rename it into
/// place. The original file stays put if any step fails.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_failed = |e: std::io::Error| Error::KeystoreWriteFailed(format!("{}: {}", path.display(), e));
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_failed)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

/// Store `keypair` and its certificate under `alias` in the keystore at
/// `path`.
///
/// If the file exists it is opened with `password` (so the wrong password
/// fails with [`Error::KeystoreDecryption`] and changes nothing) and the entry
/// is merged in, keeping the file's existing KDF params and salt. Otherwise a
/// new keystore is started with `kdf`. Either way the full store is rewritten
/// atomically.
pub fn write_key_pair<R: RngCore + CryptoRng, P: AsRef<Path>>(
    rng: &mut R,
    path: P,
    password: &Password,
    alias: &KeyAlias,
    keypair: &KeyPair,
    certificate: &Certificate,
    kdf: &KdfParams,
) -> Result<()> {
    write_key_pairs(rng, path, password, &[(alias, keypair, certificate)], kdf)
}

/// Same as [`write_key_pair`], for several entries at once. All of them land
/// in a single write, or none do.
pub fn write_key_pairs<R: RngCore + CryptoRng, P: AsRef<Path>>(
    rng: &mut R,
    path: P,
    password: &Password,
    entries: &[(&KeyAlias, &KeyPair, &Certificate)],
    kdf: &KdfParams,
) -> Result<()> {
    let path = path.as_ref();
    let mut store = if path.exists() {
        KeyStore::open(path, password)?
    } else {
        KeyStore::create(rng, path, password, kdf)?
    };
    for (alias, keypair, certificate) in entries {
        store.merge(rng, alias, keypair, certificate)?;
    }
    store.persist(rng)?;
    for (alias, _, _) in entries {
        debug!(alias = %alias, path = %path.display(), "wrote keystore entry");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity::Identity, util::test};

    fn sign_entry(identity: &Identity) -> (KeyAlias, KeyPair, Certificate) {
        let alias = KeyAlias::new(identity.identifier().clone(), KeyRole::Sign);
        let keypair = KeyPair::Sign(identity.signing().clone());
        let cert = Certificate::generate(&keypair, identity.signing(), "Ed25519").unwrap();
        (alias, keypair, cert)
    }

    fn crypto_entry(identity: &Identity) -> (KeyAlias, KeyPair, Certificate) {
        let alias = KeyAlias::new(identity.identifier().clone(), KeyRole::Encrypt);
        let keypair = KeyPair::Crypto(identity.encryption_keypair().unwrap());
        let cert = Certificate::generate(&keypair, identity.signing(), "Ed25519").unwrap();
        (alias, keypair, cert)
    }

    #[test]
    fn alias_display() {
        let (_rng, identity) = test::setup_identity();
        let alias = KeyAlias::new(identity.identifier().clone(), KeyRole::Sign);
        assert_eq!(alias.to_string(), format!("{}-sign", identity.identifier()));
        let alias = KeyAlias::new(identity.identifier().clone(), KeyRole::Encrypt);
        assert_eq!(alias.to_string(), format!("{}-encrypt", identity.identifier()));
    }

    #[test]
    fn write_read_roundtrip() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();

        let store = KeyStore::open(&path, &password).unwrap();
        let read = store.read_key_pair(&alias).unwrap();
        assert_eq!(read.public(), keypair.public());
        let signing = read.into_sign().unwrap();
        let sig = signing.sign(b"hello").unwrap();
        identity.signing().verify(&sig, b"hello").unwrap();

        let stored_cert = store.certificate(&alias).unwrap();
        assert_eq!(stored_cert, &cert);
        stored_cert.verify(&identity.signing().public()).unwrap();
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn wrong_password_fails() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &test::password("secret1"), &alias, &keypair, &cert, &test::kdf()).unwrap();
        for wrong in ["secret2", "Secret1", "secret1 ", "hunter22"] {
            let res = KeyStore::open(&path, &test::password(wrong));
            assert_eq!(res.err(), Some(Error::KeystoreDecryption));
        }
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing-here.keystore");
        let res = KeyStore::open(&path, &test::password("secret1"));
        assert!(matches!(res, Err(Error::KeystoreNotFound(_))));
    }

    #[test]
    fn open_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.keystore");
        std::fs::write(&path, b"this is not a keystore").unwrap();
        let res = KeyStore::open(&path, &test::password("secret1"));
        assert_eq!(res.err(), Some(Error::KeystoreDecryption));
    }

    #[test]
    fn open_tampered_header() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();

        let mut file: KeystoreFile = ser::deserialize(&std::fs::read(&path).unwrap()).unwrap();
        file.header.kdf = KdfParams::new(2, 64);
        std::fs::write(&path, ser::serialize(&file).unwrap()).unwrap();
        let res = KeyStore::open(&path, &password);
        assert_eq!(res.err(), Some(Error::KeystoreDecryption));
    }

    #[test]
    fn missing_alias() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();
        let store = KeyStore::open(&path, &password).unwrap();
        let enc_alias = KeyAlias::new(identity.identifier().clone(), KeyRole::Encrypt);
        assert!(!store.contains(&enc_alias));
        assert_eq!(store.read_key_pair(&enc_alias).err(), Some(Error::KeystoreAliasNotFound(enc_alias.to_string())));
        assert!(store.certificate(&enc_alias).is_err());
    }

    #[test]
    fn merge_keeps_earlier_aliases() {
        let (mut rng, identity) = test::setup_identity();
        let other = Identity::generate(&mut rng);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("many.keystore");
        let password = test::password("secret1");

        let (alias1, keypair1, cert1) = sign_entry(&identity);
        let (alias2, keypair2, cert2) = crypto_entry(&identity);
        let (alias3, keypair3, cert3) = sign_entry(&other);
        write_key_pair(&mut rng, &path, &password, &alias1, &keypair1, &cert1, &test::kdf()).unwrap();
        write_key_pair(&mut rng, &path, &password, &alias2, &keypair2, &cert2, &test::kdf()).unwrap();
        write_key_pair(&mut rng, &path, &password, &alias3, &keypair3, &cert3, &test::kdf()).unwrap();

        let store = KeyStore::open(&path, &password).unwrap();
        assert_eq!(store.aliases().count(), 3);
        assert_eq!(store.read_key_pair(&alias1).unwrap().public(), keypair1.public());
        assert_eq!(store.read_key_pair(&alias2).unwrap().public(), keypair2.public());
        assert_eq!(store.read_key_pair(&alias3).unwrap().public(), keypair3.public());
    }

    #[test]
    fn merge_replaces_same_alias() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, _, cert) = crypto_entry(&identity);
        let first = KeyPair::Crypto(CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng));
        let second = KeyPair::Crypto(CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng));
        write_key_pair(&mut rng, &path, &password, &alias, &first, &cert, &test::kdf()).unwrap();
        write_key_pair(&mut rng, &path, &password, &alias, &second, &cert, &test::kdf()).unwrap();
        let store = KeyStore::open(&path, &password).unwrap();
        assert_eq!(store.aliases().count(), 1);
        assert_eq!(store.read_key_pair(&alias).unwrap().public(), second.public());
    }

    #[test]
    fn failed_write_leaves_file_intact() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias1, keypair1, cert1) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &password, &alias1, &keypair1, &cert1, &test::kdf()).unwrap();
        let before = std::fs::read(&path).unwrap();

        // wrong password: refuses to touch the file
        let (alias2, keypair2, cert2) = crypto_entry(&identity);
        let res = write_key_pair(&mut rng, &path, &test::password("secret2"), &alias2, &keypair2, &cert2, &test::kdf());
        assert_eq!(res.err(), Some(Error::KeystoreDecryption));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        // a keypair with no secret can't be stored
        use crate::util::Public;
        let public_only = KeyPair::Sign(identity.signing().strip_private());
        let res = write_key_pair(&mut rng, &path, &password, &alias1, &public_only, &cert1, &test::kdf());
        assert_eq!(res.err(), Some(Error::CryptoKeyMissing));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let store = KeyStore::open(&path, &password).unwrap();
        assert_eq!(store.aliases().count(), 1);
    }

    #[test]
    fn write_refuses_insane_kdf() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, keypair, cert) = sign_entry(&identity);
        let res = write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &KdfParams::new(17, 64));
        assert_eq!(res.err(), Some(Error::CryptoKDFParamsInvalid(17, 64)));
        assert!(!path.exists());

        // anything we agree to write, we can read back
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();
        let store = KeyStore::open(&path, &password).unwrap();
        assert_eq!(store.read_key_pair(&alias).unwrap().public(), keypair.public());
    }

    #[test]
    fn write_many_is_all_or_nothing() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias1, keypair1, cert1) = sign_entry(&identity);
        let (alias2, keypair2, cert2) = crypto_entry(&identity);

        use crate::util::Public;
        let public_only = KeyPair::Crypto(identity.encryption_keypair().unwrap().strip_private());
        let res = write_key_pairs(&mut rng, &path, &password, &[(&alias1, &keypair1, &cert1), (&alias2, &public_only, &cert2)], &test::kdf());
        assert_eq!(res.err(), Some(Error::CryptoKeyMissing));
        assert!(!path.exists());

        write_key_pairs(&mut rng, &path, &password, &[(&alias1, &keypair1, &cert1), (&alias2, &keypair2, &cert2)], &test::kdf()).unwrap();
        let store = KeyStore::open(&path, &password).unwrap();
        assert_eq!(store.aliases().count(), 2);
        assert_eq!(store.read_key_pair(&alias2).unwrap().public(), keypair2.public());
    }

    #[test]
    fn write_into_unwritable_location() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        // a file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"i am a file").unwrap();
        let path = blocker.join("id.keystore");
        let (alias, keypair, cert) = sign_entry(&identity);
        let res = write_key_pair(&mut rng, &path, &test::password("secret1"), &alias, &keypair, &cert, &test::kdf());
        assert!(matches!(res, Err(Error::KeystoreWriteFailed(_))), "{:?}", res);
        assert_eq!(std::fs::read(&blocker).unwrap(), b"i am a file");
    }

    #[test]
    fn no_stray_temp_files() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let password = test::password("secret1");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();
        write_key_pair(&mut rng, &path, &password, &alias, &keypair, &cert, &test::kdf()).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("id.keystore")]);
    }

    #[test]
    fn secrets_not_in_plain_file() {
        let (mut rng, identity) = test::setup_identity();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.keystore");
        let (alias, keypair, cert) = sign_entry(&identity);
        write_key_pair(&mut rng, &path, &test::password("secret1"), &alias, &keypair, &cert, &test::kdf()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let secret = *identity.signing().secret().unwrap().expose_secret();
        assert!(!bytes.windows(32).any(|w| w == secret));
    }
}
