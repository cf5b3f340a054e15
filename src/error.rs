//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while managing keys and authoring entries.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// An attachment could not be read from disk (or wherever it lives).
    #[error("could not read attachment {0}: {1}")]
    AttachmentRead(String, std::io::Error),

    /// The operator cancelled a long-running operation (vanity search).
    #[error("operation cancelled")]
    Cancelled,

    /// The client's feed store is unusable (a writer panicked mid-update).
    #[error("client unavailable: {0}")]
    ClientUnavailable(String),

    /// A config file failed to load or save.
    #[error("config error: {0}")]
    Config(String),

    /// No password could be obtained (no argument given and no terminal to
    /// prompt on).
    #[error("a password is required but none could be obtained")]
    CredentialUnavailable,

    /// Trying to use a key or signature with an algorithm it wasn't made for.
    #[error("cryptographic algorithm mismatch")]
    CryptoAlgoMismatch,

    /// Bad salt given to a cryptographic function.
    #[error("incorrect salt given for kdf")]
    CryptoBadSalt,

    /// Key stretching failed.
    #[error("hkdf expansion failed")]
    CryptoHKDFFailed,

    /// Could not generate key from password
    #[error("key derivation from password failed")]
    CryptoKDFFailed,

    /// Argon2 parameters outside the range we're willing to read back
    #[error("kdf parameters out of range (ops {0}, mem {1})")]
    CryptoKDFParamsInvalid(u32, u32),

    /// A key is missing from a crypto operation
    #[error("crypto key missing")]
    CryptoKeyMissing,

    /// Failed to open a sealed object. This is a bummer, man.
    #[error("failed to open a sealed object")]
    CryptoOpenFailed,

    /// Failed to seal an object.
    #[error("failed to seal an object")]
    CryptoSealFailed,

    /// Failed to produce a signature
    #[error("failed to create a signature")]
    CryptoSignatureFailed,

    /// A signature failed to verify.
    #[error("the given signature/public key/data combo does not verify")]
    CryptoSignatureVerificationFailed,

    /// An error while engaging in msgpack deserialization.
    #[error("deserialization error: {0}")]
    Deserialize(#[from] rmp_serde::decode::Error),

    /// An error while decoding base64.
    #[error("deserialization error: {0}")]
    DeserializeBase64(#[from] base64::DecodeError),

    /// The feed a document claims to belong to doesn't match its author key.
    #[error("document feed id does not match its author key")]
    FeedIDMismatch,

    /// A feed was requested that the client doesn't know about.
    #[error("feed not found: {0}")]
    FeedNotFound(String),

    /// The string given is not a valid identifier.
    #[error("invalid identifier: {0}")]
    IdentifierInvalid(String),

    /// An IO/net error
    #[error("io error {0:?}")]
    IoError(#[from] std::io::Error),

    /// The requested alias (identifier + key role) is not in the keystore.
    #[error("keystore has no entry for {0}")]
    KeystoreAliasNotFound(String),

    /// The keystore password did not match, or the container is corrupt.
    #[error("keystore could not be decrypted (bad password or corrupt file)")]
    KeystoreDecryption,

    /// The keystore holds a key under the wrong role.
    #[error("keystore entry {0} holds the wrong type of key")]
    KeystoreKeyWrongType(String),

    /// Tried to open a keystore that isn't there.
    #[error("keystore not found: {0}")]
    KeystoreNotFound(String),

    /// Re-serializing or writing the keystore failed. The previous file is
    /// untouched.
    #[error("keystore write failed: {0}")]
    KeystoreWriteFailed(String),

    /// The interactive password confirmation didn't match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A recipient public key could not be parsed.
    #[error("could not parse recipient key: {0}")]
    RecipientKeyParse(String),

    /// An error while engaging in msgpack serialization.
    #[error("msgpack serialization error: {0}")]
    SerializeMsgPack(#[from] rmp_serde::encode::Error),

    /// An error while engaging in yaml serialization.
    #[error("yaml serialization error: {0}")]
    SerializeYaml(#[from] serde_yaml::Error),

    /// A vanity prefix contains characters that can never appear in an
    /// identifier.
    #[error("vanity prefix {0:?} can never appear in an identifier")]
    VanityPrefixInvalid(String),

    /// The password is shorter than the minimum length.
    #[error("password must be at least {0} characters in length")]
    WeakPassword(usize),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // std::io::Error et al are not eq-able, so compare the debug output.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
