//! Composing feed entries, optionally encrypted for a set of recipients.
//!
//! An entry starts life as an [`EntryDraft`]. Composing it produces a
//! [`SignedDocument`]: the entry plus some envelopes, signed as a whole by the
//! author's signing key.
//!
//! If the entry has no recipients it goes out as-is. Otherwise the full entry
//! is serialized and sealed separately to each recipient's encryption key,
//! one [`Envelope`] per recipient, and the entry that's carried in the clear
//! is a placeholder that says nothing beyond [`PLACEHOLDER_STATUS`] and the
//! publish time. Everyone can check the signature; only recipients can read
//! the entry.

pub mod sniff;

use crate::{
    crypto::base::{CryptoKeypairPublic, SignKeypair, SignKeypairPublic},
    error::{Error, Result},
    identity::{DecryptionKeys, Identifier},
    util::{
        ser::{self, BinaryVec},
        sign::SignedValue,
        Timestamp,
    },
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use sniff::{is_inconclusive, ContentSniffer};
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;
use zeroize::Zeroizing;

/// The status shown to anyone who can't open an encrypted entry.
pub const PLACEHOLDER_STATUS: &str = "Encrypted content";

/// The recipient string that means "me".
pub const SELF_RECIPIENT: &str = "-";

/// Someone an entry is encrypted for.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// An explicit encryption public key.
    Key(CryptoKeypairPublic),
    /// The author's own encryption key.
    Myself,
}

impl FromStr for Recipient {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == SELF_RECIPIENT {
            return Ok(Self::Myself);
        }
        CryptoKeypairPublic::from_str(s)
            .map(Self::Key)
            .map_err(|_| Error::RecipientKeyParse(s.into()))
    }
}

/// An ordered list of recipients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientSet(Vec<Recipient>);

impl RecipientSet {
    /// Parse a list of recipient strings. Any bad key fails the whole set.
    pub fn parse<I, S>(recipients: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let recipients = recipients
            .into_iter()
            .map(|r| Recipient::from_str(r.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(recipients))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.0.iter()
    }

    /// Turn the set into concrete keys, with [`Recipient::Myself`] becoming
    /// `own_key`.
    pub fn resolve(&self, own_key: &CryptoKeypairPublic) -> Vec<CryptoKeypairPublic> {
        self.0
            .iter()
            .map(|r| match r {
                Recipient::Key(key) => key.clone(),
                Recipient::Myself => own_key.clone(),
            })
            .collect()
    }
}

impl From<Vec<Recipient>> for RecipientSet {
    fn from(recipients: Vec<Recipient>) -> Self {
        Self(recipients)
    }
}

/// The pieces of an entry before it's composed.
#[derive(Debug, Clone, Default, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct EntryDraft {
    status: Option<String>,
    verb: Option<String>,
    body: Option<String>,
    /// Raw attachment bytes. Wins over `content_url` if both are set.
    attachment: Option<Vec<u8>>,
    /// A media type to fall back on when sniffing the attachment doesn't
    /// tell us anything (usually guessed from a file name).
    attachment_type_hint: Option<String>,
    content_url: Option<Url>,
    mentions: Vec<String>,
    tags: Vec<String>,
}

/// What an entry points at or carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    Attachment { media_type: String, data: BinaryVec },
    Link(Url),
}

/// A plaintext entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct Entry {
    published: Timestamp,
    status: Option<String>,
    verb: Option<String>,
    body: Option<String>,
    content: Option<Content>,
    mentions: Vec<String>,
    tags: Vec<String>,
}

impl Entry {
    /// The stand-in entry shown to non-recipients.
    pub fn placeholder(published: Timestamp) -> Self {
        Self {
            published,
            status: Some(PLACEHOLDER_STATUS.into()),
            verb: None,
            body: None,
            content: None,
            mentions: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Is this a placeholder?
    pub fn is_placeholder(&self) -> bool {
        self.status.as_deref() == Some(PLACEHOLDER_STATUS) && self.body.is_none() && self.content.is_none()
    }
}

/// A full entry sealed to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct Envelope {
    sealed: BinaryVec,
}

/// The thing that actually gets published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct EntryDocument {
    /// The feed this entry belongs to.
    feed: Identifier,
    /// The key that signed this document. Must hash to `feed`.
    author: SignKeypairPublic,
    /// The entry, or a placeholder if it's encrypted.
    entry: Entry,
    envelopes: Vec<Envelope>,
}

impl EntryDocument {
    /// Does this document carry encrypted content?
    pub fn is_encrypted(&self) -> bool {
        !self.envelopes.is_empty()
    }
}

/// An entry document with its author's signature.
pub type SignedDocument = SignedValue<EntryDocument>;

/// Check a document's signature against its author key, and that the author
/// key actually owns the feed.
pub fn verify_document(document: &SignedDocument) -> Result<()> {
    document.verify_value(document.author())?;
    if !document.feed().matches(document.author()) {
        Err(Error::FeedIDMismatch)?;
    }
    Ok(())
}

/// Build the plaintext entry from a draft.
fn build_entry(draft: EntryDraft, published: Timestamp, sniffer: &dyn ContentSniffer) -> Entry {
    let EntryDraft {
        status,
        verb,
        body,
        attachment,
        attachment_type_hint,
        content_url,
        mentions,
        tags,
    } = draft;
    let content = match (attachment, content_url) {
        (Some(data), _) => {
            let sniffed = sniffer.detect(&data);
            let media_type = match attachment_type_hint {
                Some(hint) if is_inconclusive(&sniffed) => hint,
                _ => sniffed,
            };
            Some(Content::Attachment {
                media_type,
                data: data.into(),
            })
        }
        (None, Some(url)) => Some(Content::Link(url)),
        (None, None) => None,
    };
    Entry {
        published,
        status,
        verb,
        body,
        content,
        mentions,
        tags,
    }
}

/// Compose and sign an entry.
///
/// With an empty recipient set the entry is carried in the clear. Otherwise
/// the full entry is sealed once per recipient ([`Recipient::Myself`] resolves
/// to `encryption_public`) and the document carries a placeholder instead.
/// The signature covers the whole document, envelopes included.
pub fn compose_entry<R: RngCore + CryptoRng>(
    rng: &mut R,
    signing: &SignKeypair,
    encryption_public: &CryptoKeypairPublic,
    draft: EntryDraft,
    recipients: &RecipientSet,
    sniffer: &dyn ContentSniffer,
) -> Result<SignedDocument> {
    let published = Timestamp::now();
    let entry = build_entry(draft, published.clone(), sniffer);
    let (entry, envelopes) = if recipients.is_empty() {
        (entry, Vec::new())
    } else {
        let plaintext = Zeroizing::new(ser::serialize(&entry)?);
        let envelopes = recipients
            .resolve(encryption_public)
            .iter()
            .map(|key| {
                key.seal_anonymous(&mut *rng, &plaintext).map(|sealed| Envelope { sealed: sealed.into() })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(envelopes = envelopes.len(), "sealed entry for recipients");
        (Entry::placeholder(published), envelopes)
    };
    let author = signing.public();
    let document = EntryDocument {
        feed: Identifier::from_public(&author),
        author,
        entry,
        envelopes,
    };
    SignedValue::new(signing, document).map_err(|_| Error::CryptoSignatureFailed)
}

/// Try to open an encrypted document with any of our keys.
///
/// Each key is tried against each envelope, in the order the keys are given.
/// Returns `None` if nothing opens, which is the normal outcome for an entry
/// addressed to somebody else.
pub fn decrypt_entry(document: &SignedDocument, keys: &DecryptionKeys) -> Option<Entry> {
    for key in keys.iter() {
        for envelope in document.envelopes() {
            let plaintext = match key.open_anonymous(envelope.sealed()) {
                Ok(plaintext) => Zeroizing::new(plaintext),
                Err(_) => continue,
            };
            match ser::deserialize::<Entry>(&plaintext) {
                Ok(entry) => return Some(entry),
                Err(e) => warn!(feed = %document.feed(), error = %e, "envelope opened but didn't hold an entry"),
            }
        }
    }
    None
}
