//! The two things an operator actually does: post an entry and pull feeds.
//!
//! These tie everything else together. Posting gets a password, loads or
//! creates an identity, turns the request into a draft, composes it, and
//! hands the signed document to the [`Client`]. Pulling fetches feeds, checks
//! every document's signature, and opens whatever envelopes our keys can
//! open.
//!
//! Nothing here retries. Failures are logged and handed back to the caller.

use crate::{
    client::{Client, Feed, FeedOptions},
    config::ClientConfig,
    credential::{obtain_new_password, obtain_password, CredentialPrompt},
    entry::{
        compose_entry, decrypt_entry,
        sniff::{ContentSniffer, MagicSniffer},
        verify_document, Entry, EntryDraft, RecipientSet,
    },
    error::{Error, Result},
    identity::{find_vanity_identity, CancelToken, DecryptionKeys, Identifier, Identity, VanityPrefix},
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Everything a command needs from the outside world.
pub struct Context<'a> {
    config: &'a ClientConfig,
    client: &'a dyn Client,
    prompt: &'a dyn CredentialPrompt,
    sniffer: &'a dyn ContentSniffer,
    cancel: CancelToken,
}

impl<'a> Context<'a> {
    /// Create a context that sniffs attachments with [`MagicSniffer`].
    pub fn new(config: &'a ClientConfig, client: &'a dyn Client, prompt: &'a dyn CredentialPrompt) -> Self {
        Self {
            config,
            client,
            prompt,
            sniffer: &MagicSniffer,
            cancel: CancelToken::new(),
        }
    }

    /// Use a different content sniffer.
    pub fn with_sniffer(mut self, sniffer: &'a dyn ContentSniffer) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// Use an existing cancel token (one a signal handler holds, say).
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that stops a running vanity search.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn key_path(&self, id: &Identifier, key_dir: Option<&Path>) -> PathBuf {
        self.config.key_path(id, key_dir)
    }
}

/// Where attachment bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentSource {
    /// Read a file. Its extension is used as a media type hint.
    Path(PathBuf),
    /// Read standard input to the end.
    Stdin,
    /// Bytes already in hand.
    Bytes(Vec<u8>),
}

impl AttachmentSource {
    /// `"-"` is stdin, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Read the attachment, returning the bytes and a media type guessed from
    /// the file name (if there is one).
    fn read(&self) -> Result<(Vec<u8>, Option<String>)> {
        match self {
            Self::Path(path) => {
                let bytes = std::fs::read(path).map_err(|e| Error::AttachmentRead(path.display().to_string(), e))?;
                let hint = mime_guess::from_path(path).first().map(|m| m.essence_str().to_string());
                info!(path = %path.display(), bytes = bytes.len(), "attaching file");
                Ok((bytes, hint))
            }
            Self::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .map_err(|e| Error::AttachmentRead("<stdin>".into(), e))?;
                Ok((bytes, None))
            }
            Self::Bytes(bytes) => Ok((bytes.clone(), None)),
        }
    }
}

/// Everything needed to post one entry.
#[derive(Debug, Clone, Default, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct PostRequest {
    /// Post as this (existing) identity. If `None`, a new one is created.
    identifier: Option<Identifier>,
    /// Look for (or put) the keystore in this directory instead of the
    /// configured storage root.
    key_dir: Option<PathBuf>,
    /// Only used when creating an identity.
    vanity: Option<VanityPrefix>,
    /// Recipient strings: base64 encryption keys, or `-` for ourselves.
    recipients: Vec<String>,
    attachment: Option<AttachmentSource>,
    draft: EntryDraft,
    feed_options: FeedOptions,
}

/// Either load the identity the request names, or make a new one and save
/// it.
fn obtain_identity<R: RngCore + CryptoRng>(ctx: &Context, rng: &mut R, req: &PostRequest) -> Result<Identity> {
    match req.identifier() {
        Some(id) => {
            let mut password = obtain_password(ctx.prompt)?;
            let path = ctx.key_path(id, req.key_dir().as_deref());
            if !path.exists() {
                error!(identifier = %id, path = %path.display(), "cannot locate keys");
                Err(Error::KeystoreNotFound(path.display().to_string()))?;
            }
            info!(identifier = %id, "using existing identity");
            let loaded = Identity::load(&path, &password, id);
            password.clear();
            loaded.map_err(|e| {
                error!(identifier = %id, error = %e, "could not read keys");
                e
            })
        }
        None => {
            let mut password = obtain_new_password(ctx.prompt)?;
            if let Some(prefix) = req.vanity() {
                info!(wanted = %prefix.target(), "this may take {}, cancel to give up", prefix.estimate());
            }
            let identity = find_vanity_identity(rng, req.vanity().as_ref(), ctx.cancel_token()).ok_or(Error::Cancelled)?;
            let path = ctx.key_path(identity.identifier(), req.key_dir().as_deref());
            let saved = identity.save(rng, &path, &password, ctx.config.kdf());
            password.clear();
            saved?;
            info!(identifier = %identity.identifier(), path = %path.display(), "created new identity");
            Ok(identity)
        }
    }
}

/// Post an entry, creating the identity first if the request doesn't name
/// one. Returns the feed as the client sees it afterward.
pub fn post<R: RngCore + CryptoRng>(ctx: &Context, rng: &mut R, req: PostRequest) -> Result<Feed> {
    let identity = obtain_identity(ctx, rng, &req)?;
    let recipients = RecipientSet::parse(req.recipients()).map_err(|e| {
        error!(error = %e, "could not parse recipient key");
        e
    })?;

    let PostRequest {
        attachment,
        mut draft,
        feed_options,
        ..
    } = req;
    if let Some(source) = attachment {
        let (bytes, hint) = source.read().map_err(|e| {
            error!(error = %e, "could not read attachment");
            e
        })?;
        draft.set_attachment(Some(bytes)).set_attachment_type_hint(hint);
    }

    let encryption_public = identity.encryption_public()?;
    let document = compose_entry(rng, identity.signing(), &encryption_public, draft, &recipients, ctx.sniffer).map_err(|e| {
        error!(identifier = %identity.identifier(), error = %e, "could not compose entry");
        e
    })?;
    ctx.client.post(&feed_options, &encryption_public, document).map_err(|e| {
        error!(identifier = %identity.identifier(), error = %e, "client rejected post");
        e
    })
}

/// Which feeds to pull, and who to decrypt as.
#[derive(Debug, Clone, Default, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct PullRequest {
    feeds: Vec<Identifier>,
    /// Load this identity's keys and open whatever is addressed to it.
    decrypt_as: Option<Identifier>,
    key_dir: Option<PathBuf>,
}

/// An entry as seen by whoever pulled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::CopyGetters)]
pub struct PulledEntry {
    /// The opened entry if we could open it, otherwise what the document
    /// carries in the clear.
    #[getset(get = "pub")]
    entry: Entry,
    #[getset(get_copy = "pub")]
    encrypted: bool,
    #[getset(get_copy = "pub")]
    decrypted: bool,
}

/// A pulled feed with its verified entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct PulledFeed {
    feed: Feed,
    entries: Vec<PulledEntry>,
    /// How many documents failed verification and were left out.
    skipped: usize,
}

fn decryption_keys(ctx: &Context, req: &PullRequest) -> Result<DecryptionKeys> {
    let id = match req.decrypt_as() {
        Some(id) => id,
        None => return Ok(DecryptionKeys::default()),
    };
    let mut password = obtain_password(ctx.prompt)?;
    let path = ctx.key_path(id, req.key_dir().as_deref());
    let loaded = Identity::load(&path, &password, id);
    password.clear();
    let identity = loaded.map_err(|e| {
        error!(identifier = %id, error = %e, "could not read keys for decryption");
        e
    })?;
    identity.decryption_keys()
}

/// Pull feeds, verify them, and decrypt what we can.
pub fn pull(ctx: &Context, req: PullRequest) -> Result<Vec<PulledFeed>> {
    let keys = decryption_keys(ctx, &req)?;
    let mut pulled = Vec::with_capacity(req.feeds().len());
    for id in req.feeds() {
        let feed = ctx.client.pull(id).map_err(|e| {
            error!(identifier = %id, error = %e, "could not pull feed");
            e
        })?;
        let mut skipped = 0;
        let entries = feed
            .entries()
            .iter()
            .filter(|document| match verify_document(document) {
                Ok(()) => true,
                Err(e) => {
                    warn!(identifier = %id, error = %e, "skipping document that failed verification");
                    skipped += 1;
                    false
                }
            })
            .map(|document| {
                let encrypted = document.is_encrypted();
                match decrypt_entry(document, &keys) {
                    Some(entry) => PulledEntry {
                        entry,
                        encrypted,
                        decrypted: true,
                    },
                    None => PulledEntry {
                        entry: document.entry().clone(),
                        encrypted,
                        decrypted: false,
                    },
                }
            })
            .collect::<Vec<_>>();
        pulled.push(PulledFeed { feed, entries, skipped });
    }
    Ok(pulled)
}
