//! The narrow interface to whatever stores and serves feeds.
//!
//! Transport, retries, and discovery all belong to the implementor. We hand a
//! [`Client`] signed documents and get feeds back. [`MemoryClient`] keeps
//! everything in-process, which is enough for tests and for a local,
//! single-process setup.

use crate::{
    crypto::base::CryptoKeypairPublic,
    entry::{verify_document, SignedDocument},
    error::{Error, Result},
    identity::Identifier,
    util::Timestamp,
};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Where a feed's icon or logo comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedImage {
    /// Use the attachment of the entry being posted.
    FromAttachment,
    Url(Url),
}

impl FromStr for FeedImage {
    type Err = Error;

    /// `"-"` means "use the attachment", anything else must be a URL.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "-" {
            Ok(Self::FromAttachment)
        } else {
            Url::parse(s)
                .map(Self::Url)
                .map_err(|e| Error::Config(format!("bad image url {}: {}", s, e)))
        }
    }
}

/// Feed-level metadata sent along with a post. Anything left as `None` keeps
/// whatever the feed already had.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct FeedOptions {
    title: Option<String>,
    subtitle: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    base: Option<Url>,
    icon: Option<FeedImage>,
    logo: Option<FeedImage>,
}

impl FeedOptions {
    /// Take every field that's set in `other`.
    pub fn merge(&mut self, other: &FeedOptions) {
        fn take<T: Clone>(ours: &mut Option<T>, theirs: &Option<T>) {
            if let Some(val) = theirs {
                *ours = Some(val.clone());
            }
        }
        take(&mut self.title, &other.title);
        take(&mut self.subtitle, &other.subtitle);
        take(&mut self.author_name, &other.author_name);
        take(&mut self.author_email, &other.author_email);
        take(&mut self.base, &other.base);
        take(&mut self.icon, &other.icon);
        take(&mut self.logo, &other.logo);
    }
}

/// A feed: its metadata, the key others should encrypt to, and its entries
/// (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub")]
pub struct Feed {
    id: Identifier,
    options: FeedOptions,
    encryption_key: Option<CryptoKeypairPublic>,
    #[getset(get_mut = "pub(crate)")]
    entries: Vec<SignedDocument>,
    updated: Timestamp,
}

impl Feed {
    /// An empty feed.
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            options: FeedOptions::default(),
            encryption_key: None,
            entries: Vec::new(),
            updated: Timestamp::now(),
        }
    }
}

/// Pulls and posts feeds.
pub trait Client {
    /// Grab a feed by its identifier.
    fn pull(&self, feed: &Identifier) -> Result<Feed>;

    /// Publish a signed document to its feed, updating the feed's metadata and
    /// advertised encryption key along the way. Returns the updated feed.
    fn post(&self, options: &FeedOptions, encryption_key: &CryptoKeypairPublic, document: SignedDocument) -> Result<Feed>;
}

/// Keeps feeds in memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    feeds: RwLock<HashMap<Identifier, Feed>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of every feed we hold.
    pub fn feed_ids(&self) -> Result<Vec<Identifier>> {
        let feeds = self.feeds.read().map_err(|_| Error::ClientUnavailable("feed store lock poisoned".into()))?;
        let mut ids = feeds.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }
}

impl Client for MemoryClient {
    fn pull(&self, feed: &Identifier) -> Result<Feed> {
        let feeds = self.feeds.read().map_err(|_| Error::ClientUnavailable("feed store lock poisoned".into()))?;
        feeds.get(feed).cloned().ok_or_else(|| Error::FeedNotFound(feed.to_string()))
    }

    fn post(&self, options: &FeedOptions, encryption_key: &CryptoKeypairPublic, document: SignedDocument) -> Result<Feed> {
        if let Err(e) = verify_document(&document) {
            warn!(feed = %document.feed(), error = %e, "rejecting document");
            Err(e)?;
        }
        let mut feeds = self.feeds.write().map_err(|_| Error::ClientUnavailable("feed store lock poisoned".into()))?;
        let id = document.feed().clone();
        let feed = feeds.entry(id.clone()).or_insert_with(|| Feed::new(id.clone()));
        feed.options.merge(options);
        feed.encryption_key = Some(encryption_key.clone());
        feed.entries.push(document);
        feed.updated = Timestamp::now();
        debug!(feed = %id, entries = feed.entries.len(), "posted entry");
        Ok(feed.clone())
    }
}
