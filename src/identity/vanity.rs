//! Vanity identifier search.
//!
//! Finding an identifier with a chosen prefix means generating signing keys
//! until one hashes to something that looks right. There's no way to steer
//! this, so the expected number of attempts grows by roughly 58x for every
//! character of prefix. The search is therefore modeled as a lazy stream of
//! [`Candidates`] that the caller pulls from, and it checks a [`CancelToken`]
//! on every attempt so an operator can always bail out.

use crate::{
    crypto::base::{CryptoKeypair, SignKeypair},
    error::{Error, Result},
    identity::{EncryptionKeySource, Identifier, Identity, IDENTIFIER_LEAD},
};
use rand::{CryptoRng, RngCore};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info};

/// Every character that can show up in a Base58 string.
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// The longest prefix that can fit after the leading "1". The 24 bytes after
/// the version byte encode to at most 33 base58 characters.
pub const MAX_PREFIX_LEN: usize = 33;

/// A shared flag used to stop a running search. Clone it, hand a copy to a
/// signal handler (or another thread), and flip it with [`CancelToken::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask whoever is watching this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Has someone asked us to stop?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An operator-chosen identifier prefix. The leading "1" every identifier
/// carries is implied, so the prefix "ab" searches for identifiers starting
/// with "1ab".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanityPrefix(String);

impl VanityPrefix {
    /// Create a prefix, making sure it only uses characters that can actually
    /// appear in an identifier and is short enough to fit in one. Otherwise
    /// we'd search forever.
    pub fn new(prefix: &str) -> Result<Self> {
        if prefix.chars().count() > MAX_PREFIX_LEN || !prefix.chars().all(|c| BASE58_ALPHABET.contains(c)) {
            Err(Error::VanityPrefixInvalid(prefix.into()))?;
        }
        Ok(Self(prefix.into()))
    }

    /// The prefix as given, without the leading "1".
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// What an identifier must actually start with.
    pub fn target(&self) -> String {
        format!("{}{}", IDENTIFIER_LEAD, self.0)
    }

    /// Does this identifier satisfy the prefix?
    pub fn matches(&self, identifier: &Identifier) -> bool {
        identifier
            .strip_prefix(IDENTIFIER_LEAD)
            .map(|rest| rest.starts_with(self.0.as_str()))
            .unwrap_or(false)
    }

    /// How long the operator should expect to wait.
    pub fn estimate(&self) -> SearchEstimate {
        SearchEstimate::for_prefix(self)
    }
}

/// A rough idea of how long a vanity search will take, for telling the
/// operator before they commit to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEstimate {
    /// Not worth mentioning.
    Instant,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl SearchEstimate {
    /// Estimate by prefix length.
    pub fn for_prefix(prefix: &VanityPrefix) -> Self {
        match prefix.as_str().chars().count() {
            0 | 1 => Self::Instant,
            2 => Self::Minutes,
            3 => Self::Hours,
            4 => Self::Days,
            5 => Self::Months,
            _ => Self::Years,
        }
    }
}

impl std::fmt::Display for SearchEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Instant => "a moment",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
            Self::Years => "years",
        };
        f.write_str(text)
    }
}

/// An endless stream of fresh signing keys and their identifiers.
///
/// Only the signing key feeds the identifier, so that's all we generate here.
pub struct Candidates<'a, R> {
    rng: &'a mut R,
    attempts: u64,
}

impl<'a, R: RngCore + CryptoRng> Candidates<'a, R> {
    /// Start generating candidates from the given rng.
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng, attempts: 0 }
    }

    /// How many candidates we've handed out so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

impl<'a, R: RngCore + CryptoRng> Iterator for Candidates<'a, R> {
    type Item = (SignKeypair, Identifier);

    fn next(&mut self) -> Option<Self::Item> {
        self.attempts += 1;
        let signing = SignKeypair::new_ed25519(&mut *self.rng);
        let identifier = Identifier::from_public(&signing.public());
        Some((signing, identifier))
    }
}

/// Find an identity whose identifier starts with the given prefix (after the
/// implied "1").
///
/// With no prefix this takes the first candidate and returns. Otherwise it
/// keeps pulling candidates until one matches or `cancel` is flipped, in which
/// case it returns `None`. The encryption keypair is generated once, after a
/// match is found.
pub fn find_vanity_identity<R: RngCore + CryptoRng>(rng: &mut R, prefix: Option<&VanityPrefix>, cancel: &CancelToken) -> Option<Identity> {
    let signing = {
        let mut candidates = Candidates::new(rng);
        let found = match prefix {
            None => candidates.next(),
            Some(prefix) => {
                info!(wanted = %prefix.target(), estimate = %prefix.estimate(), "searching for vanity identifier");
                candidates.by_ref().take_while(|_| !cancel.is_cancelled()).find(|(_, id)| prefix.matches(id))
            }
        };
        debug!(attempts = candidates.attempts(), found = found.is_some(), "identifier search finished");
        found.map(|(signing, _)| signing)
    }?;
    let encryption = CryptoKeypair::new_curve25519xchacha20poly1305(rng);
    Some(Identity::new(signing, EncryptionKeySource::Dedicated(encryption)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanity_prefix_validates() {
        assert!(VanityPrefix::new("ab").is_ok());
        assert!(VanityPrefix::new("").is_ok());
        assert_eq!(VanityPrefix::new("a0").err(), Some(Error::VanityPrefixInvalid("a0".into())));
        assert!(VanityPrefix::new("Il").is_err());
        assert!(VanityPrefix::new("a b").is_err());
        assert_eq!(VanityPrefix::new("ab").unwrap().target(), "1ab");
    }

    #[test]
    fn vanity_prefix_must_fit() {
        let too_long = "2".repeat(MAX_PREFIX_LEN + 1);
        assert_eq!(VanityPrefix::new(&too_long).err(), Some(Error::VanityPrefixInvalid(too_long.clone())));
        assert!(VanityPrefix::new(&"2".repeat(MAX_PREFIX_LEN)).is_ok());

        // any real identifier (minus its lead) is an acceptable prefix
        let mut rng = crate::util::test::rng();
        for (_, id) in Candidates::new(&mut rng).take(50) {
            let rest = id.strip_prefix(IDENTIFIER_LEAD).unwrap();
            let prefix = VanityPrefix::new(rest).unwrap();
            assert!(prefix.matches(&id));
        }
    }

    #[test]
    fn vanity_prefix_matches_after_lead() {
        let prefix = VanityPrefix::new("ab").unwrap();
        let mut rng = crate::util::test::rng();
        let id = Identifier::from_public(&SignKeypair::new_ed25519(&mut rng).public());
        assert_eq!(prefix.matches(&id), id.starts_with("1ab"));
        assert!(VanityPrefix::new("").unwrap().matches(&id));
    }

    #[test]
    fn search_estimate_by_length() {
        let est = |p: &str| VanityPrefix::new(p).unwrap().estimate();
        assert_eq!(est(""), SearchEstimate::Instant);
        assert_eq!(est("a"), SearchEstimate::Instant);
        assert_eq!(est("ab"), SearchEstimate::Minutes);
        assert_eq!(est("abc"), SearchEstimate::Hours);
        assert_eq!(est("abcd"), SearchEstimate::Days);
        assert_eq!(est("abcde"), SearchEstimate::Months);
        assert_eq!(est("abcdef"), SearchEstimate::Years);
        assert_eq!(est("abcdefghijk"), SearchEstimate::Years);
        assert_eq!(format!("{}", SearchEstimate::Hours), "hours");
    }

    #[test]
    fn candidates_are_lazy_and_distinct() {
        let mut rng = crate::util::test::rng();
        let mut candidates = Candidates::new(&mut rng);
        assert_eq!(candidates.attempts(), 0);
        let (key1, id1) = candidates.next().unwrap();
        let (key2, id2) = candidates.next().unwrap();
        assert_eq!(candidates.attempts(), 2);
        assert!(key1 != key2);
        assert!(id1 != id2);
        assert!(id1.matches(&key1.public()));
    }

    #[test]
    fn find_no_prefix_is_first_candidate() {
        let mut rng1 = crate::util::test::rng();
        let mut rng2 = crate::util::test::rng();
        let (_, first_id) = Candidates::new(&mut rng1).next().unwrap();
        let identity = find_vanity_identity(&mut rng2, None, &CancelToken::new()).unwrap();
        assert_eq!(identity.identifier(), &first_id);
        assert!(matches!(identity.encryption(), EncryptionKeySource::Dedicated(_)));
    }

    #[test]
    fn find_empty_prefix_is_first_candidate() {
        let mut rng1 = crate::util::test::rng();
        let mut rng2 = crate::util::test::rng();
        let (_, first_id) = Candidates::new(&mut rng1).next().unwrap();
        let prefix = VanityPrefix::new("").unwrap();
        let identity = find_vanity_identity(&mut rng2, Some(&prefix), &CancelToken::new()).unwrap();
        assert_eq!(identity.identifier(), &first_id);
    }

    #[test]
    fn find_single_char_prefix() {
        let mut rng = crate::util::test::rng();
        let prefix = VanityPrefix::new("A").unwrap();
        let identity = find_vanity_identity(&mut rng, Some(&prefix), &CancelToken::new()).unwrap();
        assert!(identity.identifier().starts_with("1A"), "{}", identity.identifier());
        assert!(identity.identifier().matches(&identity.signing().public()));
    }

    #[test]
    fn find_two_char_prefix() {
        // "2" is one of the common leading digits, so this takes a thousand
        // or so attempts rather than tens of thousands
        let mut rng = crate::util::test::rng_seeded(b"two chars");
        let prefix = VanityPrefix::new("2a").unwrap();
        let identity = find_vanity_identity(&mut rng, Some(&prefix), &CancelToken::new()).unwrap();
        assert!(identity.identifier().starts_with("12a"), "{}", identity.identifier());
        assert!(identity.identifier().matches(&identity.signing().public()));
        assert!(prefix.matches(identity.identifier()));
    }

    #[test]
    #[ignore]
    fn find_two_char_prefix_rare() {
        let mut rng = crate::crypto::base::rng_chacha20();
        let prefix = VanityPrefix::new("ab").unwrap();
        let identity = find_vanity_identity(&mut rng, Some(&prefix), &CancelToken::new()).unwrap();
        assert!(identity.identifier().starts_with("1ab"), "{}", identity.identifier());
    }

    #[test]
    fn find_cancelled_returns_none() {
        let mut rng = crate::util::test::rng();
        let cancel = CancelToken::new();
        let watcher = cancel.clone();
        cancel.cancel();
        assert!(watcher.is_cancelled());
        // long enough that we'd never find it by chance before the check
        let prefix = VanityPrefix::new("zzzzzzzzzz").unwrap();
        assert!(find_vanity_identity(&mut rng, Some(&prefix), &watcher).is_none());
    }

    #[test]
    fn find_cancelled_from_another_thread() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = std::thread::spawn(move || {
            let mut rng = crate::crypto::base::rng_chacha20();
            let prefix = VanityPrefix::new("zzzzzzzzzz").unwrap();
            find_vanity_identity(&mut rng, Some(&prefix), &remote)
        });
        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.cancel();
        assert!(handle.join().unwrap().is_none());
    }
}
