//! Welcome to the Trsst core: identity keys and entry authoring for the Trsst
//! publishing protocol.
//!
//! A Trsst feed belongs to whoever holds its signing key. The feed's
//! identifier is derived from that key, so there's no registry to ask and
//! nothing to reassign: if you can sign for the identifier, it's your feed.
//! Every entry published to the feed is signed, and any entry can be sealed
//! for a chosen set of readers while everyone else sees a signed placeholder.
//!
//! This crate handles the parts that need to be right:
//!
//! 1. Creating identities, optionally with a vanity identifier prefix.
//! 1. Keeping their keys in a password-protected keystore file.
//! 1. Composing, signing, and selectively encrypting entries, and opening the
//! ones addressed to us.
//!
//! Moving feeds around is somebody else's job. The [client] module defines the
//! interface we expect from whatever does that, and [command] wires the whole
//! post/pull flow together against it.

pub mod client;
pub mod command;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod identity;
pub mod keystore;
pub mod util;
