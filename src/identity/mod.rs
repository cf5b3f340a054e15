//! The identity module defines the data types and operations that define a
//! Trsst publishing identity.
//!
//! An identity is a signing keypair, an encryption keypair (or a promise to
//! derive one from the signing key), and the identifier that names the
//! identity's feed. The identifier is a one-way function of the signing public
//! key, so it can't be reassigned and it can't drift.
//!
//! This module also houses the vanity search, which keeps generating signing
//! keys until one produces an identifier with a chosen prefix.

pub mod identifier;
pub mod identity;
pub mod vanity;

pub use identifier::*;
pub use identity::*;
pub use vanity::*;
