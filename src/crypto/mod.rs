//! The crypto module contains all of our cryptographic primitives for key
//! generation, signing, anonymous messaging, and encrypting private data.

pub mod base;
pub mod private;
