//! The private module locks data away via a [`SecretKey`]
//! while never storing or serializing or displaying the locked (private) data.
//! It can only be retrieved via the [open](crate::crypto::private::Private::open)
//! method, given the correct unlocking key.
//!
//! This is how secret key material sits at rest inside a keystore.

use crate::{
    crypto::base::{Sealed, SecretKey},
    error::{Error, Result},
    util::ser,
};
use rand::{CryptoRng, RngCore};
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Holds private data, which can only be opened if you have the special key.
#[derive(Debug, Serialize, Deserialize)]
pub struct Private<T> {
    /// Allows us to cast this container to T without this container ever
    /// actually storing any T value (because it's encrypted).
    #[serde(skip)]
    _phantom: PhantomData<T>,
    /// The encrypted data stored in this container.
    sealed: Sealed,
}

impl<T: serde::Serialize + DeserializeOwned> Private<T> {
    /// Create a new Private container from a given serializable data object and
    /// an encrypting key.
    pub fn seal<R: RngCore + CryptoRng>(rng: &mut R, seal_key: &SecretKey, data: &T) -> Result<Self> {
        let serialized = zeroize::Zeroizing::new(ser::serialize(data)?);
        let sealed = seal_key.seal(rng, &*serialized)?;
        Ok(Self {
            _phantom: PhantomData,
            sealed,
        })
    }

    /// Open a Private container with a decrypting key.
    pub fn open(&self, seal_key: &SecretKey) -> Result<T> {
        let open_bytes = zeroize::Zeroizing::new(seal_key.open(&self.sealed).map_err(|_| Error::CryptoOpenFailed)?);
        let obj: T = ser::deserialize(&open_bytes[..])?;
        Ok(obj)
    }
}

impl<T> Clone for Private<T> {
    fn clone(&self) -> Self {
        Self {
            _phantom: PhantomData,
            sealed: self.sealed.clone(),
        }
    }
}

impl<T> PartialEq for Private<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sealed == other.sealed
    }
}
