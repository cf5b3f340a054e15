//! Getting a password from the operator.
//!
//! Passwords live in [`Password`], which holds them in a [`Zeroizing`] buffer
//! that's overwritten when dropped (so on every exit path, error or not) and
//! can be cleared early with [`Password::clear`]. This is best-effort hygiene
//! and nothing more: the allocator may have left copies behind when the string
//! grew, the terminal layer has its own buffers, and the KDF makes copies we
//! don't control.

use crate::error::{Error, Result};
use std::io::IsTerminal;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

/// The shortest password we'll accept, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A password that's long enough to use.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a password, rejecting anything shorter than
    /// [`MIN_PASSWORD_LENGTH`] characters.
    pub fn new(password: String) -> Result<Self> {
        Self::from_zeroizing(Zeroizing::new(password))
    }

    /// Like [`Password::new`], for a password that's already in a zeroizing
    /// buffer.
    pub fn from_zeroizing(password: Zeroizing<String>) -> Result<Self> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            Err(Error::WeakPassword(MIN_PASSWORD_LENGTH))?;
        }
        Ok(Self(password))
    }

    /// The password text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// The password bytes, for feeding into a KDF.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Overwrite the password now instead of waiting for drop. A cleared
    /// password is empty.
    pub fn clear(&mut self) {
        self.0.zeroize();
    }

    /// Make sure a re-typed password matches this one.
    pub fn confirm(&self, retyped: &Password) -> Result<()> {
        if bool::from(self.as_bytes().ct_eq(retyped.as_bytes())) {
            Ok(())
        } else {
            Err(Error::PasswordMismatch)
        }
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Something that can hand us a password.
pub trait CredentialPrompt {
    /// Ask for a password. Returns `None` if there's no way to get one.
    fn prompt_password(&self, prompt: &str) -> Option<Zeroizing<String>>;

    /// Whether a human is on the other end. Interactive prompts get asked to
    /// confirm new passwords.
    fn is_interactive(&self) -> bool;
}

/// A password given up front (on the command line, say).
#[derive(Clone)]
pub struct ArgumentPrompt(Option<Zeroizing<String>>);

impl ArgumentPrompt {
    /// Use the given password, or none at all.
    pub fn new(password: Option<String>) -> Self {
        Self(password.map(Zeroizing::new))
    }
}

impl CredentialPrompt for ArgumentPrompt {
    fn prompt_password(&self, _prompt: &str) -> Option<Zeroizing<String>> {
        self.0.clone()
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Reads a password from the terminal without echoing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn prompt_password(&self, prompt: &str) -> Option<Zeroizing<String>> {
        if !self.is_interactive() {
            debug!("stdin is not a terminal, can't prompt for a password");
            return None;
        }
        rpassword::prompt_password(prompt).ok().map(Zeroizing::new)
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }
}

/// Get a password for an existing keystore.
pub fn obtain_password(prompt: &dyn CredentialPrompt) -> Result<Password> {
    let raw = prompt.prompt_password("Password: ").ok_or(Error::CredentialUnavailable)?;
    Password::from_zeroizing(raw)
}

/// Get a password for a keystore we're about to create. If someone's typing
/// it in, they have to type it twice.
pub fn obtain_new_password(prompt: &dyn CredentialPrompt) -> Result<Password> {
    let password = obtain_password(prompt)?;
    if prompt.is_interactive() {
        let retyped = prompt.prompt_password("Re-type password: ").ok_or(Error::CredentialUnavailable)?;
        // a short re-type can't match anyway
        let retyped = Password::from_zeroizing(retyped).map_err(|_| Error::PasswordMismatch)?;
        password.confirm(&retyped)?;
    }
    Ok(password)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    /// Answers prompts from a script, pretending to be a terminal.
    pub(crate) struct ScriptedPrompt(RefCell<Vec<&'static str>>);

    impl ScriptedPrompt {
        pub(crate) fn new(answers: &[&'static str]) -> Self {
            let mut answers = answers.to_vec();
            answers.reverse();
            Self(RefCell::new(answers))
        }
    }

    impl CredentialPrompt for ScriptedPrompt {
        fn prompt_password(&self, _prompt: &str) -> Option<Zeroizing<String>> {
            self.0.borrow_mut().pop().map(|s| Zeroizing::new(s.to_string()))
        }

        fn is_interactive(&self) -> bool {
            true
        }
    }

    #[test]
    fn password_min_length() {
        assert_eq!(Password::new("12345".into()).err(), Some(Error::WeakPassword(6)));
        assert_eq!(Password::new("".into()).err(), Some(Error::WeakPassword(6)));
        assert_eq!(Password::new("secret1".into()).unwrap().expose(), "secret1");
        // characters, not bytes
        assert!(Password::new("ünïcø".into()).is_err());
        assert!(Password::new("ünïcød".into()).is_ok());
    }

    #[test]
    fn password_clear_and_debug() {
        let mut pass = Password::new("hunter22".into()).unwrap();
        assert_eq!(format!("{:?}", pass), "Password(<redacted>)");
        pass.clear();
        assert_eq!(pass.expose(), "");
    }

    #[test]
    fn password_confirm() {
        let pass = Password::new("secret1".into()).unwrap();
        pass.confirm(&Password::new("secret1".into()).unwrap()).unwrap();
        assert_eq!(pass.confirm(&Password::new("secret2".into()).unwrap()), Err(Error::PasswordMismatch));
        assert_eq!(pass.confirm(&Password::new("secret12".into()).unwrap()), Err(Error::PasswordMismatch));
    }

    #[test]
    fn argument_prompt() {
        let prompt = ArgumentPrompt::new(Some("secret1".into()));
        assert!(!prompt.is_interactive());
        assert_eq!(obtain_password(&prompt).unwrap().expose(), "secret1");
        // no confirmation when it came from an argument
        assert_eq!(obtain_new_password(&prompt).unwrap().expose(), "secret1");

        let prompt = ArgumentPrompt::new(None);
        assert_eq!(obtain_password(&prompt).err(), Some(Error::CredentialUnavailable));

        let prompt = ArgumentPrompt::new(Some("short".into()));
        assert_eq!(obtain_password(&prompt).err(), Some(Error::WeakPassword(6)));
    }

    #[test]
    fn new_password_needs_confirmation() {
        let prompt = ScriptedPrompt::new(&["secret1", "secret1"]);
        assert_eq!(obtain_new_password(&prompt).unwrap().expose(), "secret1");

        let prompt = ScriptedPrompt::new(&["secret1", "secret2"]);
        assert_eq!(obtain_new_password(&prompt).err(), Some(Error::PasswordMismatch));

        let prompt = ScriptedPrompt::new(&["secret1", "s"]);
        assert_eq!(obtain_new_password(&prompt).err(), Some(Error::PasswordMismatch));

        let prompt = ScriptedPrompt::new(&["secret1"]);
        assert_eq!(obtain_new_password(&prompt).err(), Some(Error::CredentialUnavailable));

        let prompt = ScriptedPrompt::new(&["short", "short"]);
        assert_eq!(obtain_new_password(&prompt).err(), Some(Error::WeakPassword(6)));
    }

    proptest! {
        #[test]
        fn short_passwords_rejected(pass in "\\PC{0,5}") {
            prop_assert_eq!(Password::new(pass).err(), Some(Error::WeakPassword(MIN_PASSWORD_LENGTH)));
        }

        #[test]
        fn long_passwords_accepted(pass in "\\PC{6,40}") {
            let password = Password::new(pass.clone()).unwrap();
            prop_assert_eq!(password.expose(), pass.as_str());
        }
    }
}
