//! Sign-in session state machine.
//!
//! # Invariants
//! - State becomes `SignedIn` only after the provider accepts a sign-in.
//! - State becomes `SignedOut` only after the provider confirms sign-out.
//! - An Apple nonce is consumed by the first completion that follows it.

use crate::identity::nonce::{random_nonce, sha256_hex, DEFAULT_NONCE_LEN};
use crate::identity::{
    Credential, IdentityError, IdentityProvider, IdentityResult, SignInMethod, UserProfile,
};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInState {
    SignedIn,
    SignedOut,
}

/// Tracks the signed-in user on top of an `IdentityProvider`.
pub struct AuthSession<P: IdentityProvider> {
    provider: P,
    state: SignInState,
    pending_nonce: Option<String>,
}

impl<P: IdentityProvider> AuthSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: SignInState::SignedOut,
            pending_nonce: None,
        }
    }

    pub fn state(&self) -> SignInState {
        self.state
    }

    pub fn is_signed_in(&self) -> bool {
        self.state == SignInState::SignedIn
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.provider.current_user()
    }

    /// Display name, else email, else empty.
    pub fn display_name(&self) -> String {
        self.current_user()
            .map(|profile| profile.resolved_name().to_string())
            .unwrap_or_default()
    }

    /// Restores a remembered sign-in. Returns `Ok(None)` when there is none.
    pub fn restore(&mut self) -> IdentityResult<Option<Credential>> {
        if !self.provider.has_previous_sign_in() {
            return Ok(None);
        }
        self.sign_in(SignInMethod::RestorePrevious).map(Some)
    }

    pub fn sign_in(&mut self, method: SignInMethod) -> IdentityResult<Credential> {
        match self.provider.sign_in(&method) {
            Ok(credential) => {
                self.state = SignInState::SignedIn;
                info!(
                    "event=sign_in module=identity status=ok method={}",
                    method.label()
                );
                Ok(credential)
            }
            Err(err) => {
                error!(
                    "event=sign_in module=identity status=error method={} error={err}",
                    method.label()
                );
                Err(err)
            }
        }
    }

    pub fn sign_in_with_google(
        &mut self,
        id_token: impl Into<String>,
        access_token: impl Into<String>,
    ) -> IdentityResult<Credential> {
        self.sign_in(SignInMethod::Google {
            id_token: id_token.into(),
            access_token: access_token.into(),
        })
    }

    /// Starts an Apple sign-in and returns the hashed nonce for the request.
    ///
    /// A second call replaces the pending nonce.
    pub fn begin_apple_sign_in(&mut self) -> String {
        let nonce = random_nonce(DEFAULT_NONCE_LEN);
        let hashed = sha256_hex(&nonce);
        self.pending_nonce = Some(nonce);
        hashed
    }

    /// Finishes an Apple sign-in started by `begin_apple_sign_in`.
    ///
    /// `given_name` becomes the display name only when the profile has none.
    /// Failing to set it is logged and does not fail the sign-in.
    pub fn complete_apple_sign_in(
        &mut self,
        id_token: &str,
        given_name: Option<&str>,
    ) -> IdentityResult<Credential> {
        let raw_nonce = self.pending_nonce.take().ok_or(IdentityError::MissingNonce)?;
        if id_token.trim().is_empty() {
            return Err(IdentityError::MissingIdToken);
        }

        let credential = self.sign_in(SignInMethod::Apple {
            id_token: id_token.to_string(),
            raw_nonce,
        })?;

        let has_display_name = self
            .current_user()
            .and_then(|profile| profile.display_name)
            .is_some_and(|name| !name.is_empty());
        if !has_display_name {
            if let Some(name) = given_name.filter(|name| !name.trim().is_empty()) {
                if let Err(err) = self.provider.update_display_name(name) {
                    warn!("event=display_name_update module=identity status=error error={err}");
                }
            }
        }

        Ok(credential)
    }

    pub fn sign_out(&mut self) -> IdentityResult<()> {
        if !self.is_signed_in() {
            return Err(IdentityError::NotSignedIn);
        }
        match self.provider.sign_out() {
            Ok(()) => {
                self.state = SignInState::SignedOut;
                info!("event=sign_out module=identity status=ok");
                Ok(())
            }
            Err(err) => {
                error!("event=sign_out module=identity status=error error={err}");
                Err(err)
            }
        }
    }
}
