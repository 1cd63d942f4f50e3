use habits_core::identity::nonce::sha256_hex;
use habits_core::{
    AuthSession, Credential, IdentityError, IdentityProvider, IdentityResult, SignInMethod,
    SignInState, UserProfile,
};
use std::cell::RefCell;

#[derive(Default)]
struct FakeProvider {
    remembered: bool,
    fail_sign_in: bool,
    fail_sign_out: bool,
    profile: RefCell<Option<UserProfile>>,
    calls: RefCell<Vec<SignInMethod>>,
}

impl IdentityProvider for FakeProvider {
    fn has_previous_sign_in(&self) -> bool {
        self.remembered
    }

    fn sign_in(&self, method: &SignInMethod) -> IdentityResult<Credential> {
        self.calls.borrow_mut().push(method.clone());
        if self.fail_sign_in {
            return Err(IdentityError::Provider("token rejected".to_string()));
        }
        self.profile
            .borrow_mut()
            .get_or_insert_with(|| UserProfile {
                display_name: None,
                email: Some("ana@example.com".to_string()),
            });
        Ok(Credential {
            provider_id: method.label().to_string(),
            user_id: "user-1".to_string(),
        })
    }

    fn sign_out(&self) -> IdentityResult<()> {
        if self.fail_sign_out {
            return Err(IdentityError::Provider("network down".to_string()));
        }
        Ok(())
    }

    fn current_user(&self) -> Option<UserProfile> {
        self.profile.borrow().clone()
    }

    fn update_display_name(&self, display_name: &str) -> IdentityResult<()> {
        let mut profile = self.profile.borrow_mut();
        let profile = profile.as_mut().ok_or(IdentityError::NotSignedIn)?;
        profile.display_name = Some(display_name.to_string());
        Ok(())
    }
}

#[test]
fn google_sign_in_and_out_moves_state() {
    let mut session = AuthSession::new(FakeProvider::default());
    assert_eq!(session.state(), SignInState::SignedOut);

    let credential = session.sign_in_with_google("id", "access").unwrap();
    assert_eq!(credential.provider_id, "google");
    assert!(session.is_signed_in());

    session.sign_out().unwrap();
    assert_eq!(session.state(), SignInState::SignedOut);
    assert_eq!(session.sign_out().unwrap_err(), IdentityError::NotSignedIn);
}

#[test]
fn failed_sign_in_stays_signed_out() {
    let mut session = AuthSession::new(FakeProvider {
        fail_sign_in: true,
        ..FakeProvider::default()
    });

    let err = session.sign_in_with_google("id", "access").unwrap_err();
    assert!(matches!(err, IdentityError::Provider(_)));
    assert_eq!(session.state(), SignInState::SignedOut);
}

#[test]
fn failed_sign_out_stays_signed_in() {
    let mut session = AuthSession::new(FakeProvider {
        fail_sign_out: true,
        ..FakeProvider::default()
    });
    session.sign_in_with_google("id", "access").unwrap();

    assert!(session.sign_out().is_err());
    assert!(session.is_signed_in());
}

#[test]
fn restore_only_signs_in_when_provider_remembers_user() {
    let mut fresh = AuthSession::new(FakeProvider::default());
    assert_eq!(fresh.restore().unwrap(), None);
    assert!(!fresh.is_signed_in());

    let mut returning = AuthSession::new(FakeProvider {
        remembered: true,
        ..FakeProvider::default()
    });
    assert!(returning.restore().unwrap().is_some());
    assert!(returning.is_signed_in());
    assert_eq!(
        returning.provider().calls.borrow().as_slice(),
        &[SignInMethod::RestorePrevious]
    );
}

#[test]
fn display_name_falls_back_to_email_then_blank() {
    let mut session = AuthSession::new(FakeProvider::default());
    assert_eq!(session.display_name(), "");

    session.sign_in_with_google("id", "access").unwrap();
    assert_eq!(session.display_name(), "ana@example.com");
}

#[test]
fn apple_sign_in_sends_hash_and_consumes_raw_nonce() {
    let mut session = AuthSession::new(FakeProvider::default());
    let hashed = session.begin_apple_sign_in();
    assert_eq!(hashed.len(), 64);

    session.complete_apple_sign_in("apple-token", Some("Ana")).unwrap();

    let calls = session.provider().calls.borrow();
    match &calls[0] {
        SignInMethod::Apple { id_token, raw_nonce } => {
            assert_eq!(id_token, "apple-token");
            assert_eq!(sha256_hex(raw_nonce), hashed);
        }
        other => panic!("unexpected sign-in method: {other:?}"),
    }
    drop(calls);

    assert_eq!(session.display_name(), "Ana");
    assert_eq!(
        session.complete_apple_sign_in("again", None).unwrap_err(),
        IdentityError::MissingNonce
    );
}

#[test]
fn apple_sign_in_keeps_existing_display_name() {
    let provider = FakeProvider::default();
    *provider.profile.borrow_mut() = Some(UserProfile {
        display_name: Some("Existing".to_string()),
        email: None,
    });
    let mut session = AuthSession::new(provider);

    session.begin_apple_sign_in();
    session.complete_apple_sign_in("token", Some("Ana")).unwrap();
    assert_eq!(session.display_name(), "Existing");
}

#[test]
fn apple_completion_without_request_is_rejected() {
    let mut session = AuthSession::new(FakeProvider::default());
    assert_eq!(
        session.complete_apple_sign_in("token", None).unwrap_err(),
        IdentityError::MissingNonce
    );
    assert!(session.provider().calls.borrow().is_empty());
}
