//! Identity collaborator contract and sign-in session.
//!
//! # Responsibility
//! - Abstract the hosted identity provider behind `IdentityProvider`.
//! - Track signed-in state and resolve the user's display name.
//! - Generate the hashed nonce Apple sign-in requires.
//!
//! # Invariants
//! - Tokens and nonces are never logged.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod nonce;
pub mod session;

pub use session::{AuthSession, SignInState};

/// How the user is signing in.
#[derive(Clone, PartialEq, Eq)]
pub enum SignInMethod {
    /// Reuses a sign-in the provider remembers from an earlier run.
    RestorePrevious,
    Google {
        id_token: String,
        access_token: String,
    },
    /// `raw_nonce` is the unhashed value whose digest went into the request.
    Apple { id_token: String, raw_nonce: String },
}

impl SignInMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RestorePrevious => "restore",
            Self::Google { .. } => "google",
            Self::Apple { .. } => "apple",
        }
    }
}

impl std::fmt::Debug for SignInMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SignInMethod").field(&self.label()).finish()
    }
}

/// Provider-issued proof of a completed sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to email, then to an empty string.
    pub fn resolved_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider rejected or failed the request.
    Provider(String),
    /// An Apple completion arrived with no request in flight.
    MissingNonce,
    MissingIdToken,
    NotSignedIn,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(message) => write!(f, "identity provider error: {message}"),
            Self::MissingNonce => write!(
                f,
                "sign-in callback received without a pending sign-in request"
            ),
            Self::MissingIdToken => write!(f, "identity token is missing"),
            Self::NotSignedIn => write!(f, "no user is signed in"),
        }
    }
}

impl Error for IdentityError {}

/// Hosted identity service.
pub trait IdentityProvider {
    fn has_previous_sign_in(&self) -> bool;
    fn sign_in(&self, method: &SignInMethod) -> IdentityResult<Credential>;
    fn sign_out(&self) -> IdentityResult<()>;
    fn current_user(&self) -> Option<UserProfile>;
    fn update_display_name(&self, display_name: &str) -> IdentityResult<()>;
}
