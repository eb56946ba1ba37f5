//! Authentication state holder.
//!
//! Owns the signed-in user. Login and registration persist the bearer token
//! and the user in client storage and publish the user to subscribers; logout
//! clears both and publishes `None`.

use std::sync::Arc;

use kotob_core::{AuthSession, Email, User};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, MessageResponse, endpoints};
use crate::error::ClientError;
use crate::storage::{SharedStorage, get_json, keys, set_json};

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Registration request.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub phone: String,
    pub address: String,
    pub age: u32,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a Email,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    #[serde(serialize_with = "expose")]
    password: &'a SecretString,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Authentication state holder.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthServiceInner>,
}

struct AuthServiceInner {
    api: ApiClient,
    storage: SharedStorage,
    current_user: watch::Sender<Option<User>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("current_user", &*self.inner.current_user.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create the holder, restoring a stored session.
    ///
    /// The stored user is only restored when a token is stored alongside it;
    /// an unreadable user snapshot counts as signed out.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let storage = Arc::clone(api.storage());
        let restored = restore_user(&storage);
        debug!(signed_in = restored.is_some(), "Auth state initialized");

        let (current_user, _) = watch::channel(restored);
        Self {
            inner: Arc::new(AuthServiceInner {
                api,
                storage,
                current_user,
            }),
        }
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the backend's message if the login is
    /// rejected, or if the session cannot be stored.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let session: AuthSession = self
            .inner
            .api
            .post(endpoints::LOGIN, credentials)
            .await
            .map_err(ClientError::request(
                "login",
                "حدث خطأ في تسجيل الدخول. يرجى المحاولة مرة أخرى.",
            ))?;
        self.set_session(session)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the backend's message if registration is
    /// rejected, or if the session cannot be stored.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ClientError> {
        let session: AuthSession = self
            .inner
            .api
            .post(endpoints::REGISTER, registration)
            .await
            .map_err(ClientError::request(
                "register",
                "حدث خطأ في إنشاء الحساب. يرجى المحاولة مرة أخرى.",
            ))?;
        self.set_session(session)
    }

    /// Ask the backend to email a password reset link.
    ///
    /// Returns the backend's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<Option<String>, ClientError> {
        let response: MessageResponse = self
            .inner
            .api
            .post(endpoints::FORGOT_PASSWORD, &ForgotPasswordRequest { email })
            .await
            .map_err(ClientError::request(
                "forgot password",
                "فشل في إرسال رابط إعادة تعيين كلمة المرور",
            ))?;
        Ok(response.message)
    }

    /// Set a new password using an emailed reset token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &SecretString,
    ) -> Result<Option<String>, ClientError> {
        let response: MessageResponse = self
            .inner
            .api
            .put(
                &endpoints::reset_password(token),
                &ResetPasswordRequest { password },
            )
            .await
            .map_err(ClientError::request(
                "reset password",
                "فشل في إعادة تعيين كلمة المرور",
            ))?;
        Ok(response.message)
    }

    /// Sign out: forget the token and user and publish `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written. Subscribers are
    /// notified either way.
    pub fn logout(&self) -> Result<(), ClientError> {
        let token = self.inner.storage.remove(keys::TOKEN);
        let user = self.inner.storage.remove(keys::CURRENT_USER);
        self.inner.current_user.send_replace(None);
        info!("Signed out");
        token?;
        user?;
        Ok(())
    }

    /// Whether both a token and a user are present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token().is_some() && self.inner.current_user.borrow().is_some()
    }

    /// Whether the signed-in user is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .current_user
            .borrow()
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// The signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.current_user.borrow().clone()
    }

    /// Receiver that observes sign-in and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.current_user.subscribe()
    }

    /// The stored bearer token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match self.inner.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn set_session(&self, session: AuthSession) -> Result<User, ClientError> {
        let AuthSession { token, user } = session;
        self.inner.storage.set(keys::TOKEN, &token)?;
        set_json(self.inner.storage.as_ref(), keys::CURRENT_USER, &user)?;
        self.inner.current_user.send_replace(Some(user.clone()));
        info!(user_id = %user.id, admin = user.is_admin(), "Signed in");
        Ok(user)
    }
}

fn restore_user(storage: &SharedStorage) -> Option<User> {
    let token = storage.get(keys::TOKEN).ok().flatten().filter(|t| !t.is_empty());
    token?;
    match get_json::<User>(storage.as_ref(), keys::CURRENT_USER) {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable stored user");
            None
        }
    }
}
