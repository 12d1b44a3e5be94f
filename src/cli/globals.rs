use secrecy::SecretString;

/// Configuration shared with the handlers through an axum extension.
///
/// The signing key lives here as a [`SecretString`] and is handed to the
/// session issuer exactly once at router construction.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub jwt_secret: SecretString,
    /// Development stub: echo freshly issued OTP codes in auth responses
    /// instead of relying solely on the notifier. Never enable in production.
    pub expose_otp: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            expose_otp: false,
        }
    }
}
