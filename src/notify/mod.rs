//! OTP delivery abstraction.
//!
//! The login and resend flows hand freshly issued codes to an [`OtpNotifier`]
//! instead of baking the delivery channel into the handlers. Production wires
//! an SMS or push gateway here; local development uses [`LogOtpNotifier`],
//! which logs the code and returns `Ok`. The code is additionally echoed in
//! the HTTP response only when the server runs with `--expose-otp`.

use anyhow::Result;
use tracing::info;

/// Out-of-band delivery channel for one-time passcodes.
pub trait OtpNotifier: Send + Sync {
    /// Deliver the code to whatever channel the citizen registered.
    ///
    /// # Errors
    /// Returns an error when delivery definitively failed; the auth flow logs
    /// it but does not fail the login, since the code can be resent.
    fn deliver(&self, national_id: &str, code: &str) -> Result<()>;
}

/// Local dev notifier that logs instead of sending.
#[derive(Clone, Debug)]
pub struct LogOtpNotifier;

impl OtpNotifier for LogOtpNotifier {
    fn deliver(&self, national_id: &str, code: &str) -> Result<()> {
        // The code itself is intentionally not logged.
        info!(
            national_id = %national_id,
            code_len = code.len(),
            "otp delivery stub"
        );
        Ok(())
    }
}
