pub mod types;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod otp;
pub use self::otp::{resend_otp, verify_otp};
