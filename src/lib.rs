//! # Hawiya
//!
//! `hawiya` is a citizen-identity lookup API. It authenticates a citizen
//! against the national civil registry, issues a short-lived session, and
//! returns previously registered identity documents (person card, driving
//! license, passport, generic documents) including image URLs and PDF/QR
//! exports.
//!
//! ## Flow
//!
//! 1. **Register**: the claimed national id must exist in the civil registry
//!    and the claimed phone number must be registered to it in the telecom
//!    table before an account row is created.
//! 2. **Login**: password check, then a 6-digit OTP (2 minute window) is
//!    issued together with a 1 hour stateless session token (HS256 JWT).
//! 3. **Protected reads**: every document endpoint resolves the citizen from
//!    the bearer token; nothing is looked up by client-supplied ids.
//!
//! The `users` table is the only state the service owns; registry and
//! document tables are read models maintained by the issuing authorities.
//! See `db/schema.sql`.

pub mod api;
pub mod cli;
pub mod documents;
pub mod notify;
pub mod otp;
pub mod password;
pub mod registry;
pub mod render;
pub mod session;
pub mod users;
