//! Export renderers for identity documents.

pub mod pdf;
pub mod qr;
