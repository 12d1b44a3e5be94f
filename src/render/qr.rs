//! QR export of the identity key.

use anyhow::{anyhow, Context, Result};
use base64ct::{Base64, Encoding};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde_json::json;

/// Encode `{"national_id": ...}` as a QR image (error-correction level H)
/// and return it as a base64 data URL the client can drop into an `img` tag.
///
/// The payload is SVG (`data:image/svg+xml;base64,`), which scales without
/// artifacts. Clients that require a raster media type must rasterize it
/// themselves; the data-URL contract is otherwise the same as for PNG.
///
/// # Errors
/// Returns an error if the payload does not fit a QR symbol.
pub fn identity_qr_data_url(national_id: &str) -> Result<String> {
    let payload = serde_json::to_string(&json!({ "national_id": national_id }))
        .context("failed to serialize QR payload")?;

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|err| anyhow!("failed to build QR code: {err}"))?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .build();

    Ok(format!(
        "data:image/svg+xml;base64,{}",
        Base64::encode_string(image.as_bytes())
    ))
}
