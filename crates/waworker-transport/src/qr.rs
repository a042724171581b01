// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR payload rendering for the dashboard.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use qrcode::render::svg;
use qrcode::QrCode;

use waworker_core::WorkerError;

/// Render a pairing payload as an SVG data URL the dashboard can drop
/// straight into an `<img>` tag.
pub fn svg_data_url(payload: &str) -> Result<String, WorkerError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| WorkerError::Transport {
        message: "render qr payload".into(),
        source: Some(Box::new(e)),
    })?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image.as_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_data_url() {
        let url = svg_data_url("2@abcdef").unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));

        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn distinct_payloads_render_distinct_images() {
        let a = svg_data_url("2@first").unwrap();
        let b = svg_data_url("2@second").unwrap();
        assert_ne!(a, b);
    }
}
