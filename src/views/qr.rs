use qrcode::render::svg;
use qrcode::QrCode;

/// Render `data` as an inline SVG QR code, at least `size` pixels wide.
pub fn svg(data: &str, size: u32) -> Result<String, String> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| format!("QR encoding failed: {e}"))?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build())
}
