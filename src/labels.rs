// ABOUTME: Printable label generation: a QR code pointing at the record, framed in an SVG template
// ABOUTME: Each generated label is also stored as a Label record for the item or container

use qrcode::{Color, QrCode};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::mutators::{ContainerMutator, ItemMutator, LabelMutator};
use crate::schema::{GenerateLabelRequest, LabelTarget};

pub const FORMAT_SHIPPING: &str = "shipping-4x6";
pub const FORMAT_ADDRESS: &str = "address-30x100";

const QR_SIZE: u32 = 200;
const QR_MARGIN: usize = 1;
const ADDRESS_LABEL_CHARS: usize = 15;

#[derive(Debug, Clone)]
pub struct GeneratedLabel {
    pub svg: String,
    pub label_id: String,
}

pub fn escape_xml(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn label_url(app_url: &str, target: LabelTarget, target_id: &str) -> String {
    format!(
        "{}/inventory/{}s/{}",
        app_url.trim_end_matches('/'),
        target.as_str(),
        target_id
    )
}

/// Renders `content` as a square QR code SVG with a one-module quiet zone.
pub fn render_qr(content: &str) -> Result<String> {
    let code = QrCode::new(content.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;

    let modules = code.width();
    let colors = code.to_colors();
    let span = modules + 2 * QR_MARGIN;

    let mut path = String::new();
    for (index, color) in colors.iter().enumerate() {
        if *color == Color::Dark {
            let x = index % modules + QR_MARGIN;
            let y = index / modules + QR_MARGIN;
            path.push_str(&format!("M{} {}h1v1h-1z", x, y));
        }
    }

    Ok(format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {span} {span}" shape-rendering="crispEdges"><rect width="{span}" height="{span}" fill="#ffffff"/><path d="{path}" fill="#000000"/></svg>"##,
        size = QR_SIZE,
        span = span,
        path = path,
    ))
}

fn sized_qr(qr_svg: &str, size: u32) -> String {
    qr_svg.replacen(
        &format!(r#"width="{0}" height="{0}""#, QR_SIZE),
        &format!(r#"width="{0}" height="{0}""#, size),
        1,
    )
}

/// Frames the QR code in the template named by `format`. Unknown formats get the bare QR code.
pub fn render_label(
    format: &str,
    qr_svg: &str,
    target: LabelTarget,
    label_text: &str,
    sub_text: &str,
    label_id: &str,
) -> String {
    match format {
        FORMAT_SHIPPING => format!(
            r##"<svg viewBox="0 0 400 600" xmlns="http://www.w3.org/2000/svg" style="background: white;">
  <rect x="10" y="10" width="380" height="580" fill="none" stroke="black" stroke-width="2"/>
  <text x="200" y="50" font-family="Arial, sans-serif" font-size="24" text-anchor="middle" font-weight="bold">INVENTORY LABEL</text>
  <text x="200" y="90" font-family="Arial, sans-serif" font-size="18" text-anchor="middle">{kind}</text>
  <g transform="translate(100, 120)">{qr}</g>
  <text x="200" y="360" font-family="Arial, sans-serif" font-size="20" text-anchor="middle" font-weight="bold">{label}</text>
  <text x="200" y="390" font-family="Arial, sans-serif" font-size="14" text-anchor="middle" fill="#666">{sub}</text>
  <text x="200" y="550" font-family="Arial, sans-serif" font-size="12" text-anchor="middle">Label ID: {id}</text>
</svg>"##,
            kind = target.as_str().to_uppercase(),
            qr = sized_qr(qr_svg, 200),
            label = escape_xml(label_text),
            sub = escape_xml(sub_text),
            id = escape_xml(label_id),
        ),
        FORMAT_ADDRESS => {
            // Truncate first so an entity is never cut in half
            let short: String = label_text.chars().take(ADDRESS_LABEL_CHARS).collect();
            format!(
                r##"<svg viewBox="0 0 400 120" xmlns="http://www.w3.org/2000/svg" style="background: white;">
  <g transform="translate(10, 10)">{qr}</g>
  <text x="120" y="40" font-family="Arial, sans-serif" font-size="24" font-weight="bold">{label}</text>
  <text x="120" y="70" font-family="Arial, sans-serif" font-size="16" fill="#666">{sub}</text>
  <text x="120" y="100" font-family="Arial, sans-serif" font-size="10">ID: {id}</text>
</svg>"##,
                qr = sized_qr(qr_svg, 100),
                label = escape_xml(&short),
                sub = escape_xml(sub_text),
                id = escape_xml(label_id),
            )
        }
        _ => qr_svg.to_string(),
    }
}

/// Looks up the owned target, records the label, then renders it.
pub async fn generate_label<C>(
    db: &C,
    user_id: &str,
    app_url: &str,
    request: &GenerateLabelRequest,
) -> Result<GeneratedLabel>
where
    C: ConnectionTrait + TransactionTrait,
{
    let (label_text, target_ref) = match request.target_type {
        LabelTarget::Item => {
            let item = ItemMutator::new(db, user_id).get_by_id(&request.target_id).await?;
            let text = Some(item.item_label).filter(|l| !l.is_empty());
            (text.unwrap_or_else(|| "Item".to_string()), "item_id")
        }
        LabelTarget::Container => {
            let container = ContainerMutator::new(db, user_id)
                .get_by_id(&request.target_id)
                .await?;
            let text = Some(container.container_label).filter(|l| !l.is_empty());
            (text.unwrap_or_else(|| "Container".to_string()), "container_id")
        }
    };

    let label = LabelMutator::new(db)
        .create(&json!({
            target_ref: request.target_id,
            "format": request.format,
            "data": {
                "generated": chrono::Utc::now().to_rfc3339(),
                "target_type": request.target_type,
            },
        }))
        .await?;

    let qr_svg = render_qr(&label_url(app_url, request.target_type, &request.target_id))?;
    let svg = render_label(
        &request.format,
        &qr_svg,
        request.target_type,
        &label_text,
        &request.target_id,
        &label.id,
    );

    tracing::info!(
        label_id = %label.id,
        target_id = %request.target_id,
        format = %request.format,
        "Generated label"
    );

    Ok(GeneratedLabel {
        svg,
        label_id: label.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml_covers_markup_characters() {
        assert_eq!(
            escape_xml(r#"<Bolts & "Nuts" 'M3'>"#),
            "&lt;Bolts &amp; &quot;Nuts&quot; &apos;M3&apos;&gt;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_label_url_pluralises_target() {
        assert_eq!(
            label_url("http://localhost:3000/", LabelTarget::Container, "abc"),
            "http://localhost:3000/inventory/containers/abc"
        );
    }

    #[test]
    fn test_render_qr_is_square_svg() {
        let svg = render_qr("http://localhost:3000/inventory/items/abc").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="200" height="200""#));
        assert!(svg.contains(r##"fill="#000000""##));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_shipping_template_escapes_text() {
        let qr = render_qr("x").unwrap();
        let svg = render_label(
            FORMAT_SHIPPING,
            &qr,
            LabelTarget::Item,
            "Tape & Glue",
            "abc",
            "lbl1",
        );

        assert!(svg.contains(r#"viewBox="0 0 400 600""#));
        assert!(svg.contains(">ITEM<"));
        assert!(svg.contains("Tape &amp; Glue"));
        assert!(svg.contains("Label ID: lbl1"));
    }

    #[test]
    fn test_address_template_truncates_before_escaping() {
        let qr = render_qr("x").unwrap();
        let svg = render_label(
            FORMAT_ADDRESS,
            &qr,
            LabelTarget::Container,
            "Screws & Bolts Drawer Two",
            "abc",
            "lbl1",
        );

        assert!(svg.contains(r#"viewBox="0 0 400 120""#));
        assert!(svg.contains(">Screws &amp; Bolts <"));
        assert!(svg.contains(r#"width="100" height="100""#));
        assert!(svg.contains("ID: lbl1"));
    }

    #[test]
    fn test_unknown_format_returns_bare_qr() {
        let qr = render_qr("x").unwrap();
        assert_eq!(
            render_label("qr-only", &qr, LabelTarget::Item, "Drill", "abc", "lbl1"),
            qr
        );
    }
}
