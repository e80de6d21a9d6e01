//! PDF rendering for quote documents.
//!
//! The layout is intentionally plain: an A4 page with an issuer header,
//! a client block, one line per item and the grand total. Everything is
//! drawn with the built-in Helvetica faces so no font files ship with
//! the binary.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use crate::models::QuoteStatus;

/// Rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF generation failed: {0}")]
    Render(String),
}

/// One party block on the document (issuer or client).
#[derive(Debug, Clone)]
pub struct DocumentParty {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Up to two uppercase initials, shown in the header badge.
    pub initials: String,
}

/// One priced line on the document.
#[derive(Debug, Clone)]
pub struct DocumentLine {
    pub quantity: i32,
    pub description: String,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Everything needed to render one quote, already joined and totalled.
#[derive(Debug, Clone)]
pub struct QuoteDocument {
    pub number: i32,
    pub issued_at: DateTime<Utc>,
    pub status: QuoteStatus,
    pub issuer: DocumentParty,
    pub client: DocumentParty,
    pub lines: Vec<DocumentLine>,
    pub total: f64,
}

// printpdf measures in f32 millimetres.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const BOTTOM_LIMIT_MM: f32 = 25.0;

/// Text cursor that adds pages as it walks down the document.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: printpdf::PdfLayerReference,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: printpdf::PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn write(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    /// Right-align by estimating the rendered width from the font size.
    fn write_right(&mut self, text: &str, size: f32, right_edge: f32, font: &IndirectFontRef) {
        // Average Helvetica glyph width is roughly half the point size.
        let approx_width_mm = text.chars().count() as f32 * size * 0.5 * 0.3528;
        let x = (right_edge - approx_width_mm).max(MARGIN_MM);
        self.write(text, size, x, font);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
        if self.y < BOTTOM_LIMIT_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Render a quote document to PDF bytes.
pub fn render_quote_pdf(document: &QuoteDocument) -> Result<Vec<u8>, PdfError> {
    let title = format!("Quote #{}", document.number);
    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Render(e.to_string()))?;

    let mut writer = PageWriter::new(&doc, doc.get_page(page).get_layer(layer));
    let right_edge = PAGE_WIDTH_MM - MARGIN_MM;

    // Header: issuer badge and identity on the left, quote metadata right.
    if !document.issuer.initials.is_empty() {
        writer.write(&document.issuer.initials, 22.0, MARGIN_MM, &bold);
    }
    writer.write_right(&title, 18.0, right_edge, &bold);
    writer.advance(LINE_HEIGHT_MM * 1.5);

    writer.write(&document.issuer.name, 12.0, MARGIN_MM, &bold);
    writer.write_right(
        &format!("Date: {}", document.issued_at.format("%Y-%m-%d")),
        10.0,
        right_edge,
        &regular,
    );
    writer.advance(LINE_HEIGHT_MM);

    writer.write(&document.issuer.email, 9.0, MARGIN_MM, &regular);
    writer.write_right(
        &format!("Status: {}", document.status),
        10.0,
        right_edge,
        &regular,
    );
    writer.advance(LINE_HEIGHT_MM);

    if let Some(phone) = &document.issuer.phone {
        writer.write(phone, 9.0, MARGIN_MM, &regular);
        writer.advance(LINE_HEIGHT_MM);
    }
    if let Some(address) = &document.issuer.address {
        writer.write(address, 9.0, MARGIN_MM, &regular);
        writer.advance(LINE_HEIGHT_MM);
    }
    writer.advance(LINE_HEIGHT_MM);

    // Client block.
    writer.write("Billed to", 10.0, MARGIN_MM, &bold);
    writer.advance(LINE_HEIGHT_MM);
    writer.write(&document.client.name, 11.0, MARGIN_MM, &regular);
    writer.advance(LINE_HEIGHT_MM);
    writer.write(&document.client.email, 9.0, MARGIN_MM, &regular);
    writer.advance(LINE_HEIGHT_MM);
    if let Some(phone) = &document.client.phone {
        writer.write(phone, 9.0, MARGIN_MM, &regular);
        writer.advance(LINE_HEIGHT_MM);
    }
    if let Some(address) = &document.client.address {
        writer.write(address, 9.0, MARGIN_MM, &regular);
        writer.advance(LINE_HEIGHT_MM);
    }
    writer.advance(LINE_HEIGHT_MM);

    // Item table header.
    writer.write("Qty", 10.0, MARGIN_MM, &bold);
    writer.write("Description", 10.0, MARGIN_MM + 18.0, &bold);
    writer.write("Unit", 10.0, MARGIN_MM + 120.0, &bold);
    writer.write_right("Subtotal", 10.0, right_edge, &bold);
    writer.advance(LINE_HEIGHT_MM);

    for line in &document.lines {
        writer.write(&line.quantity.to_string(), 10.0, MARGIN_MM, &regular);
        writer.write(&line.description, 10.0, MARGIN_MM + 18.0, &regular);
        writer.write(&money(line.unit_price), 10.0, MARGIN_MM + 120.0, &regular);
        writer.write_right(&money(line.subtotal), 10.0, right_edge, &regular);
        writer.advance(LINE_HEIGHT_MM);
    }

    writer.advance(LINE_HEIGHT_MM);
    writer.write_right(
        &format!("Total: {}", money(document.total)),
        13.0,
        right_edge,
        &bold,
    );

    doc.save_to_bytes().map_err(|e| PdfError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(lines: usize) -> QuoteDocument {
        QuoteDocument {
            number: 3,
            issued_at: Utc::now(),
            status: QuoteStatus::Sent,
            issuer: DocumentParty {
                name: "Acme Services".into(),
                email: "hello@acme.test".into(),
                phone: Some("555-0100".into()),
                address: Some("Main St, 42, Springfield - IL".into()),
                initials: "AS".into(),
            },
            client: DocumentParty {
                name: "Jane Roe".into(),
                email: "jane@example.test".into(),
                phone: None,
                address: None,
                initials: "JR".into(),
            },
            lines: (0..lines)
                .map(|i| DocumentLine {
                    quantity: 2,
                    description: format!("Line item {}", i + 1),
                    unit_price: 12.5,
                    subtotal: 25.0,
                })
                .collect(),
            total: lines as f64 * 25.0,
        }
    }

    #[test]
    fn renders_a_pdf() {
        let bytes = render_quote_pdf(&sample_document(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_documents_paginate() {
        // Enough lines to overflow one A4 page.
        let bytes = render_quote_pdf(&sample_document(80)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
