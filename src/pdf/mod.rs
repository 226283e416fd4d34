//! # PDF Layer
//!
//! Two stages over one page model:
//!
//! - [`render`]: turns a [`crate::model::Record`] into a paginated A4
//!   document (body content only; the header/footer bands stay clear).
//! - [`compose`]: splices external attachments after the base pages,
//!   normalizes every foreign page to the canonical size, then stamps
//!   headers and footers across the whole result. Runs even with zero
//!   attachments, so every artifact goes through the same stamping pass.
//!
//! [`language`] classifies record text as left-to-right or right-to-left;
//! the direction mirrors header/footer placement and body alignment.
//!
//! All geometry is in PDF points at the canonical page size. Text is set in
//! the built-in Helvetica faces; characters outside its byte encoding fall
//! back to `?` (direction handling is unaffected).

pub mod compose;
pub mod language;
pub mod render;

pub use compose::{compose, Attachment, Logo, StampSpec};
pub use render::{LabelSet, RenderedDocument, Renderer};

use lopdf::Object;

/// Canonical page size, A4 in PDF points. Every page the renderer produces
/// and every merged page is normalized to exactly this box.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

/// Horizontal page margin shared by the body template and the stamp bands.
pub const MARGIN: f32 = 50.0;

/// Encode text for the built-in fonts: one byte per character, `?` for
/// anything outside the Latin-1 range.
pub(crate) fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// Approximate Helvetica advance width. Exact metrics are not needed: this
/// only drives right-alignment inside generous margins.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    0.52 * size * text.chars().count() as f32
}

/// Numeric value of a PDF object, if it is one.
pub(crate) fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text_replaces_non_latin() {
        assert_eq!(encode_text("PO-7"), b"PO-7".to_vec());
        assert_eq!(encode_text("شركة"), b"????".to_vec());
    }
}
