//! Record-to-PDF renderer.
//!
//! One parameterized template instead of one generator per domain: the
//! payload projects itself into a [`DocumentBody`] and the renderer lays it
//! out. Sections render only when they have content; the line-items table
//! flows across pages. Header and footer bands are left clear for the
//! stamping pass in [`super::compose`].

use crate::error::Result;
use crate::model::{Direction, DocumentBody, DocumentPayload, Record};
use crate::pdf::{encode_text, language, text_width, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

// Body band: below the header band, above the footer band.
const BODY_TOP: f32 = PAGE_HEIGHT - 130.0;
const BODY_BOTTOM: f32 = 85.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Captions used by the body template. Defaults are English; callers
/// localize by overriding per direction on the [`Renderer`].
#[derive(Debug, Clone)]
pub struct LabelSet {
    pub number: String,
    pub date: String,
    pub prepared_by: String,
    pub description: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub notes: String,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            number: "No.".to_string(),
            date: "Date".to_string(),
            prepared_by: "Prepared by".to_string(),
            description: "Description".to_string(),
            quantity: "Qty".to_string(),
            unit: "Unit".to_string(),
            unit_price: "Unit price".to_string(),
            notes: "Notes".to_string(),
        }
    }
}

/// An immutable paginated document plus its detected direction.
///
/// Created once by the renderer, consumed read-only by the merge/stamp
/// engine, and replaced (never mutated) when the owning record changes.
pub struct RenderedDocument {
    pub doc: Document,
    pub direction: Direction,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

pub struct Renderer {
    pub fallback: Direction,
    pub labels_ltr: LabelSet,
    pub labels_rtl: LabelSet,
}

impl Renderer {
    pub fn new(fallback: Direction) -> Self {
        Self {
            fallback,
            labels_ltr: LabelSet::default(),
            labels_rtl: LabelSet::default(),
        }
    }

    fn labels(&self, direction: Direction) -> &LabelSet {
        match direction {
            Direction::Ltr => &self.labels_ltr,
            Direction::Rtl => &self.labels_rtl,
        }
    }

    /// Render a record into a canonical-size paginated document.
    pub fn render<P: DocumentPayload>(&self, record: &Record<P>) -> Result<RenderedDocument> {
        let mut fields: Vec<&str> = Vec::new();
        if let Some(primary) = record.payload.primary_text() {
            fields.push(primary);
        }
        fields.extend(record.payload.secondary_texts());
        let direction = language::detect(fields, self.fallback);

        let body = record.payload.body();
        let labels = self.labels(direction);
        let pages = layout_pages(record, &body, labels, direction);
        let doc = build_document(pages)?;
        Ok(RenderedDocument { doc, direction })
    }
}

struct PageBuilder {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: page_preamble(),
            y: BODY_TOP,
        }
    }

    /// Start a new page if fewer than `needed` points remain in the body band.
    fn ensure_room(&mut self, needed: f32) -> bool {
        if self.y - needed < BODY_BOTTOM {
            self.break_page();
            true
        } else {
            false
        }
    }

    fn break_page(&mut self) {
        let ops = std::mem::replace(&mut self.ops, page_preamble());
        self.pages.push(ops);
        self.y = BODY_TOP;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(self.ops);
        self.pages
    }
}

fn page_preamble() -> Vec<Operation> {
    // Dark gray text fill for the whole body.
    vec![Operation::new(
        "rg",
        vec![Object::Real(0.13), Object::Real(0.13), Object::Real(0.13)],
    )]
}

fn show_text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
    ));
    ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_text(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Left- or right-anchored text depending on direction.
fn show_aligned(
    ops: &mut Vec<Operation>,
    font: &str,
    size: f32,
    y: f32,
    text: &str,
    direction: Direction,
) {
    let x = match direction {
        Direction::Ltr => MARGIN,
        Direction::Rtl => RIGHT_EDGE - text_width(text, size),
    };
    show_text(ops, font, size, x, y, text);
}

fn stroke_line(ops: &mut Vec<Operation>, x0: f32, y: f32, x1: f32, width: f32) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new("w", vec![Object::Real(width)]));
    ops.push(Operation::new(
        "RG",
        vec![Object::Real(0.6), Object::Real(0.6), Object::Real(0.6)],
    ));
    ops.push(Operation::new("m", vec![Object::Real(x0), Object::Real(y)]));
    ops.push(Operation::new("l", vec![Object::Real(x1), Object::Real(y)]));
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Item table columns: (description anchor, quantity, unit, unit price).
/// Mirrored for right-to-left layout.
fn item_columns(direction: Direction) -> (f32, f32, f32, f32) {
    match direction {
        Direction::Ltr => (MARGIN, 330.0, 400.0, 470.0),
        Direction::Rtl => (RIGHT_EDGE, 210.0, 140.0, MARGIN),
    }
}

fn show_cell(
    ops: &mut Vec<Operation>,
    font: &str,
    size: f32,
    x: f32,
    y: f32,
    text: &str,
    right_align: bool,
) {
    let x = if right_align {
        x - text_width(text, size)
    } else {
        x
    };
    show_text(ops, font, size, x, y, text);
}

fn table_header(
    builder: &mut PageBuilder,
    labels: &LabelSet,
    direction: Direction,
) {
    let (desc_x, qty_x, unit_x, price_x) = item_columns(direction);
    let rtl = direction == Direction::Rtl;
    let y = builder.y;
    show_cell(&mut builder.ops, FONT_BOLD, 9.0, desc_x, y, &labels.description, rtl);
    show_cell(&mut builder.ops, FONT_BOLD, 9.0, qty_x, y, &labels.quantity, false);
    show_cell(&mut builder.ops, FONT_BOLD, 9.0, unit_x, y, &labels.unit, false);
    show_cell(&mut builder.ops, FONT_BOLD, 9.0, price_x, y, &labels.unit_price, false);
    stroke_line(&mut builder.ops, MARGIN, y - 5.0, RIGHT_EDGE, 0.75);
    builder.y -= 20.0;
}

fn layout_pages<P: DocumentPayload>(
    record: &Record<P>,
    body: &DocumentBody,
    labels: &LabelSet,
    direction: Direction,
) -> Vec<Vec<Operation>> {
    let mut builder = PageBuilder::new();
    let rtl = direction == Direction::Rtl;

    if !body.title.trim().is_empty() {
        show_aligned(&mut builder.ops, FONT_BOLD, 16.0, builder.y, &body.title, direction);
        builder.y -= 22.0;
    }
    if let Some(counterparty) = body.counterparty.as_deref() {
        if !counterparty.trim().is_empty() {
            show_aligned(&mut builder.ops, FONT_REGULAR, 11.0, builder.y, counterparty, direction);
            builder.y -= 18.0;
        }
    }
    builder.y -= 6.0;

    // Identity rows first, then the payload's own meta rows. Rows with
    // empty values are dropped, not rendered as blanks.
    let mut meta: Vec<(String, String)> = vec![
        (labels.number.clone(), record.number.clone()),
        (
            labels.date.clone(),
            record.created_at.format("%d-%m-%Y").to_string(),
        ),
        (labels.prepared_by.clone(), record.created_by.clone()),
    ];
    meta.extend(body.meta.iter().cloned());
    for (label, value) in meta.iter().filter(|(_, value)| !value.trim().is_empty()) {
        builder.ensure_room(16.0);
        let y = builder.y;
        match direction {
            Direction::Ltr => {
                show_text(&mut builder.ops, FONT_BOLD, 9.0, MARGIN, y, label);
                show_text(&mut builder.ops, FONT_REGULAR, 10.0, MARGIN + 110.0, y, value);
            }
            Direction::Rtl => {
                show_cell(&mut builder.ops, FONT_BOLD, 9.0, RIGHT_EDGE, y, label, true);
                show_cell(
                    &mut builder.ops,
                    FONT_REGULAR,
                    10.0,
                    RIGHT_EDGE - 110.0,
                    y,
                    value,
                    true,
                );
            }
        }
        builder.y -= 16.0;
    }

    if !body.items.is_empty() {
        builder.y -= 12.0;
        builder.ensure_room(40.0);
        table_header(&mut builder, labels, direction);
        let (desc_x, qty_x, unit_x, price_x) = item_columns(direction);
        for item in &body.items {
            if builder.ensure_room(14.0) {
                table_header(&mut builder, labels, direction);
            }
            let y = builder.y;
            show_cell(&mut builder.ops, FONT_REGULAR, 10.0, desc_x, y, &item.description, rtl);
            show_cell(
                &mut builder.ops,
                FONT_REGULAR,
                10.0,
                qty_x,
                y,
                &format_quantity(item.quantity),
                false,
            );
            if let Some(unit) = item.unit.as_deref() {
                show_cell(&mut builder.ops, FONT_REGULAR, 10.0, unit_x, y, unit, false);
            }
            if let Some(price) = item.unit_price {
                show_cell(
                    &mut builder.ops,
                    FONT_REGULAR,
                    10.0,
                    price_x,
                    y,
                    &format!("{:.2}", price),
                    false,
                );
            }
            builder.y -= 14.0;
        }
    }

    if let Some(notes) = body.notes.as_deref() {
        if !notes.trim().is_empty() {
            builder.y -= 14.0;
            builder.ensure_room(34.0);
            show_aligned(&mut builder.ops, FONT_BOLD, 9.0, builder.y, &labels.notes, direction);
            builder.y -= 14.0;
            for line in wrap_text(notes, 96) {
                builder.ensure_room(13.0);
                show_aligned(&mut builder.ops, FONT_REGULAR, 10.0, builder.y, &line, direction);
                builder.y -= 13.0;
            }
        }
    }

    builder.finish()
}

/// Greedy word wrap, honoring explicit newlines.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > max_chars
            {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Assemble a flat page tree: shared font resources, one content stream per
/// page, every page at the canonical size.
fn build_document(pages_ops: Vec<Vec<Operation>>) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for ops in pages_ops {
        let content = Content { operations: ops };
        let stream_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => stream_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_honors_newlines_and_width() {
        let lines = wrap_text("one two three\nfour", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_format_quantity_trims_integers() {
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(2.5), "2.50");
    }
}
