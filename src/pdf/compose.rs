//! Page-level merge and stamping.
//!
//! The base document's own pages always come first, then each attachment in
//! the order supplied by the caller; ordering is the visible contract, not a
//! calling convention. Foreign pages that do not match the canonical size
//! are proportionally scaled to fit and centered, never cropped or stretched
//! anisotropically. After concatenation, one stamping pass draws the
//! header/footer bands on every page; it never adds or removes pages.

use crate::error::{PaperworkError, Result};
use crate::model::Direction;
use crate::pdf::render::RenderedDocument;
use crate::pdf::{as_number, encode_text, text_width, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::PathBuf;

const STAMP_FONT: &str = "PwStampF";
const STAMP_LOGO: &str = "PwStampLogo";

// Header/footer band geometry (the renderer keeps these bands clear).
const HEADER_RULE_Y: f32 = PAGE_HEIGHT - 98.0;
const HEADER_TEXT_Y: f32 = PAGE_HEIGHT - 92.0;
const LOGO_BASE_Y: f32 = PAGE_HEIGHT - 88.0;
const LOGO_HEIGHT: f32 = 30.0;
const FOOTER_RULE_Y: f32 = 64.0;
const FOOTER_TEXT_Y: f32 = 50.0;

/// An external document queued for merging, by bytes or by path.
/// Either way it must parse as a well-formed, unencrypted PDF before it is
/// accepted into the merge list.
#[derive(Debug, Clone)]
pub enum Attachment {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// Raster logo for the header band: raw JPEG, embedded as-is.
#[derive(Debug, Clone)]
pub struct Logo {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl Logo {
    pub fn from_jpeg(jpeg: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if jpeg.len() < 4 || jpeg[0] != 0xFF || jpeg[1] != 0xD8 {
            return Err(PaperworkError::InvalidInput(
                "logo is not a JPEG image".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(PaperworkError::InvalidInput(
                "logo dimensions must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            jpeg,
            width,
            height,
        })
    }

    fn display_width(&self) -> f32 {
        LOGO_HEIGHT * self.width as f32 / self.height as f32
    }
}

/// Everything the stamping pass draws: logo, rules, issue date, document
/// code and pagination captions.
#[derive(Debug, Clone)]
pub struct StampSpec {
    pub document_code: String,
    pub issued_on: DateTime<Utc>,
    pub accent: [f32; 3],
    pub logo: Option<Logo>,
}

/// Merge attachments after the base pages and stamp every resulting page.
/// With no attachments this is a pure stamping pass, not a no-op.
pub fn compose(
    mut base: RenderedDocument,
    attachments: Vec<Attachment>,
    stamp: &StampSpec,
) -> Result<RenderedDocument> {
    for attachment in attachments {
        let doc = load_attachment(attachment)?;
        append_document(&mut base.doc, doc)?;
    }
    stamp_pages(&mut base.doc, base.direction, stamp)?;
    Ok(base)
}

fn load_attachment(attachment: Attachment) -> Result<Document> {
    let loaded = match &attachment {
        Attachment::Bytes(bytes) => Document::load_mem(bytes),
        Attachment::Path(path) => {
            if !path.exists() {
                return Err(PaperworkError::FileNotFound(path.display().to_string()));
            }
            Document::load(path)
        }
    };
    let doc = loaded.map_err(|e| {
        PaperworkError::InvalidInput(format!("attachment is not a well-formed PDF: {}", e))
    })?;
    if doc.is_encrypted() {
        return Err(PaperworkError::InvalidInput(
            "attachment is encrypted".to_string(),
        ));
    }
    if doc.get_pages().is_empty() {
        return Err(PaperworkError::InvalidInput(
            "attachment has no pages".to_string(),
        ));
    }
    Ok(doc)
}

/// Walk the page tree upwards for an inheritable attribute. The walk is
/// depth-bounded: a malformed document can carry a `Parent` cycle, which
/// must terminate the lookup instead of the process.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut dict = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..64 {
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object(root_id)?.as_dict()?;
    Ok(catalog.get(b"Pages")?.as_reference()?)
}

/// Move every page of `other` to the end of `base`, materializing inherited
/// attributes and normalizing geometry on the way.
fn append_document(base: &mut Document, mut other: Document) -> Result<()> {
    other.renumber_objects_with(base.max_id + 1);
    let other_pages: Vec<ObjectId> = other.get_pages().into_values().collect();

    // Inherited attributes must be resolved against the source tree before
    // the pages are reparented.
    let mut staged: Vec<(ObjectId, Dictionary)> = Vec::new();
    for page_id in other_pages {
        let mut dict = other.get_object(page_id)?.as_dict()?.clone();
        for key in [b"Resources".as_slice(), b"MediaBox", b"Rotate"] {
            if !dict.has(key) {
                if let Some(value) = inherited(&other, page_id, key) {
                    dict.set(key, value);
                }
            }
        }
        staged.push((page_id, dict));
    }

    base.max_id = other.max_id;
    base.objects.extend(other.objects);

    let pages_id = pages_root(base)?;
    let mut new_kids: Vec<Object> = Vec::new();
    for (page_id, mut dict) in staged {
        normalize_geometry(base, &mut dict)?;
        dict.set("Parent", Object::Reference(pages_id));
        base.objects.insert(page_id, Object::Dictionary(dict));
        new_kids.push(Object::Reference(page_id));
    }

    let added = new_kids.len() as i64;
    let pages = base.get_object_mut(pages_id)?.as_dict_mut()?;
    let count = pages.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
    if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
        kids.extend(new_kids);
    } else {
        pages.set("Kids", Object::Array(new_kids));
    }
    pages.set("Count", count + added);
    Ok(())
}

fn media_box(dict: &Dictionary) -> Option<[f32; 4]> {
    let array = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, object) in rect.iter_mut().zip(array) {
        *slot = as_number(object)?;
    }
    Some(rect)
}

/// Scale-to-fit-and-center a foreign page into the canonical box.
///
/// The page's content is wrapped in a `q .. Q` pair (with a scaling CTM when
/// the box differs), so the original operators run untouched inside the
/// transformed space and cannot leak graphics state into the stamp.
fn normalize_geometry(doc: &mut Document, dict: &mut Dictionary) -> Result<()> {
    let rect = media_box(dict).unwrap_or([0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT]);
    let [x0, y0, x1, y1] = rect;
    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();

    let canonical = (width - PAGE_WIDTH).abs() < 0.5
        && (height - PAGE_HEIGHT).abs() < 0.5
        && x0.abs() < 0.5
        && y0.abs() < 0.5;

    let mut prefix = vec![Operation::new("q", vec![])];
    if !canonical && width > 0.0 && height > 0.0 {
        let scale = (PAGE_WIDTH / width).min(PAGE_HEIGHT / height);
        let tx = (PAGE_WIDTH - scale * width) / 2.0 - scale * x0.min(x1);
        let ty = (PAGE_HEIGHT - scale * height) / 2.0 - scale * y0.min(y1);
        prefix.push(Operation::new(
            "cm",
            vec![
                Object::Real(scale),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(scale),
                Object::Real(tx),
                Object::Real(ty),
            ],
        ));
    }

    let prefix_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations: prefix }.encode()?,
    ));
    let suffix_id = doc.add_object(Stream::new(
        dictionary! {},
        Content {
            operations: vec![Operation::new("Q", vec![])],
        }
        .encode()?,
    ));

    let mut contents: Vec<Object> = vec![Object::Reference(prefix_id)];
    match dict.remove(b"Contents") {
        Some(Object::Reference(id)) => contents.push(Object::Reference(id)),
        Some(Object::Array(items)) => contents.extend(items),
        Some(stream @ Object::Stream(_)) => {
            let id = doc.add_object(stream);
            contents.push(Object::Reference(id));
        }
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));
    dict.set("Contents", Object::Array(contents));

    dict.set(
        "MediaBox",
        vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ],
    );
    // Stale derived boxes would re-crop the rescaled content.
    for key in [b"CropBox".as_slice(), b"BleedBox", b"TrimBox", b"ArtBox"] {
        dict.remove(key);
    }
    Ok(())
}

/// Effective resources of a page as an owned dictionary, top-level
/// references resolved.
fn resolve_dict(doc: &Document, object: &Object) -> Dictionary {
    match object {
        Object::Dictionary(dict) => dict.clone(),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|resolved| resolved.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

/// Clone the page's resources and graft in the stamp font (and logo). The
/// clone is set directly on the page so shared resource dictionaries from
/// merged documents are never mutated in place.
fn stamp_resources(
    doc: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
    logo_id: Option<ObjectId>,
) -> Result<Dictionary> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let mut resources = page
        .get(b"Resources")
        .map(|object| resolve_dict(doc, object))
        .unwrap_or_default();

    let mut fonts = resources
        .get(b"Font")
        .map(|object| resolve_dict(doc, object))
        .unwrap_or_default();
    fonts.set(STAMP_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    if let Some(logo_id) = logo_id {
        let mut xobjects = resources
            .get(b"XObject")
            .map(|object| resolve_dict(doc, object))
            .unwrap_or_default();
        xobjects.set(STAMP_LOGO, Object::Reference(logo_id));
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    Ok(resources)
}

fn logo_xobject(logo: &Logo) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => logo.width as i64,
            "Height" => logo.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        logo.jpeg.clone(),
    )
}

fn show_stamp_text(ops: &mut Vec<Operation>, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), Object::Real(size)],
    ));
    ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_text(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn stamp_rule(ops: &mut Vec<Operation>, y: f32, accent: [f32; 3]) {
    ops.push(Operation::new("w", vec![Object::Real(1.0)]));
    ops.push(Operation::new(
        "RG",
        vec![
            Object::Real(accent[0]),
            Object::Real(accent[1]),
            Object::Real(accent[2]),
        ],
    ));
    ops.push(Operation::new(
        "m",
        vec![Object::Real(MARGIN), Object::Real(y)],
    ));
    ops.push(Operation::new(
        "l",
        vec![Object::Real(PAGE_WIDTH - MARGIN), Object::Real(y)],
    ));
    ops.push(Operation::new("S", vec![]));
}

/// Stamp operators for one page. Logo and issue date sit in the header band,
/// document code and pagination in the footer band; block placement mirrors
/// for right-to-left documents.
fn stamp_ops(
    page_number: usize,
    total: usize,
    direction: Direction,
    stamp: &StampSpec,
) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![])];
    let rtl = direction == Direction::Rtl;
    let right_edge = PAGE_WIDTH - MARGIN;

    if let Some(logo) = &stamp.logo {
        let logo_width = logo.display_width();
        let x = if rtl { right_edge - logo_width } else { MARGIN };
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(logo_width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(LOGO_HEIGHT),
                Object::Real(x),
                Object::Real(LOGO_BASE_Y),
            ],
        ));
        ops.push(Operation::new(
            "Do",
            vec![Object::Name(STAMP_LOGO.as_bytes().to_vec())],
        ));
        ops.push(Operation::new("Q", vec![]));
    }

    stamp_rule(&mut ops, HEADER_RULE_Y, stamp.accent);
    stamp_rule(&mut ops, FOOTER_RULE_Y, stamp.accent);

    ops.push(Operation::new(
        "rg",
        vec![Object::Real(0.25), Object::Real(0.25), Object::Real(0.25)],
    ));

    // Issue date opposite the logo.
    let issued = format!("Issued on {}", stamp.issued_on.format("%d-%m-%Y"));
    let issued_x = if rtl {
        MARGIN
    } else {
        right_edge - text_width(&issued, 9.0)
    };
    show_stamp_text(&mut ops, 9.0, issued_x, HEADER_TEXT_Y, &issued);

    let code_x = if rtl {
        right_edge - text_width(&stamp.document_code, 9.0)
    } else {
        MARGIN
    };
    show_stamp_text(&mut ops, 9.0, code_x, FOOTER_TEXT_Y, &stamp.document_code);

    let pagination = format!("Page {} of {}", page_number, total);
    let pagination_x = if rtl {
        MARGIN
    } else {
        right_edge - text_width(&pagination, 9.0)
    };
    show_stamp_text(&mut ops, 9.0, pagination_x, FOOTER_TEXT_Y, &pagination);

    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Draw the header/footer bands on every page. Draws only, never
/// repaginates: the page count before and after is identical.
fn stamp_pages(doc: &mut Document, direction: Direction, stamp: &StampSpec) -> Result<()> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = pages.len();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let logo_id = stamp.logo.as_ref().map(|logo| doc.add_object(logo_xobject(logo)));

    for (index, page_id) in pages.iter().enumerate() {
        promote_direct_contents(doc, *page_id)?;
        let resources = stamp_resources(doc, *page_id, font_id, logo_id)?;
        let ops = stamp_ops(index + 1, total, direction, stamp);
        let stream_id = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations: ops }.encode()?,
        ));

        let page = doc.get_object_mut(*page_id)?.as_dict_mut()?;
        page.set("Resources", Object::Dictionary(resources));
        let mut contents: Vec<Object> = match page.remove(b"Contents") {
            Some(Object::Reference(id)) => vec![Object::Reference(id)],
            Some(Object::Array(items)) => items,
            _ => Vec::new(),
        };
        contents.push(Object::Reference(stream_id));
        page.set("Contents", Object::Array(contents));
    }
    Ok(())
}

/// A `Contents` entry holding a direct stream cannot sit inside an array;
/// hoist it into its own indirect object first.
fn promote_direct_contents(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let is_direct = {
        let page = doc.get_object(page_id)?.as_dict()?;
        matches!(page.get(b"Contents"), Ok(Object::Stream(_)))
    };
    if !is_direct {
        return Ok(());
    }
    let stream = {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.remove(b"Contents")
    };
    if let Some(stream) = stream {
        let id = doc.add_object(stream);
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Contents", Object::Reference(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherited_terminates_on_parent_cycle() {
        let mut doc = Document::with_version("1.5");
        let node_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        doc.objects.insert(
            node_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => page_id,
            }),
        );
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => node_id,
            }),
        );

        // Neither node carries the attribute; the cyclic walk must give up
        assert!(inherited(&doc, page_id, b"Resources").is_none());
    }

    #[test]
    fn test_inherited_resolves_from_an_ancestor() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Rotate" => 90,
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });

        let rotate = inherited(&doc, page_id, b"Rotate");
        assert!(matches!(rotate, Some(Object::Integer(90))));
    }
}
