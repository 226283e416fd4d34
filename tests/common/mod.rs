//! Shared fixtures for integration tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use paperwork::config::WorkspaceConfig;
use paperwork::model::{DocumentBody, DocumentPayload, LineItem, NewRecord};
use paperwork::workspace::Workspace;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub supplier: String,
    pub items: Vec<(String, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DocumentPayload for OrderPayload {
    fn primary_text(&self) -> Option<&str> {
        Some(&self.supplier)
    }

    fn search_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.supplier.as_str()];
        texts.extend(self.items.iter().map(|(description, _)| description.as_str()));
        texts
    }

    fn body(&self) -> DocumentBody {
        DocumentBody {
            title: "Purchase Order".to_string(),
            counterparty: Some(self.supplier.clone()),
            meta: Vec::new(),
            items: self
                .items
                .iter()
                .map(|(description, quantity)| LineItem {
                    description: description.clone(),
                    quantity: *quantity,
                    unit: Some("pcs".to_string()),
                    unit_price: Some(10.0),
                })
                .collect(),
            notes: self.notes.clone(),
        }
    }
}

pub fn order(supplier: &str, item_count: usize, notes: Option<&str>) -> NewRecord<OrderPayload> {
    NewRecord {
        created_by: "amal".to_string(),
        payload: OrderPayload {
            supplier: supplier.to_string(),
            items: (0..item_count)
                .map(|i| (format!("Item {}", i + 1), 1.0))
                .collect(),
            notes: notes.map(str::to_string),
        },
    }
}

pub fn setup() -> (TempDir, Workspace) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let workspace = Workspace::open(WorkspaceConfig::rooted_at(dir.path()));
    (dir, workspace)
}

/// A minimal well-formed PDF with `pages` pages of the given size, each
/// carrying one line of text.
pub fn make_pdf(pages: usize, width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for index in 0..pages {
        let text = format!("Attachment page {}", index + 1);
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Real(18.0)],
                ),
                Operation::new(
                    "Td",
                    vec![Object::Real(72.0), Object::Real(height - 100.0)],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(text.into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let stream_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => stream_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
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

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

/// Concatenated `Tj` text of one page, decoded byte-per-character.
pub fn page_text(doc: &Document, page_number: u32) -> String {
    let pages = doc.get_pages();
    let page_id = pages[&page_number];
    let data = doc.get_page_content(page_id).expect("page content");
    let content = Content::decode(&data).expect("decode content");
    let mut text = String::new();
    for operation in &content.operations {
        if operation.operator == "Tj" {
            if let Some(Object::String(bytes, _)) = operation.operands.first() {
                text.extend(bytes.iter().map(|&b| b as char));
                text.push('\n');
            }
        }
    }
    text
}

/// The page's own MediaBox width/height.
pub fn page_size(doc: &Document, page_number: u32) -> (f32, f32) {
    let pages = doc.get_pages();
    let page_id = pages[&page_number];
    let dict = doc
        .get_object(page_id)
        .and_then(|object| object.as_dict())
        .expect("page dict");
    let array = dict
        .get(b"MediaBox")
        .and_then(|object| object.as_array())
        .expect("media box");
    let number = |object: &Object| match object {
        Object::Integer(value) => *value as f32,
        Object::Real(value) => *value,
        _ => panic!("non-numeric media box entry"),
    };
    (
        number(&array[2]) - number(&array[0]),
        number(&array[3]) - number(&array[1]),
    )
}
