use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Text direction of a rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// One business document's metadata plus its domain payload.
///
/// Identity fields (`id`, `number`, `created_by`, `created_at`) are assigned
/// on creation and never change afterwards; `number` is minted from the
/// collection's counter and is never reused, even after deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<P> {
    pub id: Uuid,
    pub number: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_language: Option<Direction>,
    #[serde(flatten)]
    pub payload: P,
}

/// Input for creating a record; everything else is stamped by the store.
#[derive(Debug, Clone)]
pub struct NewRecord<P> {
    pub created_by: String,
    pub payload: P,
}

/// A renderable line item for the document body table.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
}

/// Language-independent projection of a payload into the renderer's template.
///
/// Every section is optional: the renderer only draws a section when it has
/// content, so an empty `items` table or `notes` block leaves no gap in the
/// output.
#[derive(Debug, Clone, Default)]
pub struct DocumentBody {
    pub title: String,
    pub counterparty: Option<String>,
    pub meta: Vec<(String, String)>,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
}

/// Domain payload contract: one trait instead of one service file per domain.
///
/// The store uses the serde bounds for persistence, the renderer uses
/// [`DocumentPayload::body`], and direction detection inspects
/// [`DocumentPayload::primary_text`] first, then the secondary fields.
pub trait DocumentPayload:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Headline text (typically the counterparty name). First candidate for
    /// direction detection and the middle segment of the artifact filename.
    fn primary_text(&self) -> Option<&str>;

    /// Additional text fields inspected for direction detection.
    fn secondary_texts(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Text fields matched by substring search in list queries.
    fn search_texts(&self) -> Vec<&str>;

    /// Projection into the renderer's template.
    fn body(&self) -> DocumentBody;
}

impl<P> Record<P> {
    pub(crate) fn new(number: String, created_by: String, payload: P) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number,
            created_by,
            created_at: now,
            updated_at: now,
            artifact_filename: None,
            artifact_language: None,
            payload,
        }
    }
}
