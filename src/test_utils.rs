use crate::config::WorkspaceConfig;
use crate::model::{DocumentBody, DocumentPayload, LineItem};
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::TempDir;

/// A representative domain payload (purchase-order-shaped) for tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub supplier: String,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
}

impl DocumentPayload for OrderPayload {
    fn primary_text(&self) -> Option<&str> {
        Some(&self.supplier)
    }

    fn secondary_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self.items.iter().map(|i| i.description.as_str()).collect();
        if let Some(notes) = self.notes.as_deref() {
            texts.push(notes);
        }
        texts
    }

    fn search_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.supplier.as_str()];
        texts.extend(self.items.iter().map(|i| i.description.as_str()));
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
                .map(|item| LineItem {
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit: Some(item.unit.clone()),
                    unit_price: Some(item.unit_price),
                })
                .collect(),
            notes: self.notes.clone(),
        }
    }
}

impl OrderPayload {
    pub fn sample(supplier: &str) -> Self {
        Self {
            supplier: supplier.to_string(),
            items: vec![OrderItem {
                description: "Steel sheet 2mm".to_string(),
                quantity: 12.0,
                unit: "pcs".to_string(),
                unit_price: 48.5,
            }],
            notes: None,
        }
    }
}

pub struct TestEnv {
    // Kept so the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub workspace: Workspace,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let workspace = Workspace::open(WorkspaceConfig::rooted_at(&root));
        Self {
            _temp_dir: temp_dir,
            workspace,
            root,
        }
    }
}
