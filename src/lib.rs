//! # Paperwork Architecture
//!
//! Paperwork is the **document composition and record-persistence core** for
//! a family of near-identical business document services (purchase orders,
//! material requests, costing sheets, receipts, ...). It is a library with
//! no web framework, no auth and no route handlers — those are clients.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Workspace Facade (workspace.rs)                            │
//! │  - Wires config → stores → renderer → composer → registry   │
//! │  - Owns the render/merge/replace-artifact data flow         │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │  Storage (store/)        │   │  PDF (pdf/)                  │
//! │  - atomic: tmp + rename  │   │  - render: record → A4 pages │
//! │  - counter: number mint  │   │  - compose: merge + stamp    │
//! │  - collection: one JSON  │   │  - language: ltr/rtl detect  │
//! │    array file per domain │   └──────────────────────────────┘
//! └──────────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Reconciliation (registry.rs)                               │
//! │  - filename↔record join, orphan/broken diagnostics,         │
//! │    coupled record+file delete                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Invariants
//!
//! - A collection file on disk is always a complete, valid JSON array:
//!   every write goes through the atomic replace in [`store::atomic`].
//! - Document numbers are strictly increasing per counter and never reused,
//!   even after deletion; resetting a counter is an explicit administrative
//!   operation that clears the owning collection in the same locked step.
//! - Every output page is exactly the canonical A4 size; foreign attachment
//!   pages are scaled to fit and centered, never cropped or stretched.
//! - Stamping draws into the header/footer bands of existing pages and
//!   never changes the page count.
//! - A record is never repointed at a file that does not exist: new
//!   artifacts are written before references move, and superseded files are
//!   removed last.
//!
//! ## Module Overview
//!
//! - [`workspace`]: the facade — entry point for domain workflows
//! - [`store`]: atomic writer, counter store, collection store, queries
//! - [`pdf`]: renderer, merge/stamp engine, direction detection
//! - [`registry`]: cross-collection file reconciliation
//! - [`artifact`]: filename convention and artifact replacement
//! - [`model`]: `Record`, `DocumentPayload`, `DocumentBody`
//! - [`config`]: workspace configuration and number formats
//! - [`error`]: error types

pub mod artifact;
pub mod config;
pub mod error;
pub mod model;
pub mod pdf;
pub mod registry;
pub mod store;
pub mod workspace;

#[cfg(test)]
pub mod test_utils;
