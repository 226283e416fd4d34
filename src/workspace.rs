//! # Workspace Facade
//!
//! Thin wiring over the layers below, mirroring the data flow of a domain
//! workflow: create a record through its collection store (which mints the
//! number from the shared counter file), render it, merge attachments and
//! the stamping pass, write the artifact under the filename convention, and
//! repoint the record. No business logic lives here; each step is owned by
//! the module that implements it.

use crate::artifact;
use crate::config::WorkspaceConfig;
use crate::error::Result;
use crate::model::{DocumentPayload, Record};
use crate::pdf::compose::{compose, Attachment, Logo, StampSpec};
use crate::pdf::render::Renderer;
use crate::registry::FileRegistry;
use crate::store::{ArtifactSource, CollectionSpec, CollectionStore, CounterStore};
use chrono::Utc;
use std::fs;
use std::sync::Arc;
use uuid::Uuid;

const COUNTER_FILENAME: &str = "counters.json";

pub struct Workspace {
    config: WorkspaceConfig,
    counters: Arc<CounterStore>,
}

impl Workspace {
    pub fn open(config: WorkspaceConfig) -> Self {
        let counters = Arc::new(CounterStore::new(config.data_dir.join(COUNTER_FILENAME)));
        Self { config, counters }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// A collection store wired to the shared counter file, with its data
    /// file and artifact directory derived from the workspace layout.
    pub fn collection<P: DocumentPayload>(&self, name: &str, counter: &str) -> CollectionStore<P> {
        let spec = CollectionSpec {
            name: name.to_string(),
            counter: counter.to_string(),
            number: self.config.number_format(counter),
            file: self.config.data_dir.join(format!("{}.json", name)),
            artifact_dir: self.config.artifacts_dir.join(name),
        };
        CollectionStore::new(spec, Arc::clone(&self.counters))
    }

    pub fn registry(&self, sources: Vec<Arc<dyn ArtifactSource>>) -> FileRegistry {
        FileRegistry::new(sources)
    }

    fn load_logo(&self) -> Result<Option<Logo>> {
        match &self.config.stamp.logo {
            Some(logo) => {
                let bytes = fs::read(&logo.path)?;
                Ok(Some(Logo::from_jpeg(bytes, logo.width, logo.height)?))
            }
            None => Ok(None),
        }
    }

    /// Render, merge and stamp one record's artifact, then repoint the
    /// record. The superseded artifact file (if any) is removed only after
    /// the new file is durable and the record references it; a failure
    /// anywhere earlier leaves the previous artifact untouched.
    pub fn compose_artifact<P: DocumentPayload>(
        &self,
        store: &CollectionStore<P>,
        id: Uuid,
        attachments: Vec<Attachment>,
    ) -> Result<Record<P>> {
        let record = store.get(id)?;
        let previous = record.artifact_filename.clone();

        let renderer = Renderer::new(self.config.fallback_direction);
        let rendered = renderer.render(&record)?;
        let direction = rendered.direction;

        let stamp = StampSpec {
            document_code: record.number.clone(),
            issued_on: Utc::now(),
            accent: self.config.stamp.accent,
            logo: self.load_logo()?,
        };
        let mut composed = compose(rendered, attachments, &stamp)?;
        let bytes = composed.to_bytes()?;

        let filename =
            artifact::artifact_filename(&record.number, record.payload.primary_text(), Utc::now());
        artifact::write_artifact(&store.spec().artifact_dir, &filename, &bytes)?;

        let updated = store.set_artifact(id, Some(filename.clone()), Some(direction))?;
        if let Some(previous) = previous {
            if previous != filename {
                artifact::remove_artifact(&store.spec().artifact_dir, &previous);
            }
        }
        Ok(updated)
    }
}
