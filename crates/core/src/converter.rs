//! Conversion orchestration.
//!
//! [`Converter`] owns one run: it reads the selected input collections,
//! threads a single [`ReferenceTable`] through the users and groups
//! pipelines, and writes one document per converted collection.
//!
//! Run order is fixed: users, computers, groups, domains. When groups are
//! converted without users, the users collection is still read to populate
//! the reference table before any membership is resolved.
//!
//! Output documents are serialized fully in memory, written to a temporary
//! file in the destination directory and renamed into place, so a failed
//! run never leaves a truncated document behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::bloodhound::CollectionKind;
use crate::config::ConvertConfig;
use crate::directory::RawEntity;
use crate::errors::ConvertError;
use crate::pipeline::{self, Collection};
use crate::refs::ReferenceTable;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Which collections to convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub users: bool,
    pub computers: bool,
    pub groups: bool,
    pub domains: bool,
}

impl Selection {
    pub fn all() -> Self {
        Self {
            users: true,
            computers: true,
            groups: true,
            domains: true,
        }
    }

    pub fn is_empty(self) -> bool {
        !(self.users || self.computers || self.groups || self.domains)
    }

    /// An empty selection means everything.
    pub fn or_all(self) -> Self {
        if self.is_empty() {
            Self::all()
        } else {
            self
        }
    }

    pub fn contains(self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Users => self.users,
            CollectionKind::Computers => self.computers,
            CollectionKind::Groups => self.groups,
            CollectionKind::Domains => self.domains,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one converted collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub kind: CollectionKind,
    pub count: usize,
    pub skipped: usize,
    pub unresolved_members: usize,
    pub path: PathBuf,
}

/// Outcome of a whole run, in run order.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub collections: Vec<CollectionSummary>,
}

impl ConversionReport {
    pub fn get(&self, kind: CollectionKind) -> Option<&CollectionSummary> {
        self.collections.iter().find(|c| c.kind == kind)
    }

    pub fn total_unresolved_members(&self) -> usize {
        self.collections.iter().map(|c| c.unresolved_members).sum()
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

pub struct Converter {
    config: ConvertConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Converter {
    pub fn new(
        config: ConvertConfig,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert the selected collections. The first I/O failure aborts the
    /// run; documents already written by earlier pipelines are complete.
    pub fn run(&self, selection: Selection) -> Result<ConversionReport, ConvertError> {
        let selection = selection.or_all();
        info!(
            input = %self.input_dir.display(),
            output = %self.output_dir.display(),
            ?selection,
            "starting conversion"
        );

        if !self.output_dir.is_dir() {
            return Err(ConvertError::OutputDirMissing(self.output_dir.clone()));
        }

        let mut refs = ReferenceTable::new();
        let mut report = ConversionReport::default();

        if selection.users {
            let raw = self.load_collection(CollectionKind::Users)?;
            let users = pipeline::users::convert(&raw, &mut refs);
            report.collections.push(self.write_collection(&users)?);
        }

        if selection.computers {
            let raw = self.load_collection(CollectionKind::Computers)?;
            let computers = pipeline::computers::convert(&raw);
            report.collections.push(self.write_collection(&computers)?);
        }

        if selection.groups {
            if !selection.users {
                debug!("users not converted in this run, pre-loading account references");
                let raw = self.load_collection(CollectionKind::Users)?;
                refs.record_accounts(&raw);
            }
            let raw = self.load_collection(CollectionKind::Groups)?;
            let groups = pipeline::groups::convert(&raw, &mut refs);
            report.collections.push(self.write_collection(&groups)?);
        }

        if selection.domains {
            let raw = self.load_collection(CollectionKind::Domains)?;
            let domains = pipeline::domains::convert(&raw);
            report.collections.push(self.write_collection(&domains)?);
        }

        info!(
            collections = report.collections.len(),
            references = refs.len(),
            "conversion complete"
        );
        Ok(report)
    }

    /// Path of the input file feeding `kind`.
    pub fn input_path(&self, kind: CollectionKind) -> PathBuf {
        self.input_dir.join(self.config.input.file_for(kind))
    }

    /// Path of the output document for `kind`.
    pub fn output_path(&self, kind: CollectionKind) -> PathBuf {
        self.output_dir.join(self.config.output.file_for(kind))
    }

    /// Read and parse one input collection.
    pub fn load_collection(&self, kind: CollectionKind) -> Result<Vec<RawEntity>, ConvertError> {
        let path = self.input_path(kind);
        debug!(collection = %kind, path = %path.display(), "reading input collection");

        let bytes = std::fs::read(&path).map_err(|source| ConvertError::InputRead {
            collection: kind.label().to_string(),
            path: path.clone(),
            source,
        })?;
        let entities: Vec<RawEntity> =
            serde_json::from_slice(&bytes).map_err(|source| ConvertError::InputParse {
                collection: kind.label().to_string(),
                path: path.clone(),
                source,
            })?;

        debug!(collection = %kind, records = entities.len(), "input collection parsed");
        Ok(entities)
    }

    /// Serialize a collection and atomically replace its output document.
    pub fn write_collection<N: Serialize>(
        &self,
        collection: &Collection<N>,
    ) -> Result<CollectionSummary, ConvertError> {
        let kind = collection.kind;
        let path = self.output_path(kind);
        let document = collection.document();

        let serialized = if self.config.output.pretty {
            serde_json::to_vec_pretty(&document)
        } else {
            serde_json::to_vec(&document)
        }
        .map_err(|source| ConvertError::Serialize {
            collection: kind.label().to_string(),
            source,
        })?;

        let write_err = |source: std::io::Error| ConvertError::OutputWrite {
            collection: kind.label().to_string(),
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.output_dir).map_err(write_err)?;
        tmp.write_all(&serialized).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!(
            collection = %kind,
            count = collection.count(),
            path = %path.display(),
            "wrote output document"
        );

        Ok(CollectionSummary {
            kind,
            count: collection.count(),
            skipped: collection.skipped,
            unresolved_members: collection.unresolved_members,
            path,
        })
    }
}
