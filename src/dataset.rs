//! Dataset identity and resolution.
//!
//! A [`Dataset`] is just a list of input locations plus a table name; building
//! one never touches the filesystem. [`Dataset::resolve`] reads every file
//! footer, checks that each file stores the requested table with the same set
//! of columns, and lays the files end to end into one logical row space.

use crate::error::{Error, Result};
use crate::io::glob::expand_inputs;
use crate::io::parquet::inspect_file;
use anyhow::{Context, bail};
use arrow::datatypes::{Schema, SchemaRef};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input files and table name of a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    inputs: Vec<String>,
    table: String,
}

impl Dataset {
    /// Describe a dataset. Each input is a file path or a glob pattern.
    pub fn new<I, S>(inputs: I, table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            table: table.into(),
        }
    }

    /// Convenience constructor for a single input file.
    pub fn single(path: impl AsRef<Path>, table: impl Into<String>) -> Self {
        Self::new([path.as_ref().display().to_string()], table)
    }

    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolve inputs and read their footers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetResolution`] if there are no inputs, an input
    /// does not resolve, a file does not store the table, or two files
    /// disagree on the columns.
    pub fn resolve(&self) -> Result<ResolvedDataset> {
        self.resolve_inner()
            .map_err(|e| Error::DatasetResolution(format!("{e:#}")))
    }

    fn resolve_inner(&self) -> anyhow::Result<ResolvedDataset> {
        if self.inputs.is_empty() {
            bail!("dataset `{}` has no input files", self.table);
        }
        let paths = expand_inputs(self.inputs.as_slice())?;

        let mut files = Vec::with_capacity(paths.len());
        let mut schema: Option<SchemaRef> = None;
        let mut next_row = 0u64;
        for path in paths {
            let info = inspect_file(&path)?;
            match info.table.as_deref() {
                Some(name) if name == self.table => {}
                Some(name) => bail!(
                    "{} stores table `{name}`, not `{}`",
                    path.display(),
                    self.table
                ),
                None => bail!("table `{}` not found in {}", self.table, path.display()),
            }

            let fields = info.schema.fields();
            if schema.as_ref().is_some_and(|first| first.fields() != fields) {
                bail!(
                    "columns of {} differ from the first input file",
                    path.display()
                );
            }
            schema.get_or_insert_with(|| Arc::new(Schema::new(fields.clone())));

            files.push(FileSpan {
                path,
                first_row: next_row,
                num_rows: info.num_rows,
            });
            next_row = next_row
                .checked_add(info.num_rows)
                .context("total row count overflows u64")?;
        }

        let schema = schema.context("no input files resolved")?;
        log::debug!(
            "resolved table `{}`: {} file(s), {} rows",
            self.table,
            files.len(),
            next_row
        );
        Ok(ResolvedDataset {
            table: self.table.clone(),
            files: files.into(),
            schema,
            total_rows: next_row,
        })
    }
}

/// One input file placed in the global row space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpan {
    pub path: PathBuf,
    /// Global index of the file's first row.
    pub first_row: u64,
    pub num_rows: u64,
}

impl FileSpan {
    #[must_use]
    pub fn end_row(&self) -> u64 {
        self.first_row + self.num_rows
    }
}

/// A dataset whose files, schema and row count are known.
#[derive(Clone, Debug)]
pub struct ResolvedDataset {
    table: String,
    files: Arc<[FileSpan]>,
    schema: SchemaRef,
    total_rows: u64,
}

impl ResolvedDataset {
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn files(&self) -> &Arc<[FileSpan]> {
        &self.files
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }
}
