//! Typed ingestion of curated spreadsheets and their auxiliary files.
//!
//! The mapping step in [`columns`] is the only place raw headers are read;
//! everything downstream works on [`hnf1b_model::SourceRow`].

pub mod annotations;
pub mod columns;
pub mod csv_rows;
pub mod error;
pub mod publications;

pub use annotations::AnnotationIndex;
pub use columns::{ColumnMapping, ColumnTarget, CoreField};
pub use csv_rows::{CsvRowSource, RowSource};
pub use error::{IngestError, Result};
pub use publications::{Publication, PublicationTable, alias_key};
