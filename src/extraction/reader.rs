//! Extraction file reader

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, info, trace, warn};

use super::field_spec::FieldSpec;
use super::format::{
    decode_main_header, FileMetadata, FormatVersion, MAIN_HEADER_LENGTH,
    TIME_STEP_HEADER_LENGTH,
};
use super::parser::{decode_field_header, FieldParser};
use super::record::Record;
use super::time_index::TimeIndex;
use crate::config::LimitsConfig;
use crate::{Result, XtractError};

/// Open extraction file
///
/// Headers and the time index are validated once in [`open`](Self::open);
/// afterwards every lookup decodes from a read-only memory map into an owned
/// [`Record`]. Lookups take `&self` and may run concurrently.
///
/// The file must not be truncated or rewritten while it is open. Such
/// external mutation is not detected and its effects are undefined.
pub struct ExtractionFile {
    path: PathBuf,
    mmap: Mmap,
    metadata: FileMetadata,
    field_spec: FieldSpec,
    parser: FieldParser,
    time_index: TimeIndex,
    record_length: u64,
}

static_assertions::assert_impl_all!(ExtractionFile: Send, Sync);

impl ExtractionFile {
    /// Open an extraction file with default limits
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or fails validation
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_limits(path, &LimitsConfig::default())
    }

    /// Open an extraction file, rejecting headers that exceed `limits`
    ///
    /// Decodes the main header, then the field header, then scans the time
    /// index, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, a header or the body is
    /// malformed, or a header value exceeds `limits`
    pub fn open_with_limits(path: &Path, limits: &LimitsConfig) -> Result<Self> {
        limits.validate()?;
        Self::open_inner(path, limits).map_err(|e| {
            warn!("Rejected extraction file {}: {}", path.display(), e);
            e
        })
    }

    fn open_inner(path: &Path, limits: &LimitsConfig) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < MAIN_HEADER_LENGTH as u64 {
            return Err(XtractError::Truncated {
                section: "main header",
                expected: MAIN_HEADER_LENGTH as u64,
                actual: file_size,
            });
        }

        // SAFETY: the map is read-only and callers are told not to mutate
        // the file while it is open.
        let mmap = unsafe { Mmap::map(&file)? };
        drop(file);

        let metadata = decode_main_header(&mmap)?;
        debug!(
            "Main header: version {:?}, {} sites, {} fields, field header {} bytes",
            metadata.version,
            metadata.site_count,
            metadata.field_count,
            metadata.field_header_length
        );

        LimitsConfig::check("site count", metadata.site_count, limits.max_site_count)?;
        LimitsConfig::check(
            "field count",
            u64::from(metadata.field_count),
            u64::from(limits.max_field_count),
        )?;
        LimitsConfig::check(
            "field header length",
            u64::from(metadata.field_header_length),
            u64::from(limits.max_field_header_length),
        )?;

        let (field_spec, parser) =
            decode_field_header(&mmap[MAIN_HEADER_LENGTH..], &metadata, limits)?;

        let record_length = (field_spec.record_length() as u64)
            .checked_mul(metadata.site_count)
            .and_then(|len| len.checked_add(TIME_STEP_HEADER_LENGTH as u64))
            .ok_or_else(|| {
                XtractError::CorruptHeader(format!(
                    "Record length overflows for {} sites",
                    metadata.site_count
                ))
            })?;

        let time_index = TimeIndex::build(&mmap, metadata.total_header_length(), record_length)?;
        debug!(
            "Time index: {} timestep(s) of {} bytes",
            time_index.len(),
            record_length
        );

        info!(
            "Opened {} (v{}, {} sites, {} fields, {} timesteps)",
            path.display(),
            u32::from(metadata.version),
            metadata.site_count,
            metadata.field_count,
            time_index.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            metadata,
            field_spec,
            parser,
            time_index,
            record_length,
        })
    }

    /// Path the file was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded main header
    #[must_use]
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Format version
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.metadata.version
    }

    /// Layout of every site record
    #[must_use]
    pub fn field_spec(&self) -> &FieldSpec {
        &self.field_spec
    }

    /// Active decoding strategy
    #[must_use]
    pub fn parser(&self) -> &FieldParser {
        &self.parser
    }

    /// Timestep index
    #[must_use]
    pub fn time_index(&self) -> &TimeIndex {
        &self.time_index
    }

    /// Timestep values in file order
    #[must_use]
    pub fn times(&self) -> Vec<u64> {
        self.time_index.times().collect()
    }

    /// Number of timesteps
    #[must_use]
    pub fn time_count(&self) -> usize {
        self.time_index.len()
    }

    /// Sites per timestep
    #[must_use]
    pub fn record_count_for_timestep(&self) -> u64 {
        self.metadata.site_count
    }

    /// Bytes per timestep record, marker included
    #[must_use]
    pub fn record_length(&self) -> u64 {
        self.record_length
    }

    /// Timestep value at position `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the last timestep
    pub fn time_step_at(&self, index: usize) -> Result<u64> {
        Ok(self.time_index.get(index)?.time_step)
    }

    /// Position of timestep value `time_step`
    ///
    /// # Errors
    ///
    /// Returns `TimeStepNotFound` if the value is not indexed
    pub fn index_of_time_step(&self, time_step: u64) -> Result<usize> {
        self.time_index.position_of(time_step)
    }

    /// Decode all sites of the timestep at position `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the last timestep
    pub fn lookup_by_index(&self, index: usize) -> Result<Record> {
        let entry = self.time_index.get(index)?;
        let start = (entry.offset as usize) + TIME_STEP_HEADER_LENGTH;
        let end = (entry.offset + self.record_length) as usize;

        trace!("Decoding timestep {} from bytes {start}..{end}", entry.time_step);

        self.parser.materialize(
            &self.field_spec,
            &self.metadata,
            entry.time_step,
            &self.mmap[start..end],
        )
    }

    /// Decode all sites of timestep value `time_step`
    ///
    /// Only exact matches are returned; there is no nearest-neighbour
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns `TimeStepNotFound` if the value is not indexed
    pub fn lookup_by_time_step(&self, time_step: u64) -> Result<Record> {
        let index = self.time_index.position_of(time_step)?;
        self.lookup_by_index(index)
    }
}

impl std::fmt::Debug for ExtractionFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionFile")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("time_count", &self.time_index.len())
            .finish_non_exhaustive()
    }
}
