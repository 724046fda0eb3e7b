//! Timestep index built by scanning record markers

use bytes::Buf;

use super::format::TIME_STEP_HEADER_LENGTH;
use crate::{Result, XtractError};

/// Location of one timestep in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeIndexEntry {
    /// Timestep value
    pub time_step: u64,
    /// Byte offset of the timestep marker from the start of the file
    pub offset: u64,
}

/// Sorted table of timestep values and their record offsets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeIndex {
    entries: Vec<TimeIndexEntry>,
}

impl TimeIndex {
    /// Scan the body of `file` for timestep markers
    ///
    /// The body starts at `header_length` and must consist of whole records
    /// of `record_length` bytes, each led by an 8-byte big-endian timestep.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if the file is shorter than its headers,
    /// `CorruptBody` on a partial trailing record and `UnorderedTimeSteps` if
    /// the values are not strictly increasing. A `record_length` shorter
    /// than the timestep marker is `CorruptHeader`
    pub fn build(file: &[u8], header_length: u64, record_length: u64) -> Result<Self> {
        if record_length < TIME_STEP_HEADER_LENGTH as u64 {
            return Err(XtractError::CorruptHeader(format!(
                "Record length {record_length} is shorter than the {TIME_STEP_HEADER_LENGTH}-byte timestep marker"
            )));
        }

        let file_size = file.len() as u64;
        let body_bytes = file_size
            .checked_sub(header_length)
            .ok_or(XtractError::Truncated {
                section: "headers",
                expected: header_length,
                actual: file_size,
            })?;

        let residual = body_bytes % record_length;
        if residual != 0 {
            return Err(XtractError::CorruptBody {
                body_bytes,
                record_length,
                residual,
            });
        }

        let count = body_bytes / record_length;
        let entries = (0..count)
            .map(|i| {
                let offset = header_length + i * record_length;
                let start = offset as usize;
                let mut marker = &file[start..start + TIME_STEP_HEADER_LENGTH];
                TimeIndexEntry {
                    time_step: marker.get_u64(),
                    offset,
                }
            })
            .collect::<Vec<_>>();

        if let Some(index) = entries
            .windows(2)
            .position(|pair| pair[1].time_step <= pair[0].time_step)
        {
            return Err(XtractError::UnorderedTimeSteps {
                index: index + 1,
                previous: entries[index].time_step,
                current: entries[index + 1].time_step,
            });
        }

        Ok(Self { entries })
    }

    /// Number of timesteps
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No timesteps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in file order
    #[must_use]
    pub fn entries(&self) -> &[TimeIndexEntry] {
        &self.entries
    }

    /// Timestep values in file order
    pub fn times(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|e| e.time_step)
    }

    /// Entry at position `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the last timestep
    pub fn get(&self, index: usize) -> Result<TimeIndexEntry> {
        self.entries
            .get(index)
            .copied()
            .ok_or(XtractError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Position of timestep value `time_step`
    ///
    /// # Errors
    ///
    /// Returns `TimeStepNotFound` if the value is not indexed
    pub fn position_of(&self, time_step: u64) -> Result<usize> {
        self.entries
            .binary_search_by_key(&time_step, |e| e.time_step)
            .map_err(|_| XtractError::TimeStepNotFound(time_step))
    }
}
