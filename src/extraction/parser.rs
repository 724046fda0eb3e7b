//! Version-specific field header parsing and record materialization

use bytes::Buf;
use tracing::debug;

use super::field_spec::{ElementType, FieldDescriptor, FieldSpec};
use super::format::{FileMetadata, FormatVersion};
use super::record::{Column, FieldColumn, Record};
use super::xdr::XdrDecoder;
use crate::config::LimitsConfig;
use crate::{Result, XtractError};

/// Decoding strategy selected by the format version
#[derive(Debug, Clone, PartialEq)]
pub enum FieldParser {
    /// Values are stored as-is
    V3,
    /// Values are stored relative to a per-field baseline
    V4 {
        /// Additive offsets; entry 0 belongs to the leading fields and is
        /// always zero, entry `i + 1` to declared field `i`
        offsets: Vec<f64>,
    },
}

impl FieldParser {
    /// Format version this parser decodes
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        match self {
            Self::V3 => FormatVersion::V3,
            Self::V4 { .. } => FormatVersion::V4,
        }
    }

    /// Additive offset for declared field `index`, `None` when values are
    /// used unchanged
    #[must_use]
    pub fn offset_of(&self, index: usize) -> Option<f64> {
        match self {
            Self::V3 => None,
            Self::V4 { offsets } => offsets.get(index + 1).copied(),
        }
    }

    /// Decode one timestep block of `spec.record_length() * site_count` bytes
    ///
    /// `id` is filled with `0..site_count` and `position` with
    /// `origin + voxel_size * grid`.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if `data` is not exactly one block long
    pub fn materialize(
        &self,
        spec: &FieldSpec,
        metadata: &FileMetadata,
        time_step: u64,
        data: &[u8],
    ) -> Result<Record> {
        let site_count = metadata.site_count as usize;
        let row_length = spec.record_length();
        let expected = row_length * site_count;
        if data.len() != expected {
            return Err(XtractError::Truncated {
                section: "timestep block",
                expected: expected as u64,
                actual: data.len() as u64,
            });
        }

        let declared = spec.declared_fields();
        let mut columns: Vec<FieldColumn> = declared
            .iter()
            .map(|field| empty_column(field, site_count))
            .collect();
        let mut grids = Vec::with_capacity(site_count);

        for row in data.chunks_exact(row_length) {
            let mut cursor = row;
            grids.push([cursor.get_u32(), cursor.get_u32(), cursor.get_u32()]);

            for (index, (field, column)) in declared.iter().zip(&mut columns).enumerate() {
                let (Some(disk_type), Some(offset)) = (field.disk_type, field.offset) else {
                    continue;
                };
                let mut cursor = &row[offset..offset + field.disk_size()];
                let addend = self.offset_of(index);

                for _ in 0..field.length {
                    let raw = read_element(&mut cursor, disk_type);
                    push_value(&mut column.data, raw, addend);
                }
            }
        }

        let ids = (0..metadata.site_count).collect();
        let positions = grids.iter().map(|&g| metadata.position_of(g)).collect();

        Ok(Record::new(time_step, ids, positions, grids, columns))
    }
}

fn empty_column(field: &FieldDescriptor, site_count: usize) -> FieldColumn {
    let capacity = site_count * field.length as usize;
    let data = match field.memory_type {
        ElementType::F32 => Column::F32(Vec::with_capacity(capacity)),
        _ => Column::F64(Vec::with_capacity(capacity)),
    };
    FieldColumn {
        name: field.name.clone(),
        length: field.length as usize,
        data,
    }
}

fn read_element(cursor: &mut &[u8], ty: ElementType) -> f64 {
    match ty {
        ElementType::F32 => f64::from(cursor.get_f32()),
        ElementType::F64 => cursor.get_f64(),
        ElementType::U32 => f64::from(cursor.get_u32()),
        ElementType::U64 => cursor.get_u64() as f64,
    }
}

fn push_value(column: &mut Column, raw: f64, addend: Option<f64>) {
    let value = addend.map_or(raw, |offset| raw + offset);
    match column {
        Column::F32(data) => data.push(value as f32),
        Column::F64(data) => data.push(value),
    }
}

/// Decode the field header following the main header
///
/// `bytes` must hold at least `metadata.field_header_length` bytes; exactly
/// that many are consumed.
///
/// # Errors
///
/// Returns `CorruptHeader` if fewer bytes are available than declared, an
/// entry is malformed or bytes are left over, and `LimitExceeded` if a
/// declared length is above `limits`
pub fn decode_field_header(
    bytes: &[u8],
    metadata: &FileMetadata,
    limits: &LimitsConfig,
) -> Result<(FieldSpec, FieldParser)> {
    let declared = metadata.field_header_length as usize;
    if bytes.len() < declared {
        return Err(XtractError::CorruptHeader(format!(
            "Field header declares {declared} bytes, only {} available",
            bytes.len()
        )));
    }

    let mut decoder = XdrDecoder::new(&bytes[..declared]);
    let mut spec = FieldSpec::new();

    let parser = match metadata.version {
        FormatVersion::V3 => {
            for _ in 0..metadata.field_count {
                let (name, length) = decode_entry(&mut decoder, limits)?;
                spec.append(name, length, ElementType::F64, ElementType::F64)?;
            }
            FieldParser::V3
        }
        FormatVersion::V4 => {
            // Each v4 entry takes at least 16 bytes
            let capacity = (metadata.field_count as usize).min(declared / 16);
            let mut offsets = Vec::with_capacity(capacity + 1);
            offsets.push(0.0);
            for _ in 0..metadata.field_count {
                let (name, length) = decode_entry(&mut decoder, limits)?;
                offsets.push(decoder.unpack_f64("field offset")?);
                spec.append(name, length, ElementType::F32, ElementType::F32)?;
            }
            FieldParser::V4 { offsets }
        }
    };

    if decoder.remaining() != 0 {
        return Err(XtractError::CorruptHeader(format!(
            "Field header declares {declared} bytes but fields end at byte {}",
            decoder.position()
        )));
    }

    debug!(
        "Decoded {} field(s), {} bytes per site",
        spec.declared_fields().len(),
        spec.record_length()
    );

    Ok((spec, parser))
}

fn decode_entry(decoder: &mut XdrDecoder<'_>, limits: &LimitsConfig) -> Result<(String, u32)> {
    let name = decoder.unpack_string("field name")?;
    let length = decoder.unpack_u32("field length")?;
    LimitsConfig::check(
        "field length",
        u64::from(length),
        u64::from(limits.max_field_length),
    )?;
    Ok((name, length))
}
