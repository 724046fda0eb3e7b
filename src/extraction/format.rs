//! Binary format structures

use bytemuck::{Pod, Zeroable};

use crate::{Result, XtractError};

/// Application magic number: "hlb!"
pub const APP_MAGIC: u32 = 0x686c_6221;

/// Extraction file magic number
pub const EXTRACTION_MAGIC: u32 = 0x7874_7204;

/// Main header size in bytes
pub const MAIN_HEADER_LENGTH: usize = 60;

/// Bytes of the timestep value preceding each record block
pub const TIME_STEP_HEADER_LENGTH: usize = 8;

/// Supported on-disk format revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FormatVersion {
    /// Fields stored as 8-byte floats, no post-processing
    V3 = 3,
    /// Fields stored as 4-byte floats relative to a per-field offset
    V4 = 4,
}

impl TryFrom<u32> for FormatVersion {
    type Error = XtractError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            other => Err(XtractError::UnsupportedVersion(other)),
        }
    }
}

impl From<FormatVersion> for u32 {
    fn from(version: FormatVersion) -> Self {
        version as u32
    }
}

/// Main header as it sits on disk (60 bytes, big-endian, unaligned)
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct RawMainHeader {
    /// Application magic
    pub app_magic: [u8; 4],
    /// Extraction format magic
    pub extraction_magic: [u8; 4],
    /// Format version
    pub version: [u8; 4],
    /// Lattice spacing in metres
    pub voxel_size: [u8; 8],
    /// Origin x/y/z in metres
    pub origin: [[u8; 8]; 3],
    /// Sites per timestep
    pub site_count: [u8; 8],
    /// Declared fields
    pub field_count: [u8; 4],
    /// Field header length in bytes
    pub field_header_length: [u8; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<RawMainHeader>(), MAIN_HEADER_LENGTH);
static_assertions::const_assert_eq!(std::mem::align_of::<RawMainHeader>(), 1);

/// Decoded main header
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    /// Application magic as read
    pub app_magic: u32,
    /// Extraction magic as read
    pub extraction_magic: u32,
    /// Format version
    pub version: FormatVersion,
    /// Lattice spacing in metres
    pub voxel_size_metres: f64,
    /// Position of grid coordinate (0, 0, 0) in metres
    pub origin_metres: [f64; 3],
    /// Sites per timestep
    pub site_count: u64,
    /// Declared fields
    pub field_count: u32,
    /// Field header length in bytes
    pub field_header_length: u32,
}

impl FileMetadata {
    /// Both magic numbers match
    #[must_use]
    pub fn magic_ok(&self) -> bool {
        self.app_magic == APP_MAGIC && self.extraction_magic == EXTRACTION_MAGIC
    }

    /// Main header plus field header
    #[must_use]
    pub fn total_header_length(&self) -> u64 {
        MAIN_HEADER_LENGTH as u64 + u64::from(self.field_header_length)
    }

    /// Physical position of a lattice coordinate
    #[must_use]
    pub fn position_of(&self, grid: [u32; 3]) -> [f32; 3] {
        std::array::from_fn(|axis| {
            (self.origin_metres[axis] + self.voxel_size_metres * f64::from(grid[axis])) as f32
        })
    }
}

/// Decode the 60-byte main header at the start of `bytes`
///
/// Magic numbers are checked before the version, and the version before any
/// other field is trusted.
///
/// # Errors
///
/// Returns `Truncated` if fewer than 60 bytes are given, `CorruptHeader` on a
/// magic mismatch and `UnsupportedVersion` unless the version is 3 or 4
pub fn decode_main_header(bytes: &[u8]) -> Result<FileMetadata> {
    if bytes.len() < MAIN_HEADER_LENGTH {
        return Err(XtractError::Truncated {
            section: "main header",
            expected: MAIN_HEADER_LENGTH as u64,
            actual: bytes.len() as u64,
        });
    }

    let raw: &RawMainHeader = bytemuck::try_from_bytes(&bytes[..MAIN_HEADER_LENGTH])
        .map_err(|e| XtractError::CorruptHeader(format!("Unreadable main header: {e}")))?;

    let app_magic = u32::from_be_bytes(raw.app_magic);
    if app_magic != APP_MAGIC {
        return Err(XtractError::CorruptHeader(format!(
            "Incorrect application magic: expected {APP_MAGIC:#010x}, got {app_magic:#010x}"
        )));
    }

    let extraction_magic = u32::from_be_bytes(raw.extraction_magic);
    if extraction_magic != EXTRACTION_MAGIC {
        return Err(XtractError::CorruptHeader(format!(
            "Incorrect extraction magic: expected {EXTRACTION_MAGIC:#010x}, got {extraction_magic:#010x}"
        )));
    }

    let version = FormatVersion::try_from(u32::from_be_bytes(raw.version))?;

    Ok(FileMetadata {
        app_magic,
        extraction_magic,
        version,
        voxel_size_metres: f64::from_be_bytes(raw.voxel_size),
        origin_metres: raw.origin.map(f64::from_be_bytes),
        site_count: u64::from_be_bytes(raw.site_count),
        field_count: u32::from_be_bytes(raw.field_count),
        field_header_length: u32::from_be_bytes(raw.field_header_length),
    })
}
