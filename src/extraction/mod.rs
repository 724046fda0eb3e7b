//! Property extraction file format

mod field_spec;
mod format;
mod parser;
mod reader;
mod record;
mod time_index;
mod xdr;

pub use field_spec::{
    ElementType, FieldDescriptor, FieldSpec, Layout, LayoutEntry, GRID_FIELD, ID_FIELD,
    POSITION_FIELD,
};
pub use format::{
    decode_main_header, FileMetadata, FormatVersion, RawMainHeader, APP_MAGIC, EXTRACTION_MAGIC,
    MAIN_HEADER_LENGTH, TIME_STEP_HEADER_LENGTH,
};
pub use parser::{decode_field_header, FieldParser};
pub use reader::ExtractionFile;
pub use record::{Column, FieldColumn, Record, Site, Values};
pub use time_index::{TimeIndex, TimeIndexEntry};
pub use xdr::XdrDecoder;
