//! Xtract - Memory-mapped reader for lattice-Boltzmann property extraction files
//!
//! Opens v3 and v4 extraction files, validates their headers and timestep
//! ordering up front, and decodes any timestep on demand.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod extraction;

pub use error::{Result, XtractError};
pub use extraction::{ExtractionFile, FieldSpec, FileMetadata, FormatVersion, Record};
