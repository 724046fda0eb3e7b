//! Per-site record layout

use std::collections::HashMap;
use std::fmt;

use crate::{Result, XtractError};

/// Name of the leading on-disk lattice coordinate field
pub const GRID_FIELD: &str = "grid";

/// Name of the synthesized site index field
pub const ID_FIELD: &str = "id";

/// Name of the computed physical position field
pub const POSITION_FIELD: &str = "position";

/// Scalar element type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ElementType {
    /// Width of one element in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U32 | Self::F32 => 4,
            Self::U64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// One named field of a site record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Big-endian storage type, `None` for fields the reader synthesizes
    pub disk_type: Option<ElementType>,
    /// Type of decoded values
    pub memory_type: ElementType,
    /// Elements per site (1 for scalars)
    pub length: u32,
    /// Byte offset within the on-disk site record, `None` when synthesized
    pub offset: Option<usize>,
}

impl FieldDescriptor {
    /// Not stored on disk
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.disk_type.is_none()
    }

    /// A single element per site
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.length == 1
    }

    /// Bytes occupied on disk per site
    #[must_use]
    pub fn disk_size(&self) -> usize {
        self.disk_type.map_or(0, |ty| ty.size() * self.length as usize)
    }

    /// Bytes occupied in memory per site
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.memory_type.size() * self.length as usize
    }
}

/// One entry of a derived layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry<'a> {
    /// Field name
    pub name: &'a str,
    /// Element type within this layout
    pub element_type: ElementType,
    /// Elements per site
    pub length: u32,
    /// Byte offset within one record
    pub offset: usize,
}

/// Packed structured layout derived from a [`FieldSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout<'a> {
    /// Entries in layout order
    pub entries: Vec<LayoutEntry<'a>>,
    /// Bytes per record
    pub record_size: usize,
}

/// Ordered field layout of one site record
///
/// The two synthesized fields (`id`, `position`) come first, followed by the
/// stored fields in on-disk order: `grid`, then every declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    synthetic: Vec<FieldDescriptor>,
    stored: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSpec {
    /// Spec holding only `id`, `position` and `grid`
    #[must_use]
    pub fn new() -> Self {
        let synthetic = vec![
            FieldDescriptor {
                name: ID_FIELD.to_string(),
                disk_type: None,
                memory_type: ElementType::U64,
                length: 1,
                offset: None,
            },
            FieldDescriptor {
                name: POSITION_FIELD.to_string(),
                disk_type: None,
                memory_type: ElementType::F32,
                length: 3,
                offset: None,
            },
        ];
        let stored = vec![FieldDescriptor {
            name: GRID_FIELD.to_string(),
            disk_type: Some(ElementType::U32),
            memory_type: ElementType::U32,
            length: 3,
            offset: Some(0),
        }];

        let by_name = synthetic
            .iter()
            .chain(&stored)
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();

        Self {
            synthetic,
            stored,
            by_name,
        }
    }

    /// Append a stored field after the last one
    ///
    /// # Errors
    ///
    /// Returns `CorruptHeader` if the name is already taken or the length is
    /// zero
    pub fn append(
        &mut self,
        name: String,
        length: u32,
        disk_type: ElementType,
        memory_type: ElementType,
    ) -> Result<()> {
        if self.by_name.contains_key(&name) {
            return Err(XtractError::CorruptHeader(format!(
                "Duplicate field name '{name}'"
            )));
        }
        if length == 0 {
            return Err(XtractError::CorruptHeader(format!(
                "Field '{name}' declares zero elements"
            )));
        }

        let offset = self.record_length();
        self.by_name.insert(name.clone(), self.len());
        self.stored.push(FieldDescriptor {
            name,
            disk_type: Some(disk_type),
            memory_type,
            length,
            offset: Some(offset),
        });
        Ok(())
    }

    /// Bytes per site record on disk
    #[must_use]
    pub fn record_length(&self) -> usize {
        self.stored.iter().map(FieldDescriptor::disk_size).sum()
    }

    /// Total number of fields, synthesized ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.synthetic.len() + self.stored.len()
    }

    /// Always false: `id`, `position` and `grid` are always present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All fields in memory order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.synthetic.iter().chain(&self.stored)
    }

    /// Fields present on disk, `grid` first
    #[must_use]
    pub fn stored_fields(&self) -> &[FieldDescriptor] {
        &self.stored
    }

    /// Fields declared in the field header
    #[must_use]
    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.stored[1..]
    }

    /// Look up a field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        let index = *self.by_name.get(name)?;
        self.iter().nth(index)
    }

    /// Layout of one site record as stored in the file
    #[must_use]
    pub fn disk_layout(&self) -> Layout<'_> {
        let entries = self
            .stored
            .iter()
            .filter_map(|field| {
                Some(LayoutEntry {
                    name: &field.name,
                    element_type: field.disk_type?,
                    length: field.length,
                    offset: field.offset?,
                })
            })
            .collect();

        Layout {
            entries,
            record_size: self.record_length(),
        }
    }

    /// Packed layout of one decoded site record
    #[must_use]
    pub fn memory_layout(&self) -> Layout<'_> {
        let mut offset = 0;
        let entries = self
            .iter()
            .map(|field| {
                let entry = LayoutEntry {
                    name: &field.name,
                    element_type: field.memory_type,
                    length: field.length,
                    offset,
                };
                offset += field.memory_size();
                entry
            })
            .collect();

        Layout {
            entries,
            record_size: offset,
        }
    }
}
