//! Synthetic extraction file builder shared by tests and benches

#![allow(dead_code)]

use std::io::Write;

use bytes::BufMut;
use tempfile::NamedTempFile;

use xtract::extraction::{APP_MAGIC, EXTRACTION_MAGIC};

/// Declared field of a fixture
#[derive(Debug, Clone)]
pub struct FixtureField {
    pub name: String,
    pub length: u32,
    /// Written only for v4
    pub offset: f64,
}

/// Builds extraction files byte by byte
#[derive(Debug, Clone)]
pub struct Fixture {
    pub version: u32,
    pub voxel_size: f64,
    pub origin: [f64; 3],
    pub fields: Vec<FixtureField>,
    pub grids: Vec<[u32; 3]>,
    /// Timestep value and raw values, site-major then field then element
    pub steps: Vec<(u64, Vec<f64>)>,
}

impl Fixture {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            voxel_size: 0.01,
            origin: [0.0; 3],
            fields: Vec::new(),
            grids: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    pub fn origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn field(mut self, name: &str, length: u32, offset: f64) -> Self {
        self.fields.push(FixtureField {
            name: name.to_string(),
            length,
            offset,
        });
        self
    }

    pub fn site(mut self, grid: [u32; 3]) -> Self {
        self.grids.push(grid);
        self
    }

    pub fn step(mut self, time_step: u64, raw: Vec<f64>) -> Self {
        assert_eq!(
            raw.len(),
            self.grids.len() * self.values_per_site(),
            "raw values must cover every site"
        );
        self.steps.push((time_step, raw));
        self
    }

    /// Add a timestep whose raw values are generated from
    /// `(site, value index within the site)`
    pub fn step_with(mut self, time_step: u64, f: impl Fn(usize, usize) -> f64) -> Self {
        let per_site = self.values_per_site();
        let raw = (0..self.grids.len())
            .flat_map(|site| (0..per_site).map(move |v| (site, v)))
            .map(|(site, v)| f(site, v))
            .collect();
        self.steps.push((time_step, raw));
        self
    }

    pub fn values_per_site(&self) -> usize {
        self.fields.iter().map(|f| f.length as usize).sum()
    }

    fn element_size(&self) -> usize {
        if self.version == 4 {
            4
        } else {
            8
        }
    }

    pub fn row_length(&self) -> usize {
        12 + self.values_per_site() * self.element_size()
    }

    pub fn record_length(&self) -> usize {
        8 + self.row_length() * self.grids.len()
    }

    pub fn field_header(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in &self.fields {
            buf.put_u32(field.name.len() as u32);
            buf.put_slice(field.name.as_bytes());
            buf.put_bytes(0, (4 - field.name.len() % 4) % 4);
            buf.put_u32(field.length);
            if self.version == 4 {
                buf.put_f64(field.offset);
            }
        }
        buf
    }

    pub fn main_header(&self, field_header_length: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(60);
        buf.put_u32(APP_MAGIC);
        buf.put_u32(EXTRACTION_MAGIC);
        buf.put_u32(self.version);
        buf.put_f64(self.voxel_size);
        for axis in self.origin {
            buf.put_f64(axis);
        }
        buf.put_u64(self.grids.len() as u64);
        buf.put_u32(self.fields.len() as u32);
        buf.put_u32(field_header_length as u32);
        buf
    }

    pub fn header_length(&self) -> usize {
        60 + self.field_header().len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let field_header = self.field_header();
        let mut buf = self.main_header(field_header.len());
        buf.extend_from_slice(&field_header);

        let per_site = self.values_per_site();
        for (time_step, raw) in &self.steps {
            buf.put_u64(*time_step);
            for (site, grid) in self.grids.iter().enumerate() {
                for axis in grid {
                    buf.put_u32(*axis);
                }
                for value in &raw[site * per_site..(site + 1) * per_site] {
                    if self.version == 4 {
                        buf.put_f32(*value as f32);
                    } else {
                        buf.put_f64(*value);
                    }
                }
            }
        }
        buf
    }

    pub fn write(&self) -> NamedTempFile {
        write_bytes(&self.to_bytes())
    }
}

pub fn write_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Two-field v3 file over a 2x2x1 patch with three timesteps
pub fn v3_fixture() -> Fixture {
    Fixture::new(3)
        .voxel_size(0.001)
        .origin([-0.5, 0.25, 1.0])
        .field("pressure", 1, 0.0)
        .field("velocity", 3, 0.0)
        .site([0, 0, 0])
        .site([1, 0, 0])
        .site([0, 1, 0])
        .site([1, 1, 0])
        .step_with(0, |site, v| (site * 10 + v) as f64 + 0.125)
        .step_with(100, |site, v| -((site * 10 + v) as f64) / 3.0)
        .step_with(200, |site, v| 1e-9 * (site + v) as f64)
}

/// Two-field v4 file with non-zero offsets and two timesteps
pub fn v4_fixture() -> Fixture {
    Fixture::new(4)
        .voxel_size(0.5)
        .origin([1.0, 2.0, 3.0])
        .field("pressure", 1, 80.0)
        .field("shear", 2, -0.5)
        .site([0, 0, 0])
        .site([2, 3, 4])
        .site([7, 0, 1])
        .step_with(10, |site, v| (site + v) as f64 * 0.25)
        .step_with(20, |site, v| -((site * v) as f64))
}
