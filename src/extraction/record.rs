//! Decoded timestep records

/// Flattened values of one field for every site
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Single-precision values
    F32(Vec<f32>),
    /// Double-precision values
    F64(Vec<f64>),
}

impl Column {
    fn slice(&self, start: usize, end: usize) -> Values<'_> {
        match self {
            Self::F32(data) => Values::F32(&data[start..end]),
            Self::F64(data) => Values::F64(&data[start..end]),
        }
    }
}

/// Values of one field at one site
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Values<'a> {
    /// Single-precision values
    F32(&'a [f32]),
    /// Double-precision values
    F64(&'a [f64]),
}

impl Values<'_> {
    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// No elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` widened to f64
    #[must_use]
    pub fn get(&self, i: usize) -> Option<f64> {
        match self {
            Self::F32(v) => v.get(i).copied().map(f64::from),
            Self::F64(v) => v.get(i).copied(),
        }
    }

    /// All elements widened to f64
    #[must_use]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::F32(v) => v.iter().copied().map(f64::from).collect(),
            Self::F64(v) => v.to_vec(),
        }
    }
}

/// Decoded values of one declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldColumn {
    /// Field name
    pub name: String,
    /// Elements per site
    pub length: usize,
    /// Site-major values, `length` per site
    pub data: Column,
}

impl FieldColumn {
    /// Values at one site
    #[must_use]
    pub fn values_at(&self, site: usize) -> Values<'_> {
        let start = site * self.length;
        self.data.slice(start, start + self.length)
    }
}

/// All sites of one timestep
///
/// Owns its data; nothing borrows from the file mapping it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    time_step: u64,
    ids: Vec<u64>,
    positions: Vec<[f32; 3]>,
    grids: Vec<[u32; 3]>,
    columns: Vec<FieldColumn>,
}

impl Record {
    pub(crate) fn new(
        time_step: u64,
        ids: Vec<u64>,
        positions: Vec<[f32; 3]>,
        grids: Vec<[u32; 3]>,
        columns: Vec<FieldColumn>,
    ) -> Self {
        debug_assert_eq!(ids.len(), positions.len());
        debug_assert_eq!(ids.len(), grids.len());
        Self {
            time_step,
            ids,
            positions,
            grids,
            columns,
        }
    }

    /// Timestep value this record was stored under
    #[must_use]
    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    /// Number of sites
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// No sites
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Site ids, `0..len`
    #[must_use]
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Physical site positions in metres
    #[must_use]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Lattice coordinates
    #[must_use]
    pub fn grids(&self) -> &[[u32; 3]] {
        &self.grids
    }

    /// Declared field columns in declaration order
    #[must_use]
    pub fn columns(&self) -> &[FieldColumn] {
        &self.columns
    }

    /// Column by field name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&FieldColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// View of one site
    #[must_use]
    pub fn site(&self, index: usize) -> Option<Site<'_>> {
        (index < self.len()).then_some(Site {
            record: self,
            index,
        })
    }

    /// Iterate over all sites in id order
    pub fn sites(&self) -> impl Iterator<Item = Site<'_>> {
        (0..self.len()).map(move |index| Site {
            record: self,
            index,
        })
    }
}

/// Borrowed view of one site within a [`Record`]
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    record: &'a Record,
    index: usize,
}

impl<'a> Site<'a> {
    /// Site id
    #[must_use]
    pub fn id(&self) -> u64 {
        self.record.ids[self.index]
    }

    /// Position in metres
    #[must_use]
    pub fn position(&self) -> [f32; 3] {
        self.record.positions[self.index]
    }

    /// Lattice coordinate
    #[must_use]
    pub fn grid(&self) -> [u32; 3] {
        self.record.grids[self.index]
    }

    /// Values of a declared field
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Values<'a>> {
        let record: &'a Record = self.record;
        record.column(name).map(|c| c.values_at(self.index))
    }

    /// All declared field values in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&'a str, Values<'a>)> + 'a {
        let record: &'a Record = self.record;
        let index = self.index;
        record
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), c.values_at(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            10,
            vec![0, 1],
            vec![[0.0; 3], [0.5, 0.0, 0.0]],
            vec![[0, 0, 0], [1, 0, 0]],
            vec![
                FieldColumn {
                    name: "pressure".into(),
                    length: 1,
                    data: Column::F32(vec![1.5, 2.5]),
                },
                FieldColumn {
                    name: "velocity".into(),
                    length: 3,
                    data: Column::F64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
                },
            ],
        )
    }

    #[test]
    fn test_site_views() {
        let record = sample();
        assert_eq!(record.len(), 2);
        assert_eq!(record.time_step(), 10);

        let site = record.site(1).unwrap();
        assert_eq!(site.id(), 1);
        assert_eq!(site.grid(), [1, 0, 0]);
        assert_eq!(site.position(), [0.5, 0.0, 0.0]);
        assert_eq!(site.value("pressure"), Some(Values::F32(&[2.5])));
        assert_eq!(
            site.value("velocity").unwrap().to_f64_vec(),
            vec![4.0, 5.0, 6.0]
        );
        assert!(site.value("missing").is_none());
        assert!(record.site(2).is_none());
    }

    #[test]
    fn test_sites_iteration() {
        let record = sample();
        let ids: Vec<_> = record.sites().map(|s| s.id()).collect();
        assert_eq!(ids, [0, 1]);

        let first = record.site(0).unwrap();
        let names: Vec<_> = first.values().map(|(name, _)| name).collect();
        assert_eq!(names, ["pressure", "velocity"]);
    }

    #[test]
    fn test_values_widening() {
        let values = Values::F32(&[0.25, -1.0]);
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(1), Some(-1.0));
        assert_eq!(values.get(2), None);
        assert_eq!(values.to_f64_vec(), vec![0.25, -1.0]);
    }
}
