//! Face-varying channel packing.
//!
//! All named UV sets (2 floats each) and color sets (1, 3 or 4 floats
//! each) are gathered into a single interleaved float vector per face
//! corner — UV sets first, in input order, then color sets in input order.
//! One such vector is a *face-varying record*. Records attached to the
//! same vertex are deduplicated by exact (bit-identical) value comparison:
//! adjacent faces that agree at a corner share one record, faces that
//! disagree (a UV or color seam) get distinct records. The number of
//! distinct records per vertex is exactly what the mesh re-exporter must
//! reproduce when splitting output UVs.

use crate::polygon_mesh::PolygonMesh;
use crate::INVALID_INDEX;

/// Shape of the packed face-varying record: how many UV sets and how many
/// channels each color set contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelLayout {
    pub uv_set_count: usize,
    /// Per color set, the number of float channels (1, 3 or 4).
    pub color_channel_counts: Vec<usize>,
}

impl ChannelLayout {
    /// Derive the layout from a mesh's declared UV and color sets.
    pub fn from_mesh(mesh: &PolygonMesh) -> Self {
        Self {
            uv_set_count: mesh.uv_sets.len(),
            color_channel_counts: mesh
                .color_sets
                .iter()
                .map(|set| set.representation.channel_count())
                .collect(),
        }
    }

    /// Total width of one packed record:
    /// `2 × uv_set_count + Σ color channel widths`.
    #[inline]
    pub fn total_width(&self) -> usize {
        2 * self.uv_set_count + self.color_channel_counts.iter().sum::<usize>()
    }

    /// Float offset of a UV set within a record.
    #[inline]
    pub fn uv_offset(&self, uv_set: usize) -> usize {
        debug_assert!(uv_set < self.uv_set_count);
        2 * uv_set
    }

    /// Float offset of a color set within a record.
    #[inline]
    pub fn color_offset(&self, color_set: usize) -> usize {
        2 * self.uv_set_count + self.color_channel_counts[..color_set].iter().sum::<usize>()
    }

    /// Pack one face corner's channel data into `record`.
    ///
    /// `corner` indexes the per-face-corner attribute arrays of `mesh`.
    pub fn pack_corner(&self, mesh: &PolygonMesh, corner: usize, record: &mut [f32]) {
        debug_assert_eq!(record.len(), self.total_width());
        let mut cursor = 0;
        for uv_set in &mesh.uv_sets {
            record[cursor] = uv_set.u[corner];
            record[cursor + 1] = uv_set.v[corner];
            cursor += 2;
        }
        for (set, &width) in mesh.color_sets.iter().zip(&self.color_channel_counts) {
            let color = set.colors[corner];
            match width {
                1 => record[cursor] = color[3],
                3 => record[cursor..cursor + 3].copy_from_slice(&color[..3]),
                _ => record[cursor..cursor + 4].copy_from_slice(&color),
            }
            cursor += width;
        }
        debug_assert_eq!(cursor, self.total_width());
    }
}

/// Packed face-varying records for one half-edge mesh.
#[derive(Debug, Default)]
pub struct FaceVaryingTable {
    width: usize,
    /// Record-major storage, `width` floats per record.
    values: Vec<f32>,
    /// Per vertex, the ids of the distinct records attached to it.
    vertex_records: Vec<Vec<u32>>,
    /// Per inserted face corner, the record id for that corner.
    corner_records: Vec<u32>,
}

impl FaceVaryingTable {
    pub(crate) fn new(vertex_count: usize, width: usize) -> Self {
        Self {
            width,
            values: Vec::new(),
            vertex_records: vec![Vec::new(); vertex_count],
            corner_records: Vec::new(),
        }
    }

    /// Width of one record in floats; 0 disables face-varying refinement.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of distinct records.
    #[inline]
    pub fn record_count(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    /// All record values, record-major.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Record ids per inserted face corner, in insertion order.
    #[inline]
    pub fn corner_records(&self) -> &[u32] {
        &self.corner_records
    }

    /// The distinct record ids attached to a vertex.
    #[inline]
    pub fn vertex_records(&self, vertex: u32) -> &[u32] {
        &self.vertex_records[vertex as usize]
    }

    /// One record's values.
    #[inline]
    pub fn record(&self, record: u32) -> &[f32] {
        let start = record as usize * self.width;
        &self.values[start..start + self.width]
    }

    /// Attach one corner's packed values to `vertex`, sharing an existing
    /// record when the values are bit-identical and splitting off a new
    /// record otherwise (a seam).
    pub(crate) fn attach_corner(&mut self, vertex: u32, item: &[f32]) -> u32 {
        debug_assert_eq!(item.len(), self.width);
        let existing = self.vertex_records[vertex as usize]
            .iter()
            .copied()
            .find(|&record| bit_identical(self.record(record), item));
        let record = match existing {
            Some(record) => record,
            None => {
                let record = self.record_count() as u32;
                debug_assert_ne!(record, INVALID_INDEX);
                self.values.extend_from_slice(item);
                self.vertex_records[vertex as usize].push(record);
                record
            }
        };
        self.corner_records.push(record);
        record
    }
}

#[inline]
fn bit_identical(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.to_bits() == y.to_bits())
}
