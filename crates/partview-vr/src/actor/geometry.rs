use std::fmt;

use glam::Vec3;

/// Indexed triangle mesh.
///
/// Normals are derived at construction (area-weighted face normals
/// accumulated per vertex). The mesh is never mutated afterwards, which is
/// what lets UI and VR clones share it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

/// Reasons a mesh cannot be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Index count is not a multiple of three.
    PartialTriangle { index_count: usize },
    /// An index points past the vertex array.
    IndexOutOfRange { index: u32, vertex_count: usize },
    /// A vertex position is NaN or infinite.
    NonFinitePosition { vertex: usize },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartialTriangle { index_count } => {
                write!(f, "index count {index_count} is not a multiple of 3")
            }
            Self::IndexOutOfRange { index, vertex_count } => {
                write!(f, "index {index} out of range for {vertex_count} vertices")
            }
            Self::NonFinitePosition { vertex } => {
                write!(f, "vertex {vertex} has a non-finite position")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

impl Geometry {
    /// Builds a mesh from positions and triangle indices.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let normals = vertex_normals(&positions, &indices);
        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Builds a mesh from an unindexed triangle list (the shape STL readers produce).
    pub fn from_triangles(triangles: &[[[f32; 3]; 3]]) -> Self {
        let positions: Vec<[f32; 3]> = triangles.iter().flatten().copied().collect();
        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, indices)
    }

    /// Axis-aligned cube centered at `center`.
    pub fn cube(center: [f32; 3], half_extent: f32) -> Self {
        let c = Vec3::from(center);
        let h = half_extent;
        let corners: Vec<[f32; 3]> = [
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ]
        .iter()
        .map(|&p| (c + Vec3::from(p)).to_array())
        .collect();

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];

        Self::new(corners, indices)
    }

    /// Regular-ish tetrahedron with its base centered at `base`.
    pub fn tetrahedron(base: [f32; 3], size: f32) -> Self {
        let b = Vec3::from(base);
        let s = size;
        let positions = vec![
            (b + Vec3::new(-s, 0.0, -s * 0.577)).to_array(),
            (b + Vec3::new(s, 0.0, -s * 0.577)).to_array(),
            (b + Vec3::new(0.0, 0.0, s * 1.155)).to_array(),
            (b + Vec3::new(0.0, s * 1.633, 0.0)).to_array(),
        ];
        let indices = vec![0, 1, 2, 0, 3, 1, 1, 3, 2, 2, 3, 0];
        Self::new(positions, indices)
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks that the mesh can be drawn as-is.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle {
                index_count: self.indices.len(),
            });
        }

        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: self.positions.len(),
            });
        }

        if let Some(vertex) = self
            .positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(GeometryError::NonFinitePosition { vertex });
        }

        Ok(())
    }

    /// Axis-aligned bounds over finite positions, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.positions
            .iter()
            .map(|&p| Vec3::from(p))
            .filter(|p| p.is_finite())
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }
}

fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        // Cross product length is twice the triangle area: larger faces weigh more.
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }

    acc.into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}
