//! 3-D extents and linear-index decomposition
//!
//! Work-items and work-groups are identified on the wire by a single linear
//! index; diagnostics want the 3-D coordinates back. `Dim3` carries an extent
//! and performs the row-major (x fastest, then y, then z) conversion in both
//! directions.

use std::fmt;

/// 3-D extent or coordinate triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dim3 {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl Dim3 {
    /// Create a new triple
    pub const fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Create a 1-D extent
    pub const fn linear(size: u64) -> Self {
        Self { x: size, y: 1, z: 1 }
    }

    /// Total number of points in the extent
    pub const fn total(&self) -> u64 {
        self.x * self.y * self.z
    }

    /// Decompose a linear index into 3-D coordinates within `extent`
    ///
    /// Row-major with x fastest: `index = x + y*ex + z*ex*ey`. Degenerate
    /// axes (extent 0) are treated as 1 so a hostile extent cannot divide by
    /// zero.
    pub fn decompose(index: u64, extent: Dim3) -> Dim3 {
        let ex = extent.x.max(1);
        let ey = extent.y.max(1);
        Dim3 {
            x: index % ex,
            y: (index / ex) % ey,
            z: index / (ex * ey),
        }
    }

    /// Inverse of [`Dim3::decompose`]
    pub fn linearize(coord: Dim3, extent: Dim3) -> u64 {
        coord.x + coord.y * extent.x + coord.z * extent.x * extent.y
    }

    /// Component-wise remainder, used to turn global coordinates into local
    pub fn rem(&self, other: Dim3) -> Dim3 {
        Dim3 {
            x: self.x % other.x.max(1),
            y: self.y % other.y.max(1),
            z: self.z % other.z.max(1),
        }
    }

    /// Component-wise quotient, used to turn global coordinates into group
    pub fn div(&self, other: Dim3) -> Dim3 {
        Dim3 {
            x: self.x / other.x.max(1),
            y: self.y / other.y.max(1),
            z: self.z / other.z.max(1),
        }
    }
}

impl Default for Dim3 {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

impl fmt::Display for Dim3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ================================================================================================
// Tests
// ================================================================================================
