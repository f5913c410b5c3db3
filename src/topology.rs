//! Connection topology substrate shared by every oscillatory network.
//!
//! Grounded in `network.cpp`'s dispatch over `conn_type` and its internal
//! representation tags (`MATRIX_CONN_REPRESENTATION` / `BITMAP_CONN_...` /
//! `LIST_CONN_...`). One redesign over the original: there, `set_connection`
//! only links one direction per call, so symmetric topologies need two
//! calls. Here `set_connection(i, j)` is unconditionally bidirectional for
//! bidirectional topology kinds, which is what the specification's own
//! invariant requires (`connected(i, j)` implies `connected(j, i)`)
//! rather than something left to callers to remember.

use crate::error::{CoreError, Result};

/// The oscillator count above which `Dynamic` topology switches from a dense
/// per-row bit vector to a bitmap representation, matching
/// `MAXIMUM_OSCILLATORS_MATRIX_REPRESENTATION` in `network.cpp`.
pub const MAXIMUM_OSCILLATORS_MATRIX_REPRESENTATION: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
    None,
    AllToAll,
    GridFour,
    GridEight,
    ListBidir,
    Dynamic,
}

#[derive(Debug, Clone)]
enum Storage {
    Empty,
    Implicit,
    Adjacency(Vec<Vec<usize>>),
    DenseMatrix(Vec<Vec<bool>>),
    Bitmap(Vec<Vec<u64>>),
}

/// Adjacency over `n` oscillators.
#[derive(Debug, Clone)]
pub struct Topology {
    n: usize,
    kind: TopologyKind,
    storage: Storage,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn none(n: usize) -> Self {
        Topology { n, kind: TopologyKind::None, storage: Storage::Empty }
    }

    pub fn all_to_all(n: usize) -> Self {
        Topology { n, kind: TopologyKind::AllToAll, storage: Storage::Implicit }
    }

    /// Auto-computes a square grid from `n` alone, as the original's
    /// single-argument constructor does; a non-integral square root is
    /// `InvalidTopology`.
    pub fn grid_four_square(n: usize) -> Result<Self> {
        let side = (n as f64).sqrt();
        let side_rounded = side.round() as usize;
        if side_rounded * side_rounded != n {
            return Err(CoreError::InvalidTopology(format!(
                "{n} oscillators do not form a square grid"
            )));
        }
        Self::grid_four(n, side_rounded, side_rounded)
    }

    pub fn grid_four(n: usize, height: usize, width: usize) -> Result<Self> {
        if height * width != n {
            return Err(CoreError::InvalidTopology(format!(
                "grid {height}x{width} does not hold {n} oscillators"
            )));
        }
        let adjacency = build_grid_adjacency(height, width, false);
        Ok(Topology { n, kind: TopologyKind::GridFour, storage: Storage::Adjacency(adjacency) })
    }

    pub fn grid_eight(n: usize, height: usize, width: usize) -> Result<Self> {
        if height * width != n {
            return Err(CoreError::InvalidTopology(format!(
                "grid {height}x{width} does not hold {n} oscillators"
            )));
        }
        let adjacency = build_grid_adjacency(height, width, true);
        Ok(Topology { n, kind: TopologyKind::GridEight, storage: Storage::Adjacency(adjacency) })
    }

    pub fn list_bidir(n: usize) -> Self {
        let mut adjacency = vec![Vec::new(); n];
        for i in 0..n {
            if i > 0 {
                adjacency[i].push(i - 1);
            }
            if i + 1 < n {
                adjacency[i].push(i + 1);
            }
        }
        Topology { n, kind: TopologyKind::ListBidir, storage: Storage::Adjacency(adjacency) }
    }

    /// An initially-empty mutable topology, e.g. for syncnet's
    /// distance-thresholded connectivity.
    pub fn dynamic(n: usize) -> Self {
        let storage = if n > MAXIMUM_OSCILLATORS_MATRIX_REPRESENTATION {
            let words_per_row = (n + 63) / 64;
            Storage::Bitmap(vec![vec![0u64; words_per_row]; n])
        } else {
            Storage::DenseMatrix(vec![vec![false; n]; n])
        };
        Topology { n, kind: TopologyKind::Dynamic, storage }
    }

    /// Links `i` and `j` symmetrically. Only meaningful for `Dynamic` topology.
    pub fn set_connection(&mut self, i: usize, j: usize) {
        match &mut self.storage {
            Storage::DenseMatrix(rows) => {
                rows[i][j] = true;
                rows[j][i] = true;
            }
            Storage::Bitmap(rows) => {
                set_bit(&mut rows[i], j);
                set_bit(&mut rows[j], i);
            }
            Storage::Adjacency(rows) => {
                if !rows[i].contains(&j) {
                    rows[i].push(j);
                }
                if !rows[j].contains(&i) {
                    rows[j].push(i);
                }
            }
            Storage::Empty | Storage::Implicit => {}
        }
    }

    pub fn connected(&self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        match &self.storage {
            Storage::Empty => false,
            Storage::Implicit => true,
            Storage::Adjacency(rows) => rows[i].contains(&j),
            Storage::DenseMatrix(rows) => rows[i][j],
            Storage::Bitmap(rows) => get_bit(&rows[i], j),
        }
    }

    pub fn neighbors(&self, i: usize) -> Vec<usize> {
        match &self.storage {
            Storage::Empty => Vec::new(),
            Storage::Implicit => (0..self.n).filter(|&j| j != i).collect(),
            Storage::Adjacency(rows) => rows[i].clone(),
            Storage::DenseMatrix(rows) => {
                (0..self.n).filter(|&j| j != i && rows[i][j]).collect()
            }
            Storage::Bitmap(rows) => (0..self.n).filter(|&j| j != i && get_bit(&rows[i], j)).collect(),
        }
    }
}

fn set_bit(row: &mut [u64], j: usize) {
    row[j / 64] |= 1u64 << (j % 64);
}

fn get_bit(row: &[u64], j: usize) -> bool {
    (row[j / 64] >> (j % 64)) & 1 == 1
}

fn build_grid_adjacency(height: usize, width: usize, diagonals: bool) -> Vec<Vec<usize>> {
    let n = height * width;
    let mut adjacency = vec![Vec::new(); n];
    let idx = |r: usize, c: usize| r * width + c;

    for r in 0..height {
        for c in 0..width {
            let i = idx(r, c);
            if r > 0 {
                adjacency[i].push(idx(r - 1, c));
            }
            if r + 1 < height {
                adjacency[i].push(idx(r + 1, c));
            }
            if c > 0 {
                adjacency[i].push(idx(r, c - 1));
            }
            if c + 1 < width {
                adjacency[i].push(idx(r, c + 1));
            }
            if diagonals {
                if r > 0 && c > 0 {
                    adjacency[i].push(idx(r - 1, c - 1));
                }
                if r > 0 && c + 1 < width {
                    adjacency[i].push(idx(r - 1, c + 1));
                }
                if r + 1 < height && c > 0 {
                    adjacency[i].push(idx(r + 1, c - 1));
                }
                if r + 1 < height && c + 1 < width {
                    adjacency[i].push(idx(r + 1, c + 1));
                }
            }
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_to_all_connects_every_distinct_pair() {
        let t = Topology::all_to_all(4);
        assert!(t.connected(0, 1));
        assert!(!t.connected(2, 2));
        assert_eq!(t.neighbors(0).len(), 3);
    }

    #[test]
    fn grid_four_rejects_inconsistent_dimensions() {
        assert!(Topology::grid_four(10, 3, 3).is_err());
    }

    #[test]
    fn grid_four_corner_has_two_neighbors() {
        let t = Topology::grid_four(9, 3, 3).unwrap();
        assert_eq!(t.neighbors(0).len(), 2);
        assert_eq!(t.neighbors(4).len(), 4); // center
    }

    #[test]
    fn dynamic_set_connection_is_bidirectional() {
        let mut t = Topology::dynamic(5);
        t.set_connection(1, 3);
        assert!(t.connected(1, 3));
        assert!(t.connected(3, 1));
        assert!(!t.connected(0, 1));
    }

    #[test]
    fn dynamic_large_network_uses_bitmap_without_behavior_change() {
        let mut t = Topology::dynamic(MAXIMUM_OSCILLATORS_MATRIX_REPRESENTATION + 1);
        t.set_connection(0, 5000);
        assert!(t.connected(0, 5000));
        assert!(t.connected(5000, 0));
    }
}
