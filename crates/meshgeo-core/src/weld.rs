//! Vertex welding.
//!
//! Positions are merged when they differ by at most `tolerance` on every axis
//! (an axis-aligned box test, not a Euclidean distance). Positions are visited
//! in input order and each one joins the lowest-numbered welded point that
//! qualifies, otherwise it becomes a new point. Welded point ids are therefore
//! assigned in first-occurrence order and the representative position of a
//! point is the first input position that created it.
//!
//! Two strategies implement this contract and always agree:
//! [`WeldStrategy::LinearScan`] compares against every accepted point, and
//! [`WeldStrategy::SpatialHash`] only against points in the neighbouring grid
//! cells.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};
use crate::geometry_indices::PointIndex;

/// Whether positions are deduplicated at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeldMode {
    /// Every source vertex becomes its own point.
    Naive,
    /// Positions within `tolerance` on every axis share a point.
    Welded { tolerance: f32 },
}

impl Default for WeldMode {
    fn default() -> Self {
        WeldMode::Welded { tolerance: 1e-5 }
    }
}

/// Search structure used while welding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeldStrategy {
    /// Quadratic reference scan.
    LinearScan,
    /// Uniform grid over quantized coordinates.
    #[default]
    SpatialHash,
}

/// Welded positions plus the source vertex to point mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldResult {
    /// One position per welded point, indexed by point id.
    pub positions: Vec<[f32; 3]>,
    /// Point id of every source vertex.
    pub remap: Vec<PointIndex>,
}

impl WeldResult {
    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of source vertices merged into an earlier point.
    pub fn welded_count(&self) -> usize {
        self.remap.len() - self.positions.len()
    }
}

/// Returns true when `a` and `b` differ by at most `tolerance` on every axis.
#[inline]
pub fn within_tolerance(a: &[f32; 3], b: &[f32; 3], tolerance: f32) -> bool {
    (a[0] - b[0]).abs() <= tolerance
        && (a[1] - b[1]).abs() <= tolerance
        && (a[2] - b[2]).abs() <= tolerance
}

/// Keeps every position as its own point.
pub fn weld_naive(positions: &[[f32; 3]]) -> Result<WeldResult> {
    if positions.is_empty() {
        return Err(GeoError::EmptyMesh);
    }
    Ok(WeldResult {
        positions: positions.to_vec(),
        remap: (0..positions.len()).map(PointIndex::from).collect(),
    })
}

/// Welds `positions` with the given per-axis `tolerance`.
pub fn weld(positions: &[[f32; 3]], tolerance: f32, strategy: WeldStrategy) -> Result<WeldResult> {
    if positions.is_empty() {
        return Err(GeoError::EmptyMesh);
    }
    if !(tolerance >= 0.0 && tolerance.is_finite()) {
        return Err(GeoError::InvalidTolerance(tolerance));
    }
    Ok(match strategy {
        WeldStrategy::LinearScan => weld_linear(positions, tolerance),
        WeldStrategy::SpatialHash => weld_grid(positions, tolerance),
    })
}

/// Dispatches on `mode`.
pub fn weld_with_mode(
    positions: &[[f32; 3]],
    mode: WeldMode,
    strategy: WeldStrategy,
) -> Result<WeldResult> {
    match mode {
        WeldMode::Naive => weld_naive(positions),
        WeldMode::Welded { tolerance } => weld(positions, tolerance, strategy),
    }
}

fn weld_linear(positions: &[[f32; 3]], tolerance: f32) -> WeldResult {
    let mut welded: Vec<[f32; 3]> = Vec::new();
    let mut remap = Vec::with_capacity(positions.len());

    for position in positions {
        let found = welded
            .iter()
            .position(|candidate| within_tolerance(candidate, position, tolerance));
        let id = match found {
            Some(id) => id,
            None => {
                welded.push(*position);
                welded.len() - 1
            }
        };
        remap.push(PointIndex::from(id));
    }

    WeldResult {
        positions: welded,
        remap,
    }
}

type Cell = [i64; 3];

/// Uniform grid whose cells are at least twice the weld box wide, so every
/// qualifying point lies in the 3x3x3 neighbourhood of the query cell.
struct WeldGrid {
    inv_cell_size: f64,
    cells: HashMap<Cell, Vec<u32>>,
}

impl WeldGrid {
    fn new(positions: &[[f32; 3]], tolerance: f32) -> Self {
        // Keep coordinate / cell ratios well inside f64 integer precision.
        let extent = positions
            .iter()
            .flatten()
            .filter(|c| c.is_finite())
            .fold(0.0f64, |acc, &c| acc.max(f64::from(c).abs()));
        let mut cell_size = (4.0 * f64::from(tolerance)).max(extent * 2f64.powi(-40));
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            cell_size = 1.0;
        }
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: &[f32; 3]) -> Cell {
        // Float to int casts saturate; non-finite coordinates never qualify anyway.
        p.map(|c| (f64::from(c) * self.inv_cell_size).floor() as i64)
    }

    fn insert(&mut self, cell: Cell, id: u32) {
        self.cells.entry(cell).or_default().push(id);
    }

    /// Lowest point id in the neighbourhood of `cell` accepted by `accept`.
    fn lowest_match(&self, cell: Cell, mut accept: impl FnMut(u32) -> bool) -> Option<u32> {
        let mut best: Option<u32> = None;
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let neighbour = [
                        cell[0].saturating_add(dx),
                        cell[1].saturating_add(dy),
                        cell[2].saturating_add(dz),
                    ];
                    let Some(ids) = self.cells.get(&neighbour) else {
                        continue;
                    };
                    // Ids within a cell are ascending.
                    for &id in ids {
                        if best.is_some_and(|b| id >= b) {
                            break;
                        }
                        if accept(id) {
                            best = Some(id);
                            break;
                        }
                    }
                }
            }
        }
        best
    }
}

fn weld_grid(positions: &[[f32; 3]], tolerance: f32) -> WeldResult {
    let mut grid = WeldGrid::new(positions, tolerance);
    let mut welded: Vec<[f32; 3]> = Vec::new();
    let mut remap = Vec::with_capacity(positions.len());

    for position in positions {
        let cell = grid.cell_of(position);
        let found = grid.lowest_match(cell, |id| {
            within_tolerance(&welded[id as usize], position, tolerance)
        });
        let id = match found {
            Some(id) => id,
            None => {
                let id = welded.len() as u32;
                welded.push(*position);
                grid.insert(cell, id);
                id
            }
        };
        remap.push(PointIndex(id));
    }

    WeldResult {
        positions: welded,
        remap,
    }
}
