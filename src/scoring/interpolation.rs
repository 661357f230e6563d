//! Trilinear interpolation of energy maps at atom positions

use crate::grid::{EnergyMap, Field, GridError};
use nalgebra::Vector3;

/// Corner visited by each weight, as `(u, v, w)` offsets from the lower
/// node (1 selects the upper node on that axis).
///
/// Weights are ordered `p000 ..= p111`. The subscript bits name the `u`, `v`
/// and `w` terms in that order, a 0 bit taking the `p0` term and a 1 bit the
/// `p1` term. The corner paired with `pabc` takes its `w` node from the
/// complement of `a`, its `v` node from the complement of `b` and its `u`
/// node from the complement of `c`. The map files this grid is built from
/// were generated against exactly this pairing.
const CORNERS: [(usize, usize, usize); 8] = [
    (1, 1, 1), // p000
    (0, 1, 1), // p001
    (1, 0, 1), // p010
    (0, 0, 1), // p011
    (1, 1, 0), // p100
    (0, 1, 0), // p101
    (1, 0, 0), // p110
    (0, 0, 0), // p111
];

/// Lower node index and the two fractional terms along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisCell {
    lower: usize,
    p0: f64,
    p1: f64,
}

impl AxisCell {
    fn locate(t: f64, nodes: usize) -> Option<Self> {
        // Also rejects NaN
        if !(t >= 0.0) {
            return None;
        }
        // Truncation is floor on the non-negative domain
        let lower = t as usize;
        if lower >= nodes - 1 {
            return None;
        }
        Some(Self {
            lower,
            p0: t - lower as f64,
            p1: (lower + 1) as f64 - t,
        })
    }
}

/// The eight corner weights and the grid cell around one position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    lower: [usize; 3],
    weights: [f64; 8],
}

impl CellSample {
    /// Locate `position` in `field`.
    ///
    /// Fails when the upper node on any axis would fall outside the grid.
    pub fn locate(field: &Field, position: &Vector3<f64>) -> Result<Self, GridError> {
        let t = field.to_grid_units(position);
        let d = field.dimensions();
        let cells = (
            AxisCell::locate(t.x, d.nx),
            AxisCell::locate(t.y, d.ny),
            AxisCell::locate(t.z, d.nz),
        );
        let (u, v, w) = match cells {
            (Some(u), Some(v), Some(w)) => (u, v, w),
            _ => {
                return Err(GridError::OutOfBounds {
                    position: *position,
                })
            }
        };

        let weights = [
            u.p0 * v.p0 * w.p0,
            u.p0 * v.p0 * w.p1,
            u.p0 * v.p1 * w.p0,
            u.p0 * v.p1 * w.p1,
            u.p1 * v.p0 * w.p0,
            u.p1 * v.p0 * w.p1,
            u.p1 * v.p1 * w.p0,
            u.p1 * v.p1 * w.p1,
        ];

        Ok(Self {
            lower: [u.lower, v.lower, w.lower],
            weights,
        })
    }

    /// Lower node `(u0, v0, w0)` of the cell
    pub fn lower(&self) -> [usize; 3] {
        self.lower
    }

    /// Weights `p000 ..= p111`
    pub fn weights(&self) -> &[f64; 8] {
        &self.weights
    }

    /// Node index `(u, v, w)` paired with weight `i`
    pub fn corner(&self, i: usize) -> (usize, usize, usize) {
        let (du, dv, dw) = CORNERS[i];
        let [u0, v0, w0] = self.lower();
        (u0 + du, v0 + dv, w0 + dw)
    }

    /// Weighted sum of the map values at the eight corners
    #[inline]
    pub fn sample(&self, map: &EnergyMap) -> f64 {
        let mut value = 0.0;
        for (i, weight) in self.weights.iter().enumerate() {
            let (u, v, w) = self.corner(i);
            value += weight * map.value(u, v, w);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDimensions;
    use assert_approx_eq::assert_approx_eq;

    fn field(spacing: f64) -> Field {
        Field::new(
            Vector3::new(-2.0, 1.0, 0.5),
            spacing,
            GridDimensions::new(5, 4, 3),
        )
        .unwrap()
    }

    fn ramp(field: &Field) -> EnergyMap {
        EnergyMap::from_fn(field.dimensions(), |u, v, w| {
            (u * 7 + v * 13 + w * 29) as f64 * 0.1 - 1.0
        })
    }

    #[test]
    fn test_exact_at_nodes() {
        for spacing in [0.375, 1.0, 2.5] {
            let field = field(spacing);
            let map = ramp(&field);
            for (u, v, w) in [(0, 0, 0), (3, 2, 1), (1, 2, 0), (2, 0, 1)] {
                let sample = CellSample::locate(&field, &field.node_position(u, v, w)).unwrap();
                assert_eq!(sample.lower(), [u, v, w]);
                assert_eq!(sample.sample(&map), map.value(u, v, w));
            }
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let field = field(0.375);
        let positions = [
            Vector3::new(-1.9, 1.05, 0.6),
            Vector3::new(-0.77, 1.9, 1.01),
            Vector3::new(-0.51, 2.11, 1.24),
        ];
        for position in positions {
            let sample = CellSample::locate(&field, &position).unwrap();
            let sum: f64 = sample.weights().iter().sum();
            assert_approx_eq!(sum, 1.0, 1e-12);
        }
    }

    #[test]
    fn test_extreme_weights_pair_with_opposite_corners() {
        let sample = CellSample::locate(&field(1.0), &Vector3::new(-0.75, 2.5, 1.25)).unwrap();
        assert_eq!(sample.lower(), [1, 1, 0]);
        assert_eq!(sample.corner(0), (2, 2, 1));
        assert_eq!(sample.corner(7), (1, 1, 0));

        // p000 is the product of the distances from the lower node
        assert_approx_eq!(sample.weights()[0], 0.25 * 0.5 * 0.75);
        assert_approx_eq!(sample.weights()[7], 0.75 * 0.5 * 0.25);
    }

    #[test]
    fn test_linear_map_is_reproduced() {
        let field = field(0.5);
        let map = EnergyMap::from_fn(field.dimensions(), |u, v, w| (u + v + w) as f64);
        let position = Vector3::new(-1.4, 1.6, 0.9);
        let t = field.to_grid_units(&position);

        let sample = CellSample::locate(&field, &position).unwrap();
        assert_approx_eq!(sample.sample(&map), t.x + t.y + t.z, 1e-12);
    }

    #[test]
    fn test_fractional_z_offset_blends_x_neighbours() {
        let field = field(1.0);
        let along_x = EnergyMap::from_fn(field.dimensions(), |u, _, _| u as f64);
        let along_z = EnergyMap::from_fn(field.dimensions(), |_, _, w| w as f64);

        // Node (1, 1, 0) shifted a quarter cell along z
        let position = field.node_position(1, 1, 0) + Vector3::new(0.0, 0.0, 0.25);
        let sample = CellSample::locate(&field, &position).unwrap();

        assert_approx_eq!(sample.sample(&along_x), 1.25, 1e-12);
        assert_approx_eq!(sample.sample(&along_z), 0.0, 1e-12);
    }

    #[test]
    fn test_out_of_bounds() {
        let field = field(1.0);
        let below = Vector3::new(-2.5, 1.5, 1.0);
        assert_eq!(
            CellSample::locate(&field, &below),
            Err(GridError::OutOfBounds { position: below })
        );

        // The last node has no upper neighbour
        let last = field.node_position(4, 0, 0);
        assert!(CellSample::locate(&field, &last).is_err());

        let nan = Vector3::new(f64::NAN, 1.5, 1.0);
        assert!(CellSample::locate(&field, &nan).is_err());
    }
}
