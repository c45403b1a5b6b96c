//! Separable edge-feathering weights for tile blending.
//!
//! Within `overlap` pixels of an edge the weight at distance `i` is scaled by
//! `(i + 1) / (overlap + 1)`; rows and columns are scaled independently, so a
//! corner gets the product of both ramps. Outside the band the weight is 1.

#[derive(Debug, Clone, PartialEq)]
pub struct FeatherMask {
    rows: Vec<f32>,
    cols: Vec<f32>,
}

fn edge_ramp(len: usize, overlap: usize) -> Vec<f32> {
    let ramp = |d: usize| -> f32 {
        if d < overlap {
            (d + 1) as f32 / (overlap + 1) as f32
        } else {
            1.0
        }
    };
    (0..len).map(|i| ramp(i) * ramp(len - 1 - i)).collect()
}

impl FeatherMask {
    pub fn new(height: usize, width: usize, overlap: usize) -> Self {
        Self {
            rows: edge_ramp(height, overlap),
            cols: edge_ramp(width, overlap),
        }
    }

    pub fn width(&self) -> usize {
        self.cols.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn weight(&self, x: usize, y: usize) -> f32 {
        self.rows[y] * self.cols[x]
    }

    /// Dense row-major weights.
    pub fn to_vec(&self) -> Vec<f32> {
        self.rows
            .iter()
            .flat_map(|&r| self.cols.iter().map(move |&c| r * c))
            .collect()
    }
}
