//! Pixel grid → 3D positions.
use std::{f64::consts::PI, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Width of the planar sheet in world units.
pub const PLANE_WIDTH: f32 = 8.0;
pub const PLANE_DEPTH_RANGE: f32 = 6.0;
/// Z of the nearest possible planar point.
pub const PLANE_DEPTH_OFFSET: f32 = -3.0;

pub const SPHERE_BASE_RADIUS: f32 = 10.0;
pub const SPHERE_DEPTH_RANGE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Flat sheet facing the camera, depth pushes points back along -Z
    #[default]
    Planar,
    /// Full 360° panorama wrapped onto a sphere around the origin
    Equirectangular,
}

impl Projection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Projection::Planar => "planar",
            Projection::Equirectangular => "equirectangular",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Projection {
    type Err = String;

    /// Accepts the projection names and the request modes they come from.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planar" | "standard" => Ok(Projection::Planar),
            "equirectangular" | "panorama" => Ok(Projection::Equirectangular),
            other => Err(format!("unknown projection: {other}")),
        }
    }
}

/// `n` evenly spaced samples over `[start, end]`; a single sample is `start`.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Per-axis lookup tables for one image size.
#[derive(Debug, Clone)]
pub(crate) enum Projector {
    Planar {
        /// X per column
        xs: Vec<f32>,
        /// Y per row
        ys: Vec<f32>,
    },
    Sphere {
        /// (sin, cos) of the longitude per column
        lon: Vec<(f32, f32)>,
        /// (sin, cos) of the latitude per row
        lat: Vec<(f32, f32)>,
    },
}

impl Projector {
    pub fn new(projection: Projection, width: usize, height: usize) -> Self {
        match projection {
            Projection::Planar => {
                let aspect = if width == 0 {
                    0.0
                } else {
                    height as f64 / width as f64
                };
                let plane = PLANE_WIDTH as f64;
                Projector::Planar {
                    xs: linspace(-0.5, 0.5, width)
                        .into_iter()
                        .map(|u| (u * plane) as f32)
                        .collect(),
                    ys: linspace(0.5, -0.5, height)
                        .into_iter()
                        .map(|v| (v * plane * aspect) as f32)
                        .collect(),
                }
            }
            Projection::Equirectangular => {
                let lon = (0..width)
                    .map(|x| {
                        let lon = 2.0 * PI * x as f64 / width as f64;
                        (lon.sin() as f32, lon.cos() as f32)
                    })
                    .collect();
                let lat = linspace(0.0, 1.0, height)
                    .into_iter()
                    .map(|v| {
                        let lat = v * PI;
                        (lat.sin() as f32, lat.cos() as f32)
                    })
                    .collect();
                Projector::Sphere { lon, lat }
            }
        }
    }

    /// Position of pixel (x, y) with normalized depth `depth` (1 = nearest).
    /// Out-of-range and non-finite depths are clamped so the result is finite.
    #[inline]
    pub fn position(&self, x: usize, y: usize, depth: f32) -> [f32; 3] {
        let depth = if depth.is_finite() {
            depth.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self {
            Projector::Planar { xs, ys } => [
                xs[x],
                ys[y],
                PLANE_DEPTH_OFFSET - (1.0 - depth) * PLANE_DEPTH_RANGE,
            ],
            Projector::Sphere { lon, lat } => {
                let r = SPHERE_BASE_RADIUS - (1.0 - depth) * SPHERE_DEPTH_RANGE;
                let (sin_lon, cos_lon) = lon[x];
                let (sin_lat, cos_lat) = lat[y];
                [r * sin_lat * sin_lon, r * cos_lat, r * sin_lat * cos_lon]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn linspace_matches_numpy() {
        assert_eq!(linspace(0.0, 1.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(-0.5, 0.5, 1), vec![-0.5]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.5, -0.5, 3), vec![0.5, 0.0, -0.5]);
    }

    #[test]
    fn parse_modes_and_names() {
        assert_eq!(
            "standard".parse::<Projection>().unwrap(),
            Projection::Planar
        );
        assert_eq!(
            "Panorama".parse::<Projection>().unwrap(),
            Projection::Equirectangular
        );
        assert_eq!(
            "equirectangular".parse::<Projection>().unwrap(),
            Projection::Equirectangular
        );
        assert!("fisheye".parse::<Projection>().is_err());
        assert_eq!(
            serde_json::to_string(&Projection::Equirectangular).unwrap(),
            "\"equirectangular\""
        );
    }

    #[test]
    fn planar_corners() {
        let projector = Projector::new(Projection::Planar, 200, 100);
        let top_left = projector.position(0, 0, 1.0);
        let bottom_right = projector.position(199, 99, 0.0);
        assert_abs_diff_eq!(top_left[0], -4.0);
        assert_abs_diff_eq!(top_left[1], 2.0);
        assert_abs_diff_eq!(top_left[2], -3.0);
        assert_abs_diff_eq!(bottom_right[0], 4.0);
        assert_abs_diff_eq!(bottom_right[1], -2.0);
        assert_abs_diff_eq!(bottom_right[2], -9.0);
    }

    #[test]
    fn sphere_poles_and_seam() {
        let projector = Projector::new(Projection::Equirectangular, 8, 5);
        // top row sits on the north pole
        let north = projector.position(3, 0, 1.0);
        assert_abs_diff_eq!(north[0], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(north[1], 10.0, epsilon = 1e-5);
        // equator, longitude 0 faces +Z; a quarter turn faces +X
        let front = projector.position(0, 2, 0.0);
        assert_abs_diff_eq!(front[2], 6.0, epsilon = 1e-5);
        let side = projector.position(2, 2, 0.0);
        assert_abs_diff_eq!(side[0], 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(side[2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn bad_depth_is_clamped() {
        let projector = Projector::new(Projection::Planar, 4, 4);
        assert_eq!(projector.position(1, 1, f32::NAN)[2], -9.0);
        assert_eq!(projector.position(1, 1, 7.5)[2], -3.0);
        assert_eq!(projector.position(1, 1, -2.0)[2], -9.0);
    }
}
