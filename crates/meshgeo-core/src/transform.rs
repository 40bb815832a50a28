use serde::{Deserialize, Serialize};

/// Affine local-to-world transform (4x4 row-major matrix, column vectors).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut t = Self::IDENTITY;
        t.matrix[0][3] = x;
        t.matrix[1][3] = y;
        t.matrix[2][3] = z;
        t
    }

    pub fn from_scale(x: f32, y: f32, z: f32) -> Self {
        let mut t = Self::IDENTITY;
        t.matrix[0][0] = x;
        t.matrix[1][1] = y;
        t.matrix[2][2] = z;
        t
    }

    /// Maps a local-space point to world space.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.matrix;
        let mut out = [0.0; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = m[row][0] * p[0] + m[row][1] * p[1] + m[row][2] * p[2] + m[row][3];
        }
        let w = m[3][0] * p[0] + m[3][1] * p[1] + m[3][2] * p[2] + m[3][3];
        if w != 0.0 && w != 1.0 {
            for value in &mut out {
                *value /= w;
            }
        }
        out
    }

    /// Maps a local-space surface normal to world space, ignoring translation.
    ///
    /// Normals go through the inverse transpose of the upper 3x3 so they stay
    /// perpendicular to transformed surfaces under non-uniform scale. A
    /// singular matrix falls back to the plain upper 3x3. The result keeps the
    /// input's length unless it collapses to zero.
    pub fn transform_normal(&self, n: [f32; 3]) -> [f32; 3] {
        let m = &self.matrix;
        let rows = [
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ];
        // Cofactor matrix, equal to det * inverse transpose.
        let cofactors = [
            cross(rows[1], rows[2]),
            cross(rows[2], rows[0]),
            cross(rows[0], rows[1]),
        ];
        let det = dot(rows[0], cofactors[0]);
        let (basis, sign) = if det != 0.0 && det.is_finite() {
            (cofactors, det.signum())
        } else {
            (rows, 1.0)
        };

        let mut out = basis.map(|row| sign * dot(row, n));
        let len_in = length(n);
        let len_out = length(out);
        if len_out > 0.0 && len_out.is_finite() {
            let scale = len_in / len_out;
            for value in &mut out {
                *value *= scale;
            }
        }
        out
    }
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn length(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_moves_points_not_directions() {
        let t = Transform::from_translation(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point([1.0, 1.0, 1.0]), [2.0, 3.0, 4.0]);
        assert_eq!(t.transform_normal([0.0, 1.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_scale_keeps_normal_length() {
        let t = Transform::from_scale(2.0, 2.0, 2.0);
        assert_eq!(t.transform_point([1.0, 0.5, 0.0]), [2.0, 1.0, 0.0]);
        assert_eq!(t.transform_normal([0.0, 0.0, 1.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_non_uniform_scale_keeps_normals_perpendicular() {
        let t = Transform::from_scale(2.0, 1.0, 1.0);
        let h = std::f32::consts::FRAC_1_SQRT_2;
        // Surface spanned by (1, -1, 0) and (0, 0, 1).
        let n = t.transform_normal([h, h, 0.0]);
        let edge = t.transform_point([1.0, -1.0, 0.0]);
        assert!(dot(n, edge).abs() < 1e-6, "{n:?}");
        assert!((length(n) - 1.0).abs() < 1e-6);
        assert!(n[0] > 0.0 && n[1] > n[0]);
    }

    #[test]
    fn test_mirroring_scale_keeps_orientation() {
        let t = Transform::from_scale(-1.0, 1.0, 1.0);
        assert_eq!(t.transform_normal([1.0, 0.0, 0.0]), [-1.0, 0.0, 0.0]);
        assert_eq!(t.transform_normal([0.0, 1.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_singular_matrix_falls_back() {
        let t = Transform::from_scale(1.0, 1.0, 0.0);
        assert_eq!(t.transform_normal([0.0, 2.0, 0.0]), [0.0, 2.0, 0.0]);
        assert_eq!(t.transform_normal([0.0, 0.0, 1.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotation_about_y() {
        // 90 degrees about +Y: +X goes to -Z.
        let t = Transform {
            matrix: [
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [-1.0, 0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };
        assert_eq!(t.transform_normal([1.0, 0.0, 0.0]), [0.0, 0.0, -1.0]);
        assert_eq!(t.transform_point([0.0, 0.0, 2.0]), [2.0, 0.0, 0.0]);
    }
}
