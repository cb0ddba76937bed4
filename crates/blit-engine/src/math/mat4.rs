use core::ops::Mul;

use blit_gl::UniformValue;

use super::vec::Vec3;

/// 4x4 matrix stored column-major: element `(row, col)` lives at `col * 4 + row`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4(pub [f32; 16]);

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        self.0
    }

    pub fn translation(v: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[12] = v.x;
        m.0[13] = v.y;
        m.0[14] = v.z;
        m
    }

    pub fn scale(v: Vec3) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[0] = v.x;
        m.0[5] = v.y;
        m.0[10] = v.z;
        m
    }

    /// Counter-clockwise rotation about +Z, in radians.
    pub fn rotation_z(rad: f32) -> Mat4 {
        let (s, c) = rad.sin_cos();
        let mut m = Mat4::IDENTITY;
        m.0[0] = c;
        m.0[1] = s;
        m.0[4] = -s;
        m.0[5] = c;
        m
    }

    /// Right-handed perspective projection mapping depth to `[-1, 1]`.
    ///
    /// `fov_y` is the vertical field of view in degrees.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y.to_radians() / 2.0).tan();
        let nf = 1.0 / (near - far);
        Mat4([
            f / aspect, 0.0, 0.0, 0.0, //
            0.0, f, 0.0, 0.0, //
            0.0, 0.0, (far + near) * nf, -1.0, //
            0.0, 0.0, 2.0 * far * near * nf, 0.0,
        ])
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        Mat4([
            2.0 / w, 0.0, 0.0, 0.0, //
            0.0, 2.0 / h, 0.0, 0.0, //
            0.0, 0.0, -2.0 / d, 0.0, //
            -(right + left) / w, -(top + bottom) / h, -(far + near) / d, 1.0,
        ])
    }

    /// World-to-eye transform for a viewer at `eye` facing `center`.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
        let z = (eye - center).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Mat4([
            x.x, y.x, z.x, 0.0, //
            x.y, y.y, z.y, 0.0, //
            x.z, y.z, z.z, 0.0, //
            -x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0,
        ])
    }

    /// Applies the full transform to a point (w = 1) and drops w.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3::new(
            m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
        )
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [0.0; 16];
        for c in 0..4 {
            for r in 0..4 {
                out[r * 4 + c] = self.0[c * 4 + r];
            }
        }
        Mat4(out)
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.0;
        let adj = self.adjugate();
        m[0] * adj[0] + m[1] * adj[4] + m[2] * adj[8] + m[3] * adj[12]
    }

    /// `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        let m = &self.0;
        let adj = self.adjugate();
        let det = m[0] * adj[0] + m[1] * adj[4] + m[2] * adj[8] + m[3] * adj[12];
        if det == 0.0 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Mat4(adj.map(|v| v * inv_det)))
    }

    /// Transposed cofactor matrix, column-major.
    fn adjugate(&self) -> [f32; 16] {
        let m = &self.0;
        let mut inv = [0.0f32; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        inv
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [0.0f32; 16];
        for c in 0..4 {
            for r in 0..4 {
                out[c * 4 + r] = (0..4).map(|k| self.0[k * 4 + r] * rhs.0[c * 4 + k]).sum();
            }
        }
        Mat4(out)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.0.iter().zip(b.0.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-5);
        }
    }

    // ── composition ───────────────────────────────────────────────────────

    #[test]
    fn identity_is_neutral() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn translate_then_rotate_order() {
        let m = Mat4::translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::rotation_z(std::f32::consts::FRAC_PI_2);
        let p = m.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn translation_lives_in_last_column() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(&t.to_cols_array()[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(t.at(0, 3), 1.0);
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let p = Mat4::perspective(90.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(p.at(0, 0), 1.0, epsilon = 1e-6);

        let project = |z: f32| {
            let m = &p.0;
            let clip_z = m[10] * z + m[14];
            let clip_w = m[11] * z + m[15];
            clip_z / clip_w
        };
        assert_relative_eq!(project(-0.1), -1.0, epsilon = 1e-4);
        assert_relative_eq!(project(-100.0), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn orthographic_maps_box_to_ndc() {
        let o = Mat4::orthographic(0.0, 200.0, 0.0, 100.0, -1.0, 1.0);
        let p = o.transform_point(Vec3::new(200.0, 100.0, 0.0));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 1.0);
        let p = o.transform_point(Vec3::ZERO);
        assert_relative_eq!(p.x, -1.0);
        assert_relative_eq!(p.y, -1.0);
    }

    #[test]
    fn look_at_down_negative_z() {
        let eye = Vec3::new(3.0, 4.0, 10.0);
        let v = Mat4::look_at(eye, Vec3::new(3.0, 4.0, 0.0), Vec3::Y);
        assert_mat_eq(v, Mat4::translation(-eye));

        let p = v.transform_point(Vec3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(p.z, -10.0);
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn inverse_round_trips() {
        let m = Mat4::translation(Vec3::new(1.0, -2.0, 0.5))
            * Mat4::rotation_z(0.7)
            * Mat4::scale(Vec3::new(2.0, 3.0, 4.0));
        let inv = m.inverse().unwrap();
        assert_mat_eq(m * inv, Mat4::IDENTITY);
        assert_relative_eq!(m.determinant(), 24.0, epsilon = 1e-4);
    }

    #[test]
    fn singular_has_no_inverse() {
        let m = Mat4::scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(m.determinant(), 0.0);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0)).transpose();
        assert_eq!(t.at(3, 0), 1.0);
        assert_eq!(t.transpose(), Mat4::translation(Vec3::new(1.0, 2.0, 3.0)));
    }
}
