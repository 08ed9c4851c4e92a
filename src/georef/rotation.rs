use nalgebra::{Matrix3, Vector3};
use std::ops::Mul;
use tracing::warn;

/// Where a rotation matrix came from.
///
/// Matrices rebuilt from omega/phi/kappa angles have been observed to disagree
/// with the nine coefficients exported by photogrammetry tools for the same
/// camera pose, so the provenance travels with the matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationSource {
    FromCoefficients,
    /// Angles in radians
    FromAngles { omega: f64, phi: f64, kappa: f64 },
}

/// 3×3 camera orientation matrix, row major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix {
    matrix: Matrix3<f64>,
    source: RotationSource,
}

impl RotationMatrix {
    /// Matrix from nine coefficients `r11, r12, r13, r21, .., r33`.
    pub fn from_elements(elements: [f64; 9]) -> Self {
        Self {
            matrix: Matrix3::from_row_slice(&elements),
            source: RotationSource::FromCoefficients,
        }
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let [r1, r2, r3] = rows;
        Self::from_elements([
            r1[0], r1[1], r1[2], r2[0], r2[1], r2[2], r3[0], r3[1], r3[2],
        ])
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            source: RotationSource::FromCoefficients,
        }
    }

    /// Rebuild a matrix from omega/phi/kappa angles in radians as `Rx(ω)·Ry(φ)·Rz(κ)`.
    ///
    /// The result may not match the coefficients a photogrammetry export
    /// reports for the same pose. Prefer [`RotationMatrix::from_elements`]
    /// when the coefficients are available.
    pub fn from_opk(omega: f64, phi: f64, kappa: f64) -> Self {
        warn!(
            "Rotation rebuilt from omega/phi/kappa ({omega}, {phi}, {kappa}) may not match exported coefficients"
        );
        let (so, co) = omega.sin_cos();
        let (sp, cp) = phi.sin_cos();
        let (sk, ck) = kappa.sin_cos();

        #[rustfmt::skip]
        let rx = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, co, -so,
            0.0, so, co,
        );
        #[rustfmt::skip]
        let ry = Matrix3::new(
            cp, 0.0, sp,
            0.0, 1.0, 0.0,
            -sp, 0.0, cp,
        );
        #[rustfmt::skip]
        let rz = Matrix3::new(
            ck, -sk, 0.0,
            sk, ck, 0.0,
            0.0, 0.0, 1.0,
        );

        Self {
            matrix: rx * ry * rz,
            source: RotationSource::FromAngles { omega, phi, kappa },
        }
    }

    pub fn from_opk_degrees(omega: f64, phi: f64, kappa: f64) -> Self {
        Self::from_opk(omega.to_radians(), phi.to_radians(), kappa.to_radians())
    }

    /// `self · other`
    ///
    /// Angle provenance is kept if either side was rebuilt from angles.
    pub fn compose(&self, other: &Self) -> Self {
        let source = match (self.source, other.source) {
            (RotationSource::FromCoefficients, source) => source,
            (source, _) => source,
        };
        Self {
            matrix: self.matrix * other.matrix,
            source,
        }
    }

    pub fn apply(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * vector
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Row major coefficients
    pub fn elements(&self) -> [f64; 9] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    pub fn source(&self) -> RotationSource {
        self.source
    }

    pub fn is_from_angles(&self) -> bool {
        matches!(self.source, RotationSource::FromAngles { .. })
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for RotationMatrix {
    type Output = RotationMatrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}

impl From<Matrix3<f64>> for RotationMatrix {
    fn from(matrix: Matrix3<f64>) -> Self {
        Self {
            matrix,
            source: RotationSource::FromCoefficients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_rotation() -> RotationMatrix {
        RotationMatrix::from_elements([
            0.9987, -0.0475, 0.0184, 0.0479, 0.9985, -0.0249, -0.0172, 0.0258, 0.9995,
        ])
    }

    #[test]
    fn elements_are_row_major() {
        let r = RotationMatrix::from_elements([1., 2., 3., 4., 5., 6., 7., 8., 9.]);
        assert_eq!(r.matrix()[(0, 1)], 2.0);
        assert_eq!(r.matrix()[(1, 0)], 4.0);
        assert_eq!(r.elements(), [1., 2., 3., 4., 5., 6., 7., 8., 9.]);
        assert_eq!(
            RotationMatrix::from_rows([[1., 2., 3.], [4., 5., 6.], [7., 8., 9.]]),
            r
        );
    }

    #[test]
    fn identity_leaves_vectors_unchanged() {
        let v = Vector3::new(0.25, -1.5, 7.0);
        assert_eq!(RotationMatrix::identity().apply(&v), v);
    }

    #[test]
    fn zero_angles_are_identity() {
        let r = RotationMatrix::from_opk(0.0, 0.0, 0.0);
        assert_relative_eq!(*r.matrix(), Matrix3::identity());
        assert!(r.is_from_angles());
    }

    #[test]
    fn opk_follows_x_y_z_order() {
        let (omega, phi, kappa) = (0.1, 0.2, 0.3);
        let r = RotationMatrix::from_opk(omega, phi, kappa);
        let m = r.matrix();
        assert_relative_eq!(m[(0, 0)], phi.cos() * kappa.cos(), epsilon = 1e-12);
        assert_relative_eq!(m[(0, 1)], -phi.cos() * kappa.sin(), epsilon = 1e-12);
        assert_relative_eq!(m[(0, 2)], phi.sin(), epsilon = 1e-12);
        assert_relative_eq!(m[(2, 2)], omega.cos() * phi.cos(), epsilon = 1e-12);
        assert_eq!(r.source(), RotationSource::FromAngles { omega, phi, kappa });
    }

    #[test]
    fn kappa_turns_x_towards_y() {
        let r = RotationMatrix::from_opk_degrees(0.0, 0.0, 90.0);
        let v = r.apply(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn composition_matches_sequential_application() {
        let a = sample_rotation();
        let b = RotationMatrix::from_opk(0.05, -0.02, 1.1);
        let v = Vector3::new(5.2e-4, -7.9e-4, 0.0);

        let composed = a.compose(&b).apply(&v);
        let sequential = a.apply(&b.apply(&v));
        assert_relative_eq!(composed, sequential, epsilon = 1e-9);
        assert_eq!((a * b).source(), b.source());
    }

    #[test]
    fn coefficient_provenance_survives_composition() {
        let r = sample_rotation().compose(&RotationMatrix::identity());
        assert_eq!(r.source(), RotationSource::FromCoefficients);
    }
}
