use super::{GeoreferenceError, GeoreferenceResult};
use nalgebra::{DMatrix, DVector};

/// Largest rotation term, relative to the scale on the same axis, still
/// treated as zero
const NORTH_UP_TOLERANCE: f64 = 1e-9;

/// Pixel position tied to a ground position (`x` longitude, `y` latitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundControlPoint {
    pub row: f64,
    pub col: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GroundControlPoint {
    pub fn new(row: f64, col: f64, x: f64, y: f64, z: f64) -> Self {
        Self { row, col, x, y, z }
    }
}

/// Pixel to map transform
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// From GDAL ordering `[c, a, b, f, d, e]`
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// Least squares fit through at least three control points that do not
    /// lie on one line.
    pub fn from_gcps(gcps: &[GroundControlPoint]) -> GeoreferenceResult<Self> {
        let n = gcps.len();
        if n < 3 {
            return Err(GeoreferenceError::SingularControlPoints(n));
        }
        if gcps
            .iter()
            .any(|p| ![p.row, p.col, p.x, p.y].iter().all(|v| v.is_finite()))
        {
            return Err(GeoreferenceError::InvalidInput(
                "Control point is not finite".into(),
            ));
        }

        let design = DMatrix::from_fn(n, 3, |i, j| match j {
            0 => gcps[i].col,
            1 => gcps[i].row,
            _ => 1.0,
        });
        let xs = DVector::from_iterator(n, gcps.iter().map(|p| p.x));
        let ys = DVector::from_iterator(n, gcps.iter().map(|p| p.y));

        let svd = design.svd(true, true);
        let tolerance = svd.singular_values.max() * 1e-12;
        if svd.rank(tolerance) < 3 {
            return Err(GeoreferenceError::SingularControlPoints(n));
        }

        let solve = |rhs: &DVector<f64>| {
            svd.solve(rhs, tolerance)
                .map_err(|_| GeoreferenceError::SingularControlPoints(n))
        };
        let x = solve(&xs)?;
        let y = solve(&ys)?;

        Ok(Self::new(x[0], x[1], x[2], y[0], y[1], y[2]))
    }

    /// Map `(col, row)` to `(x, y)`
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// GDAL geotransform `[c, a, b, f, d, e]`
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// No rotation or shear terms beyond solver noise
    pub fn is_north_up(&self) -> bool {
        self.b.abs() <= NORTH_UP_TOLERANCE * self.a.abs()
            && self.d.abs() <= NORTH_UP_TOLERANCE * self.e.abs()
    }

    /// 4×4 row major GeoTIFF ModelTransformation
    pub fn to_model_transformation(&self) -> [f64; 16] {
        #[rustfmt::skip]
        let matrix = [
            self.a, self.b, 0.0, self.c,
            self.d, self.e, 0.0, self.f,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        matrix
    }

    pub fn from_model_transformation(matrix: &[f64; 16]) -> Self {
        Self::new(matrix[0], matrix[1], matrix[3], matrix[4], matrix[5], matrix[7])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotated_transform() -> AffineTransform {
        AffineTransform::new(1.2e-7, 3.0e-8, -4.00875, -2.9e-8, -1.1e-7, 5.3604)
    }

    fn corner_gcps(transform: &AffineTransform, width: f64, height: f64) -> Vec<GroundControlPoint> {
        [(0.0, 0.0), (height, 0.0), (height, width), (0.0, width)]
            .into_iter()
            .map(|(row, col)| {
                let (x, y) = transform.apply(col, row);
                GroundControlPoint::new(row, col, x, y, 0.0)
            })
            .collect()
    }

    #[test]
    fn recovers_exact_transform_from_corners() {
        let expected = rotated_transform();
        let gcps = corner_gcps(&expected, 6000.0, 4000.0);
        let solved = AffineTransform::from_gcps(&gcps).unwrap();

        for gcp in &gcps {
            let (x, y) = solved.apply(gcp.col, gcp.row);
            assert_relative_eq!(x, gcp.x, epsilon = 1e-9);
            assert_relative_eq!(y, gcp.y, epsilon = 1e-9);
        }
        assert_relative_eq!(solved.a, expected.a, epsilon = 1e-12);
        assert_relative_eq!(solved.e, expected.e, epsilon = 1e-12);
        assert!(!solved.is_north_up());
    }

    #[test]
    fn three_points_are_enough() {
        let expected = AffineTransform::new(0.5, 0.0, 10.0, 0.0, -0.5, 20.0);
        let gcps = corner_gcps(&expected, 10.0, 10.0);
        let solved = AffineTransform::from_gcps(&gcps[..3]).unwrap();
        assert_relative_eq!(solved.c, 10.0, epsilon = 1e-9);
        assert_relative_eq!(solved.f, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_are_singular() {
        let gcps: Vec<_> = (0..4)
            .map(|i| GroundControlPoint::new(i as f64, i as f64, i as f64, 2.0 * i as f64, 0.0))
            .collect();
        assert_eq!(
            AffineTransform::from_gcps(&gcps),
            Err(GeoreferenceError::SingularControlPoints(4))
        );
        assert_eq!(
            AffineTransform::from_gcps(&gcps[..2]),
            Err(GeoreferenceError::SingularControlPoints(2))
        );
    }

    #[test]
    fn solver_noise_is_still_north_up() {
        let expected = AffineTransform::new(2.1e-7, 0.0, -4.00875, 0.0, -2.1e-7, 5.3604);
        let solved = AffineTransform::from_gcps(&corner_gcps(&expected, 120.0, 80.0)).unwrap();
        assert!(solved.is_north_up());

        let noisy = AffineTransform::new(2.1e-7, -1.39e-17, -4.0, -2.08e-17, -2.1e-7, 5.3);
        assert!(noisy.is_north_up());

        let sheared = AffineTransform::new(2.1e-7, 1e-12, -4.0, 0.0, -2.1e-7, 5.3);
        assert!(!sheared.is_north_up());
    }

    #[test]
    fn gdal_and_model_orderings() {
        let transform = rotated_transform();
        assert_eq!(AffineTransform::from_gdal(transform.to_gdal()), transform);
        let model = transform.to_model_transformation();
        assert_eq!(model[3], transform.c);
        assert_eq!(model[7], transform.f);
        assert_eq!(model[15], 1.0);
        assert_eq!(AffineTransform::from_model_transformation(&model), transform);
    }
}
