use crate::{Error, Result, Vector};
use num_traits::ToPrimitive;
use std::fmt;

/// A scale and an offset that maps stored integers onto world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// The scale.
    pub scale: f64,
    /// The offset.
    pub offset: f64,
}

impl Transform {
    /// Applies this transform to an i32, returning a float.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Transform;
    /// let transform = Transform { scale: 2., offset: 1. };
    /// assert_eq!(3., transform.direct(1));
    /// ```
    pub fn direct(&self, n: i32) -> f64 {
        self.offset + f64::from(n) * self.scale
    }

    /// Applies the inverse transform and rounds to the nearest integer.
    ///
    /// Returns an error if the result can't be represented as an i32.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::Transform;
    /// let transform = Transform { scale: 2., offset: 1. };
    /// assert_eq!(1, transform.inverse(2.9).unwrap());
    /// assert!(transform.inverse(1e12).is_err());
    /// ```
    pub fn inverse(&self, n: f64) -> Result<i32> {
        ((n - self.offset) / self.scale)
            .round()
            .to_i32()
            .ok_or(Error::InverseTransform {
                n,
                transform: *self,
            })
    }
}

impl Default for Transform {
    fn default() -> Transform {
        Transform {
            scale: 0.001,
            offset: 0.,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{} * x + {}`", self.scale, self.offset)
    }
}

/// Per-axis transforms used to quantize coordinates.
///
/// Every scale is non-zero, which [Quantization::new] enforces.
///
/// ```
/// use las_stream::{Quantization, Transform, Vector};
///
/// let transform = Transform { scale: 0.01, offset: 0. };
/// let quantization = Quantization::new(Vector::new(transform, transform, transform)).unwrap();
/// let stored = quantization.to_stored(Vector::new(12.345, 67.891, 3.)).unwrap();
/// // 12.345 / 0.01 is exactly 1234.5, and halves round away from zero
/// assert_eq!(Vector::new(1235, 6789, 300), stored);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quantization {
    transforms: Vector<Transform>,
}

impl Quantization {
    /// Creates a quantization context, checking that no scale is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use las_stream::{Quantization, Transform, Vector};
    /// let zero = Transform { scale: 0., offset: 0. };
    /// assert!(Quantization::new(Vector::new(zero, zero, zero)).is_err());
    /// ```
    pub fn new(transforms: Vector<Transform>) -> Result<Quantization> {
        for (axis, transform) in [
            ("x", transforms.x),
            ("y", transforms.y),
            ("z", transforms.z),
        ] {
            if transform.scale == 0. {
                return Err(Error::ZeroScale { axis });
            }
        }
        Ok(Quantization { transforms })
    }

    /// Returns the per-axis transforms.
    pub fn transforms(&self) -> &Vector<Transform> {
        &self.transforms
    }

    /// Converts stored integers into world coordinates.
    pub fn to_world(&self, stored: Vector<i32>) -> Vector<f64> {
        Vector {
            x: self.transforms.x.direct(stored.x),
            y: self.transforms.y.direct(stored.y),
            z: self.transforms.z.direct(stored.z),
        }
    }

    /// Converts world coordinates into stored integers.
    pub fn to_stored(&self, world: Vector<f64>) -> Result<Vector<i32>> {
        Ok(Vector {
            x: self.transforms.x.inverse(world.x)?,
            y: self.transforms.y.inverse(world.y)?,
            z: self.transforms.z.inverse(world.z)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantization(scale: f64, offset: f64) -> Quantization {
        let transform = Transform { scale, offset };
        Quantization::new(Vector::new(transform, transform, transform)).unwrap()
    }

    #[test]
    fn too_large() {
        let transform = Transform::default();
        assert!(transform.inverse(f64::from(i32::MAX) * 0.001 + 1.).is_err());
        assert!(transform.inverse(f64::from(i32::MIN) * 0.001 - 1.).is_err());
        assert!(transform.inverse(f64::NAN).is_err());
    }

    #[test]
    fn round_trip_within_half_scale() {
        let quantization = quantization(0.01, 100.);
        let world = Vector::new(123.456_7, -98.765_4, 0.004_9);
        let back = quantization.to_world(quantization.to_stored(world).unwrap());
        assert!((back.x - world.x).abs() <= 0.005);
        assert!((back.y - world.y).abs() <= 0.005);
        assert!((back.z - world.z).abs() <= 0.005);
    }

    #[test]
    fn halves_round_away_from_zero() {
        let halves = quantization(0.5, 0.);
        let stored = halves.to_stored(Vector::new(1.25, -1.25, 0.)).unwrap();
        assert_eq!(Vector::new(3, -3, 0), stored);

        let centimeters = quantization(0.01, 0.);
        let stored = centimeters.to_stored(Vector::new(12.345, 0., 0.)).unwrap();
        assert_eq!(1235, stored.x);
    }

    #[test]
    fn zero_scale() {
        let good = Transform::default();
        let bad = Transform {
            scale: 0.,
            offset: 1.,
        };
        assert!(matches!(
            Quantization::new(Vector::new(good, good, bad)),
            Err(Error::ZeroScale { axis: "z" })
        ));
    }
}
