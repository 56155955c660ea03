use crate::Vector;

/// Minimum and maximum bounds in three dimensions.
///
/// Empty bounds are filled with NaN. The first coordinate grown into empty bounds sets both the
/// minimum and the maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// The minimum values.
    pub min: Vector<f64>,

    /// The maximum values.
    pub max: Vector<f64>,
}

impl Bounds {
    /// Grows the bounds to encompass this coordinate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use las_stream::{Bounds, Vector};
    /// let mut bounds = Bounds::default();
    /// assert!(bounds.is_empty());
    /// bounds.grow(Vector::new(1., 2., 3.));
    /// assert_eq!(1., bounds.min.x);
    /// assert_eq!(1., bounds.max.x);
    /// ```
    pub fn grow(&mut self, coordinate: Vector<f64>) {
        // f64::min and f64::max return the other operand when one side is NaN.
        self.min.x = self.min.x.min(coordinate.x);
        self.min.y = self.min.y.min(coordinate.y);
        self.min.z = self.min.z.min(coordinate.z);
        self.max.x = self.max.x.max(coordinate.x);
        self.max.y = self.max.y.max(coordinate.y);
        self.max.z = self.max.z.max(coordinate.z);
    }

    /// Returns true if nothing has been grown into these bounds.
    pub fn is_empty(&self) -> bool {
        self.min.x.is_nan()
            || self.min.y.is_nan()
            || self.min.z.is_nan()
            || self.max.x.is_nan()
            || self.max.y.is_nan()
            || self.max.z.is_nan()
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds {
            min: Vector::new(f64::NAN, f64::NAN, f64::NAN),
            max: Vector::new(f64::NAN, f64::NAN, f64::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow() {
        let mut bounds = Bounds::default();
        bounds.grow(Vector::new(1., 2., 3.));
        assert_eq!(Vector::new(1., 2., 3.), bounds.min);
        assert_eq!(Vector::new(1., 2., 3.), bounds.max);
        bounds.grow(Vector::new(0., 1., 2.));
        assert_eq!(Vector::new(0., 1., 2.), bounds.min);
        assert_eq!(Vector::new(1., 2., 3.), bounds.max);
        bounds.grow(Vector::new(2., 3., 4.));
        assert_eq!(Vector::new(0., 1., 2.), bounds.min);
        assert_eq!(Vector::new(2., 3., 4.), bounds.max);
        assert!(!bounds.is_empty());
    }

    #[test]
    fn empty_is_nan() {
        let bounds = Bounds::default();
        assert!(bounds.is_empty());
        assert!(bounds.min.x.is_nan());
        assert!(bounds.max.z.is_nan());
    }
}
