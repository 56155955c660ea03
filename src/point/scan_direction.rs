/// The direction the scanner mirror was traveling at the time of the output pulse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanDirection {
    /// The scan is moving from the right to the left, a cleared bit.
    #[default]
    RightToLeft,
    /// The scan is moving from the left to the right, a set bit.
    LeftToRight,
}

impl From<bool> for ScanDirection {
    fn from(is_set: bool) -> ScanDirection {
        if is_set {
            ScanDirection::LeftToRight
        } else {
            ScanDirection::RightToLeft
        }
    }
}

impl From<ScanDirection> for bool {
    fn from(scan_direction: ScanDirection) -> bool {
        scan_direction == ScanDirection::LeftToRight
    }
}
