/// ASPRS classification table.
///
/// Legacy point formats (zero through five) have no overlap bit and instead use classification
/// 12 for overlap points. On read, such points come back as `Unclassified` with
/// [Point::is_overlap](crate::Point::is_overlap) set. On write to a legacy format, an unclassified
/// overlap point is stored as class 12, and any other overlap point or a point with class 12 itself
/// is an [Error::OverlapClassification](crate::Error::OverlapClassification). Extended formats have
/// a real overlap bit and keep 12 as an ordinary code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Classification {
    #[default]
    CreatedNeverClassified,
    Unclassified,
    Ground,
    LowVegetation,
    MediumVegetation,
    HighVegetation,
    Building,
    LowPoint,
    ModelKeyPoint,
    Water,
    Rail,
    RoadSurface,
    WireGuard,
    WireConductor,
    TransmissionTower,
    WireStructureConnector,
    BridgeDeck,
    HighNoise,
    Reserved(u8),
    UserDefinable(u8),
}

/// The legacy classification code for overlap points.
pub(crate) const OVERLAP_CLASSIFICATION_CODE: u8 = 12;

impl From<u8> for Classification {
    fn from(n: u8) -> Classification {
        match n {
            0 => Classification::CreatedNeverClassified,
            1 => Classification::Unclassified,
            2 => Classification::Ground,
            3 => Classification::LowVegetation,
            4 => Classification::MediumVegetation,
            5 => Classification::HighVegetation,
            6 => Classification::Building,
            7 => Classification::LowPoint,
            8 => Classification::ModelKeyPoint,
            9 => Classification::Water,
            10 => Classification::Rail,
            11 => Classification::RoadSurface,
            13 => Classification::WireGuard,
            14 => Classification::WireConductor,
            15 => Classification::TransmissionTower,
            16 => Classification::WireStructureConnector,
            17 => Classification::BridgeDeck,
            18 => Classification::HighNoise,
            12 | 19..=63 => Classification::Reserved(n),
            64..=255 => Classification::UserDefinable(n),
        }
    }
}

impl From<Classification> for u8 {
    fn from(classification: Classification) -> u8 {
        match classification {
            Classification::CreatedNeverClassified => 0,
            Classification::Unclassified => 1,
            Classification::Ground => 2,
            Classification::LowVegetation => 3,
            Classification::MediumVegetation => 4,
            Classification::HighVegetation => 5,
            Classification::Building => 6,
            Classification::LowPoint => 7,
            Classification::ModelKeyPoint => 8,
            Classification::Water => 9,
            Classification::Rail => 10,
            Classification::RoadSurface => 11,
            Classification::WireGuard => 13,
            Classification::WireConductor => 14,
            Classification::TransmissionTower => 15,
            Classification::WireStructureConnector => 16,
            Classification::BridgeDeck => 17,
            Classification::HighNoise => 18,
            Classification::Reserved(n) | Classification::UserDefinable(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_round_trips() {
        for n in 0..=255u8 {
            assert_eq!(n, u8::from(Classification::from(n)));
        }
    }

    #[test]
    fn ranges() {
        assert_eq!(Classification::Reserved(19), Classification::from(19));
        assert_eq!(Classification::Reserved(63), Classification::from(63));
        assert_eq!(Classification::UserDefinable(64), Classification::from(64));
    }
}
