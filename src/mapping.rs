//! Numeric codes expected by the district's legacy incident register.
//! Unknown values map to 99.

use crate::models::{BodyRegion, Frequency, SafetyThermometer};

pub const UNKNOWN_CODE: i32 = 99;

pub fn location_code(location_id: &str) -> i32 {
    match location_id {
        "playground" => 1,
        "classroom" => 2,
        "library" => 3,
        "gymnasium" | "gym" => 4,
        "cafeteria" | "canteen" => 5,
        "bus" => 6,
        _ => UNKNOWN_CODE,
    }
}

pub fn frequency_code(frequency: Frequency) -> i32 {
    match frequency {
        Frequency::Once => 1,
        Frequency::Sometimes => 2,
        Frequency::Often | Frequency::Always => 3,
    }
}

pub fn safety_code(safety: &SafetyThermometer) -> i32 {
    i32::from(safety.level)
}

pub fn emotion_code(level: u8) -> i32 {
    i32::from(level)
}

/// The register only knows body-part families, not sides.
pub fn body_part_code(region: BodyRegion) -> i32 {
    match region {
        BodyRegion::Head => 1,
        BodyRegion::Chest => 18,
        BodyRegion::LeftArm | BodyRegion::RightArm => 27,
        BodyRegion::LeftHand | BodyRegion::RightHand => 30,
        BodyRegion::Stomach => 40,
        BodyRegion::LeftLeg | BodyRegion::RightLeg => 48,
        BodyRegion::LeftFoot | BodyRegion::RightFoot => 52,
        BodyRegion::Neck | BodyRegion::Hips => UNKNOWN_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_map_aliases_together() {
        assert_eq!(location_code("gym"), location_code("gymnasium"));
        assert_eq!(location_code("canteen"), 5);
        assert_eq!(location_code("hallway"), UNKNOWN_CODE);
    }

    #[test]
    fn often_and_always_share_a_code() {
        assert_eq!(frequency_code(Frequency::Often), frequency_code(Frequency::Always));
        assert_eq!(frequency_code(Frequency::Once), 1);
    }

    #[test]
    fn sides_collapse_to_one_family() {
        assert_eq!(body_part_code(BodyRegion::LeftArm), 27);
        assert_eq!(body_part_code(BodyRegion::RightArm), 27);
        assert_eq!(body_part_code(BodyRegion::Hips), UNKNOWN_CODE);
    }

    #[test]
    fn safety_code_is_the_level() {
        let safety = SafetyThermometer::from_level(4).unwrap();
        assert_eq!(safety_code(&safety), 4);
    }
}
