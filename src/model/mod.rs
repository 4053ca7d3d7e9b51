pub mod dec_arc;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Order in which APPM visits mapping points. Serialized by name in
/// config and sequence files; the vendor API wants the integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderingStrategy {
    Declination,
    DeclinationEqualRa,
    DeclinationGraduatedRa,
    HourAngle,
}

impl OrderingStrategy {
    pub fn vendor_code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_codes_match_the_appm_strategy_list() {
        assert_eq!(OrderingStrategy::Declination.vendor_code(), 0);
        assert_eq!(OrderingStrategy::DeclinationEqualRa.vendor_code(), 1);
        assert_eq!(OrderingStrategy::DeclinationGraduatedRa.vendor_code(), 2);
        assert_eq!(OrderingStrategy::HourAngle.vendor_code(), 3);
    }

    #[test]
    fn strategies_deserialize_by_name() {
        let s: OrderingStrategy = serde_yaml::from_str("declination_equal_ra").unwrap();
        assert_eq!(s, OrderingStrategy::DeclinationEqualRa);
    }
}
