use chrono::{DateTime, Utc};

use crate::astro::{self, Site, Target};
use crate::config::DecArcSettings;
use crate::model::OrderingStrategy;

/// Derived inputs for a dec-arc mapping run: a rectangular window in
/// (hour angle, declination) space plus point spacing and ordering.
/// Built once per run and consumed to fill the APPM measurement
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DecArcParameters {
    pub target_dec: i32,
    pub north_dec_limit: i32,
    pub south_dec_limit: i32,
    pub dec_offset: i32,
    pub dec_spacing: i32,
    pub ra_spacing: i32,
    pub target_ha: f64,
    pub east_ha_limit: f64,
    pub west_ha_limit: f64,
    pub ordering_strategy: OrderingStrategy,
}

/// Calculates the mapping window for a target.
///
/// The hour-angle window runs from the target's current position minus
/// the lead-in to its position at the next sunrise plus the tail, both
/// clamped to the mount's -12..+12h range. `full_arc` maps the entire
/// arc instead. Declination arcs are centered on the rounded target
/// declination and clamped to +/-85 degrees.
pub fn calculate(
    target: &Target,
    site: &Site,
    settings: &DecArcSettings,
    full_arc: bool,
    now: DateTime<Utc>,
) -> DecArcParameters {
    let target_ha = astro::target_hour_angle(target, site, now);

    let east_ha_limit = if full_arc {
        -12.0
    } else {
        round2((target_ha - settings.lead_in_hours).max(-12.0))
    };

    let west_ha_limit = if full_arc {
        12.0
    } else {
        match astro::next_sunrise(site, now) {
            Some(sunrise) => {
                let sunrise_ha = astro::target_hour_angle(target, site, sunrise);
                round2((sunrise_ha + settings.tail_hours).min(12.0))
            }
            // No upcoming sunrise at this latitude; map out to the limit.
            None => 12.0,
        }
    };

    let target_dec = target.dec_deg.round() as i32;
    // A spacing below 1 would leave the offset modulo undefined.
    let mut dec_spacing = settings.dec_spacing.max(1);
    let (north, south, offset) = if settings.arc_quantity <= 1 {
        dec_spacing = 1;
        (target_dec, target_dec, 0)
    } else {
        let arcs = i32::try_from(settings.arc_quantity).unwrap_or(i32::MAX);
        let span = (arcs - 1).saturating_mul(dec_spacing);
        let south = ((target.dec_deg - (span / 2) as f64).round() as i32).max(-85);
        let north = south.saturating_add(span).min(85);
        (north, south, south % dec_spacing)
    };

    let polar = 90 - target_dec.abs() <= settings.polar_proximity_limit_deg;
    let ordering_strategy = if polar {
        settings.polar_ordering_strategy
    } else {
        settings.ordering_strategy
    };

    DecArcParameters {
        target_dec,
        north_dec_limit: north,
        south_dec_limit: south,
        dec_offset: offset,
        dec_spacing,
        ra_spacing: settings.ra_spacing,
        target_ha,
        east_ha_limit,
        west_ha_limit,
        ordering_strategy,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site() -> Site {
        Site { latitude_deg: 40.0, longitude_deg: -105.0 }
    }

    fn settings() -> DecArcSettings {
        DecArcSettings {
            arc_quantity: 3,
            dec_spacing: 2,
            ra_spacing: 4,
            lead_in_hours: 0.5,
            tail_hours: 0.25,
            ordering_strategy: OrderingStrategy::Declination,
            polar_ordering_strategy: OrderingStrategy::DeclinationEqualRa,
            polar_proximity_limit_deg: 35,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 15, 4, 0, 0).unwrap()
    }

    fn calc(dec_deg: f64, s: &DecArcSettings) -> DecArcParameters {
        let target = Target { ra_hours: 5.5, dec_deg };
        calculate(&target, &site(), s, false, now())
    }

    #[test]
    fn dec_limits_bracket_the_target() {
        for dec in [-85.0, -42.3, 0.0, 17.8, 54.5, 85.0] {
            let p = calc(dec, &settings());
            let rounded = dec.round() as i32;
            assert!(p.south_dec_limit <= rounded && rounded <= p.north_dec_limit, "dec={dec}");
            assert!((-85..=85).contains(&p.south_dec_limit));
            assert!((-85..=85).contains(&p.north_dec_limit));
        }
    }

    #[test]
    fn ha_limits_stay_in_range() {
        let mut s = settings();
        s.lead_in_hours = 30.0;
        s.tail_hours = 30.0;
        let p = calc(10.0, &s);
        assert_eq!(p.east_ha_limit, -12.0);
        assert_eq!(p.west_ha_limit, 12.0);

        let p = calc(10.0, &settings());
        assert!((-12.0..=12.0).contains(&p.east_ha_limit));
        assert!((-12.0..=12.0).contains(&p.west_ha_limit));
        assert!(p.east_ha_limit <= p.target_ha);
    }

    #[test]
    fn single_arc_degenerates_to_the_target_declination() {
        let mut s = settings();
        s.arc_quantity = 1;
        let p = calc(33.4, &s);
        assert_eq!(p.north_dec_limit, 33);
        assert_eq!(p.south_dec_limit, 33);
        assert_eq!(p.dec_spacing, 1);
        assert_eq!(p.dec_offset, 0);
    }

    #[test]
    fn offset_is_the_south_limit_remainder() {
        let mut s = settings();
        s.arc_quantity = 4;
        s.dec_spacing = 5;
        let p = calc(22.0, &s);
        // span 15, half-span truncates to 7: south = 15, north = 30.
        assert_eq!(p.south_dec_limit, 15);
        assert_eq!(p.north_dec_limit, 30);
        assert_eq!(p.dec_offset, 0);

        let p = calc(24.0, &s);
        assert_eq!(p.south_dec_limit, 17);
        assert_eq!(p.dec_offset, 17 % 5);
    }

    #[test]
    fn southern_offset_keeps_the_dividend_sign() {
        let mut s = settings();
        s.arc_quantity = 4;
        s.dec_spacing = 5;
        let p = calc(-24.0, &s);
        assert_eq!(p.south_dec_limit, -31);
        assert_eq!(p.dec_offset, -1);
    }

    #[test]
    fn zero_spacing_is_clamped_instead_of_dividing() {
        let mut s = settings();
        s.arc_quantity = 2;
        s.dec_spacing = 0;
        let p = calc(22.0, &s);
        assert_eq!(p.dec_spacing, 1);
        assert_eq!(p.south_dec_limit, 22);
        assert_eq!(p.north_dec_limit, 23);
        assert_eq!(p.dec_offset, 0);
    }

    #[test]
    fn absurd_arc_quantity_saturates_at_the_dec_clamps() {
        let mut s = settings();
        s.arc_quantity = u32::MAX;
        let p = calc(0.0, &s);
        assert_eq!(p.south_dec_limit, -85);
        assert_eq!(p.north_dec_limit, 85);
    }

    #[test]
    fn limits_clamp_near_the_pole() {
        let mut s = settings();
        s.arc_quantity = 10;
        s.dec_spacing = 2;
        let p = calc(84.0, &s);
        assert_eq!(p.north_dec_limit, 85);
        assert!(p.south_dec_limit >= -85);
    }

    #[test]
    fn polar_strategy_substitution_is_exact_at_the_threshold() {
        let s = settings();
        // 90 - 55 = 35 <= 35: polar strategy applies.
        assert_eq!(calc(55.0, &s).ordering_strategy, OrderingStrategy::DeclinationEqualRa);
        assert_eq!(calc(-55.0, &s).ordering_strategy, OrderingStrategy::DeclinationEqualRa);
        // 90 - 54 = 36 > 35: normal strategy.
        assert_eq!(calc(54.0, &s).ordering_strategy, OrderingStrategy::Declination);
    }

    #[test]
    fn full_arc_spans_the_whole_hour_angle_range() {
        let target = Target { ra_hours: 5.5, dec_deg: 10.0 };
        let p = calculate(&target, &site(), &settings(), true, now());
        assert_eq!(p.east_ha_limit, -12.0);
        assert_eq!(p.west_ha_limit, 12.0);
    }
}
