use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Deserialize;

/// Observer location in degrees, latitude north-positive, longitude
/// east-positive.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Site {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Equatorial target coordinates: RA in hours (0..24), Dec in degrees.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Target {
    pub ra_hours: f64,
    pub dec_deg: f64,
}

pub fn julian_date(t: DateTime<Utc>) -> f64 {
    t.timestamp() as f64 / 86_400.0 + 2_440_587.5
}

/// Greenwich mean sidereal time in hours, 0..24.
pub fn gmst_hours(t: DateTime<Utc>) -> f64 {
    let d = julian_date(t) - 2_451_545.0;
    (18.697_374_558 + 24.065_709_824_419_08 * d).rem_euclid(24.0)
}

/// Local mean sidereal time in hours, 0..24.
pub fn local_sidereal_time_hours(t: DateTime<Utc>, longitude_deg: f64) -> f64 {
    (gmst_hours(t) + longitude_deg / 15.0).rem_euclid(24.0)
}

/// Hour angle of a target relative to the local meridian, normalized to
/// -12..+12 hours rather than 0..24.
pub fn hour_angle_hours(lst_hours: f64, ra_hours: f64) -> f64 {
    ((lst_hours - ra_hours) + 36.0).rem_euclid(24.0) - 12.0
}

pub fn target_hour_angle(target: &Target, site: &Site, t: DateTime<Utc>) -> f64 {
    hour_angle_hours(local_sidereal_time_hours(t, site.longitude_deg), target.ra_hours)
}

// Sunrise altitude accounting for refraction and the solar radius.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Next local sunrise after `from`, from the NOAA low-accuracy solar
/// position. None at latitudes currently in polar day or night.
pub fn next_sunrise(site: &Site, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    for day in 0..=2 {
        let date = (from + Duration::days(day)).date_naive();
        if let Some(sunrise) = sunrise_utc(site, date.year(), date.ordinal()) {
            if sunrise > from {
                return Some(sunrise);
            }
        }
    }
    None
}

fn sunrise_utc(site: &Site, year: i32, day_of_year: u32) -> Option<DateTime<Utc>> {
    let gamma = 2.0 * std::f64::consts::PI / 365.0 * (day_of_year as f64 - 1.0);

    // Equation of time in minutes and solar declination in radians.
    let eqtime = 229.18
        * (0.000_075 + 0.001_868 * gamma.cos()
            - 0.032_077 * gamma.sin()
            - 0.014_615 * (2.0 * gamma).cos()
            - 0.040_849 * (2.0 * gamma).sin());
    let decl = 0.006_918 - 0.399_912 * gamma.cos() + 0.070_257 * gamma.sin()
        - 0.006_758 * (2.0 * gamma).cos()
        + 0.000_907 * (2.0 * gamma).sin()
        - 0.002_697 * (3.0 * gamma).cos()
        + 0.001_48 * (3.0 * gamma).sin();

    let lat = site.latitude_deg.to_radians();
    let cos_ha = SUNRISE_ZENITH_DEG.to_radians().cos() / (lat.cos() * decl.cos())
        - lat.tan() * decl.tan();
    if !(-1.0..=1.0).contains(&cos_ha) {
        return None;
    }

    let ha_deg = cos_ha.acos().to_degrees();
    let minutes = 720.0 - 4.0 * (site.longitude_deg + ha_deg) - eqtime;
    let base = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()?
        + Duration::days(day_of_year as i64 - 1);
    Some(base + Duration::seconds((minutes * 60.0).round() as i64))
}

/// Formats a declination as a raw protocol set-target command,
/// `:Sd+DD*MM:SS.S`.
pub fn format_dec_command(dec_deg: f64) -> String {
    let sign = if dec_deg < 0.0 { '-' } else { '+' };
    let total = (dec_deg.abs() * 36_000.0).round() as i64;
    let d = total / 36_000;
    let m = (total / 600) % 60;
    let s = (total % 600) as f64 / 10.0;
    format!(":Sd{}{:02}*{:02}:{:04.1}", sign, d, m, s)
}
