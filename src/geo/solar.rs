//! Sunset and candle lighting calculations.
//!
//! Sunset is found with the classic iterative approximation published in the
//! Almanac for Computers: day of year → mean anomaly → true longitude → right
//! ascension and declination → local hour angle at the sunset zenith. The result
//! is typically within one or two minutes of a full ephemeris calculation.
//! Its systematic errors (including the day-of-year formula's behaviour around
//! month boundaries) are kept as they are so that results stay reproducible
//! against the same fixtures.
//!
//! All angles are handled in degrees and only converted to radians at the
//! trigonometric call.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Weekday};

use super::{Coordinate, SolarError};
use crate::constants::*;

/// Sunset and the alert instants derived from it for one reference date.
///
/// Only constructed through [`SolarTimeCalculator::shabbat_times`], which
/// guarantees `one_hour_before < candle_lighting < sunset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShabbatTimes {
    reference_date: NaiveDate,
    sunset: DateTime<FixedOffset>,
    candle_lighting: DateTime<FixedOffset>,
    one_hour_before: DateTime<FixedOffset>,
}

impl ShabbatTimes {
    /// The civil date sunset was computed for, normally a Friday.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn sunset(&self) -> DateTime<FixedOffset> {
        self.sunset
    }

    pub fn candle_lighting(&self) -> DateTime<FixedOffset> {
        self.candle_lighting
    }

    pub fn one_hour_before(&self) -> DateTime<FixedOffset> {
        self.one_hour_before
    }
}

/// Maps (date, coordinate, UTC offset) to [`ShabbatTimes`].
///
/// Pure and stateless apart from the configured candle lighting offset, so a
/// single instance can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarTimeCalculator {
    candle_lighting_offset: Duration,
}

impl Default for SolarTimeCalculator {
    fn default() -> Self {
        Self {
            candle_lighting_offset: Duration::minutes(DEFAULT_CANDLE_LIGHTING_OFFSET as i64),
        }
    }
}

impl SolarTimeCalculator {
    /// Create a calculator lighting candles `offset_minutes` before sunset.
    ///
    /// Offsets outside `MINIMUM_CANDLE_LIGHTING_OFFSET..=MAXIMUM_CANDLE_LIGHTING_OFFSET`
    /// are rejected with [`SolarError::InvalidOffset`]: zero would put candle
    /// lighting on sunset itself.
    pub fn new(offset_minutes: u64) -> Result<Self, SolarError> {
        if !(MINIMUM_CANDLE_LIGHTING_OFFSET..=MAXIMUM_CANDLE_LIGHTING_OFFSET)
            .contains(&offset_minutes)
        {
            return Err(SolarError::InvalidOffset {
                minutes: offset_minutes,
                min: MINIMUM_CANDLE_LIGHTING_OFFSET,
                max: MAXIMUM_CANDLE_LIGHTING_OFFSET,
            });
        }
        Ok(Self {
            candle_lighting_offset: Duration::minutes(offset_minutes as i64),
        })
    }

    pub fn candle_lighting_offset(&self) -> Duration {
        self.candle_lighting_offset
    }

    /// Local sunset for `date`, see [`calculate_sunset`].
    pub fn sunset(
        &self,
        date: NaiveDate,
        coordinate: Coordinate,
        utc_offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, SolarError> {
        calculate_sunset(date, coordinate, utc_offset)
    }

    /// Sunset, candle lighting and the one-hour reminder for `date`.
    ///
    /// # Arguments
    /// * `date` - Reference date, usually from [`next_friday`]
    /// * `coordinate` - Observer location
    /// * `utc_offset` - Offset of the local zone on `date`. It must match the
    ///   zone the caller displays times in, otherwise the wall-clock times are
    ///   silently shifted by the difference.
    ///
    /// # Returns
    /// * `Ok(ShabbatTimes)` - All three instants on the reference date
    /// * `Err(SolarError::NoSolution)` - Polar day or night, no sunset exists
    pub fn shabbat_times(
        &self,
        date: NaiveDate,
        coordinate: Coordinate,
        utc_offset: FixedOffset,
    ) -> Result<ShabbatTimes, SolarError> {
        let sunset = calculate_sunset(date, coordinate, utc_offset)?;
        let candle_lighting = sunset - self.candle_lighting_offset;
        let one_hour_before = candle_lighting - Duration::minutes(REMINDER_LEAD_MINUTES);

        Ok(ShabbatTimes {
            reference_date: date,
            sunset,
            candle_lighting,
            one_hour_before,
        })
    }
}

/// Compute local sunset on `date`, rounded to the minute.
///
/// The UTC sunset hour is shifted by `utc_offset`, wrapped into a single day
/// and attached to `date` itself. A rounded minute of 60 carries into the next
/// hour (and past midnight into the next day).
pub fn calculate_sunset(
    date: NaiveDate,
    coordinate: Coordinate,
    utc_offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, SolarError> {
    let ut = sunset_utc_hours(date, coordinate)?;
    let offset_hours = utc_offset.local_minus_utc() as f64 / 3600.0;
    let local_hours = normalize_hours(ut + offset_hours);

    let local =
        date.and_time(NaiveTime::MIN) + Duration::minutes(local_minutes_of_day(local_hours));
    let utc = local - Duration::seconds(utc_offset.local_minus_utc() as i64);

    Ok(DateTime::from_naive_utc_and_offset(utc, utc_offset))
}

/// Sunset as fractional UTC hours of the day, in `[0, 24)`.
pub fn sunset_utc_hours(date: NaiveDate, coordinate: Coordinate) -> Result<f64, SolarError> {
    let latitude = coordinate.latitude();
    let lng_hour = coordinate.longitude() / 15.0;

    let t = day_of_year(date) as f64 + (SUNSET_APPROX_HOUR - lng_hour) / 24.0;

    // Sun's mean anomaly and true longitude
    let mean_anomaly = MEAN_ANOMALY_RATE * t - MEAN_ANOMALY_OFFSET;
    let true_longitude = normalize_degrees(
        mean_anomaly
            + ECCENTRICITY_TERM_1 * sin_deg(mean_anomaly)
            + ECCENTRICITY_TERM_2 * sin_deg(2.0 * mean_anomaly)
            + PERIHELION_LONGITUDE,
    );

    let right_ascension = right_ascension_hours(true_longitude);

    let sin_dec = DECLINATION_FACTOR * sin_deg(true_longitude);
    let cos_dec = sin_dec.asin().cos();

    let cos_h =
        (cos_deg(SUNSET_ZENITH) - sin_dec * sin_deg(latitude)) / (cos_dec * cos_deg(latitude));

    // Below -1 the sun stays up all day, above 1 it never rises. At the poles
    // cos(lat) is ~0 and the ratio blows up or turns NaN, rejected the same way.
    if !(-1.0..=1.0).contains(&cos_h) {
        return Err(SolarError::NoSolution { date, latitude });
    }

    let hour_angle = cos_h.acos().to_degrees() / 15.0;
    let local_mean_time = hour_angle + right_ascension - SIDEREAL_RATE * t - SIDEREAL_OFFSET;

    Ok(normalize_hours(local_mean_time - lng_hour))
}

/// Ordinal day approximation `floor(275m/9) - N3·floor((m+9)/12) + d - 30`.
///
/// `N3` is 1 in years divisible by four and 2 otherwise.
pub fn day_of_year(date: NaiveDate) -> i64 {
    let year = date.year() as i64;
    let month = date.month() as i64;
    let day = date.day() as i64;

    let n1 = (275 * month).div_euclid(9);
    let n2 = (month + 9).div_euclid(12);
    let n3 = 1 + (year - 4 * year.div_euclid(4) + 2).div_euclid(3);

    n1 - n2 * n3 + day - 30
}

/// The next Friday on or after `today`.
///
/// Returns `today` itself on a Friday, so repeated calls within one calendar
/// day always agree.
pub fn next_friday(today: NaiveDate) -> NaiveDate {
    let today_index = today.weekday().num_days_from_monday() as i64;
    let friday_index = Weekday::Fri.num_days_from_monday() as i64;
    today + Duration::days((friday_index - today_index).rem_euclid(7))
}

/// Render an instant as `HH:MM` in its own offset.
pub fn format_clock_time(instant: &DateTime<FixedOffset>) -> String {
    instant.format("%H:%M").to_string()
}

fn right_ascension_hours(true_longitude: f64) -> f64 {
    let ra = normalize_degrees(
        (RIGHT_ASCENSION_FACTOR * tan_deg(true_longitude))
            .atan()
            .to_degrees(),
    );

    // Right ascension must sit in the same quadrant as the true longitude
    let l_quadrant = (true_longitude / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;

    (ra + (l_quadrant - ra_quadrant)) / 15.0
}

/// Whole minutes since local midnight for fractional hours in `[0, 24)`.
fn local_minutes_of_day(local_hours: f64) -> i64 {
    let hours = local_hours.floor();
    let minutes = ((local_hours - hours) * 60.0).round();
    (hours * 60.0 + minutes) as i64
}

fn normalize_degrees(value: f64) -> f64 {
    ((value % 360.0) + 360.0) % 360.0
}

fn normalize_hours(value: f64) -> f64 {
    ((value % 24.0) + 24.0) % 24.0
}

fn sin_deg(degrees: f64) -> f64 {
    degrees.to_radians().sin()
}

fn cos_deg(degrees: f64) -> f64 {
    degrees.to_radians().cos()
}

fn tan_deg(degrees: f64) -> f64 {
    degrees.to_radians().tan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use chrono::{TimeZone, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    fn jerusalem() -> Coordinate {
        Coordinate::new(TEST_JERUSALEM_LAT, TEST_JERUSALEM_LON).unwrap()
    }

    #[test]
    fn test_day_of_year_approximation() {
        assert_eq!(day_of_year(date(2025, 1, 3)), 3);
        assert_eq!(day_of_year(date(2025, 3, 14)), 73);
        assert_eq!(day_of_year(date(2025, 6, 20)), 171);
        assert_eq!(day_of_year(date(2024, 6, 21)), 173);
        assert_eq!(day_of_year(date(2024, 12, 20)), 355);
        assert_eq!(day_of_year(date(2026, 10, 23)), 296);
    }

    #[test]
    fn test_normalization_handles_negative_values() {
        assert_eq!(normalize_degrees(-30.0), 330.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_hours(-1.5), 22.5);
        assert_eq!(normalize_hours(25.0), 1.0);
    }

    #[test]
    fn test_local_minutes_rounding() {
        assert_eq!(local_minutes_of_day(19.5), 19 * 60 + 30);
        assert_eq!(local_minutes_of_day(19.7968), 19 * 60 + 48);
        // 59.994 minutes rounds up into the next hour
        assert_eq!(local_minutes_of_day(19.9999), 20 * 60);
        assert_eq!(local_minutes_of_day(23.9999), 24 * 60);
    }

    #[test]
    fn test_jerusalem_summer_solstice() {
        // Almanac: 19:47 IDT on 2024-06-21
        let sunset = calculate_sunset(date(2024, 6, 21), jerusalem(), hours(3)).unwrap();
        assert_eq!(sunset.date_naive(), date(2024, 6, 21));
        assert_eq!((sunset.hour(), sunset.minute()), (19, 48));
        assert_eq!(sunset.second(), 0);
    }

    #[test]
    fn test_jerusalem_winter() {
        // Almanac: 16:39 IST on 2024-12-20
        let sunset = calculate_sunset(date(2024, 12, 20), jerusalem(), hours(2)).unwrap();
        assert_eq!((sunset.hour(), sunset.minute()), (16, 39));
    }

    #[test]
    fn test_western_longitude_wraps_past_utc_midnight() {
        // New York sunset is after 00:00 UTC, but must land on the reference date
        let nyc = Coordinate::new(TEST_NEW_YORK_LAT, TEST_NEW_YORK_LON).unwrap();
        let sunset = calculate_sunset(date(2024, 6, 21), nyc, hours(-4)).unwrap();
        assert_eq!(sunset.date_naive(), date(2024, 6, 21));
        assert_eq!((sunset.hour(), sunset.minute()), (20, 31));
    }

    #[test]
    fn test_polar_cases_have_no_solution() {
        let north = Coordinate::new(89.0, 0.0).unwrap();
        let south = Coordinate::new(-89.0, 0.0).unwrap();

        for (coordinate, when) in [
            (north, date(2025, 6, 20)),  // midnight sun
            (north, date(2025, 12, 19)), // polar night
            (south, date(2025, 6, 20)),
            (south, date(2025, 12, 19)),
        ] {
            let result = calculate_sunset(when, coordinate, hours(0));
            assert!(
                matches!(result, Err(SolarError::NoSolution { .. })),
                "expected no sunset at {} on {}",
                coordinate,
                when
            );
        }
    }

    #[test]
    fn test_exact_pole_has_no_solution() {
        let pole = Coordinate::new(90.0, 0.0).unwrap();
        assert!(calculate_sunset(date(2025, 3, 21), pole, hours(0)).is_err());
    }

    #[test]
    fn test_shabbat_times_offsets() {
        let calculator = SolarTimeCalculator::default();
        let times = calculator
            .shabbat_times(date(2025, 6, 20), jerusalem(), hours(3))
            .unwrap();

        assert_eq!(times.reference_date(), date(2025, 6, 20));
        assert_eq!(format_clock_time(&times.sunset()), "19:47");
        assert_eq!(format_clock_time(&times.candle_lighting()), "19:29");
        assert_eq!(format_clock_time(&times.one_hour_before()), "18:29");
        assert_eq!(times.sunset() - times.candle_lighting(), Duration::minutes(18));
        assert_eq!(
            times.candle_lighting() - times.one_hour_before(),
            Duration::minutes(60)
        );
    }

    #[test]
    fn test_custom_candle_lighting_offset() {
        let calculator = SolarTimeCalculator::new(40).unwrap();
        let times = calculator
            .shabbat_times(date(2025, 6, 20), jerusalem(), hours(3))
            .unwrap();
        assert_eq!(format_clock_time(&times.candle_lighting()), "19:07");
    }

    #[test]
    fn test_out_of_range_offsets_are_rejected() {
        for minutes in [0, MAXIMUM_CANDLE_LIGHTING_OFFSET + 1, u64::MAX] {
            assert_eq!(
                SolarTimeCalculator::new(minutes),
                Err(SolarError::InvalidOffset {
                    minutes,
                    min: MINIMUM_CANDLE_LIGHTING_OFFSET,
                    max: MAXIMUM_CANDLE_LIGHTING_OFFSET,
                })
            );
        }

        // Both bounds are usable and keep candle lighting strictly before sunset
        for minutes in [MINIMUM_CANDLE_LIGHTING_OFFSET, MAXIMUM_CANDLE_LIGHTING_OFFSET] {
            let times = SolarTimeCalculator::new(minutes)
                .unwrap()
                .shabbat_times(date(2025, 6, 20), jerusalem(), hours(3))
                .unwrap();
            assert!(times.candle_lighting() < times.sunset());
        }
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let calculator = SolarTimeCalculator::default();
        let first = calculator.shabbat_times(date(2025, 3, 14), jerusalem(), hours(2));
        let second = calculator.shabbat_times(date(2025, 3, 14), jerusalem(), hours(2));
        assert_eq!(first, second);
        assert_eq!(
            sunset_utc_hours(date(2025, 3, 14), jerusalem())
                .unwrap()
                .to_bits(),
            sunset_utc_hours(date(2025, 3, 14), jerusalem())
                .unwrap()
                .to_bits()
        );
    }

    #[test]
    fn test_mismatched_offset_shifts_wall_clock() {
        // The same UTC instant, but a clock reporting the wrong offset shows a
        // wall time that is off by exactly the difference.
        let right = calculate_sunset(date(2024, 6, 21), jerusalem(), hours(3)).unwrap();
        let wrong = calculate_sunset(date(2024, 6, 21), jerusalem(), hours(2)).unwrap();
        assert_eq!(right, wrong);
        assert_eq!(right.hour(), wrong.hour() + 1);
    }

    #[test]
    fn test_badly_wrong_offset_moves_instant_by_a_day() {
        // Offsets far from the real zone wrap the local time onto the wrong
        // side of midnight; the result is plausible-looking but a day off.
        let right = calculate_sunset(date(2024, 6, 21), jerusalem(), hours(3)).unwrap();
        let wrong = calculate_sunset(date(2024, 6, 21), jerusalem(), hours(10)).unwrap();
        assert_eq!(right - wrong, Duration::hours(24));
    }

    #[test]
    fn test_next_friday() {
        // Wednesday → Friday two days later
        assert_eq!(next_friday(date(2025, 6, 18)), date(2025, 6, 20));
        // Friday → same day
        assert_eq!(next_friday(date(2025, 6, 20)), date(2025, 6, 20));
        // Saturday → following week
        assert_eq!(next_friday(date(2025, 6, 21)), date(2025, 6, 27));
        // Sunday, across a month boundary
        assert_eq!(next_friday(date(2026, 10, 25)), date(2026, 10, 30));
        assert_eq!(next_friday(date(2025, 12, 29)), date(2026, 1, 2));
    }

    #[test]
    fn test_format_clock_time_pads() {
        let instant = hours(2)
            .from_local_datetime(&date(2025, 1, 3).and_hms_opt(7, 5, 0).unwrap())
            .single()
            .unwrap();
        assert_eq!(format_clock_time(&instant), "07:05");
    }
}
