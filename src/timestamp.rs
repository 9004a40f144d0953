//! Capture timestamps and the `%`-pattern formatter.
//!
//! A thumbnail's file name starts with the capture moment of its source, so
//! re-running after a rename still finds it and two shots of the same name
//! never collide. The moment comes from one of five sources; the source code
//! can be written into the name with `%?` to see which one was used.
//!
//! | Token | Output |
//! |-------|--------|
//! | `%y` | year, e.g. `2016` |
//! | `%m` `%d` `%H` `%M` `%S` | two digits |
//! | `%?` | source code, two digits (see [`TimestampSource`]) |
//!
//! `%` followed by anything else, or at the end of the pattern, is copied as
//! is. The same formatter names the dated log file.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// Most digits accepted from a date spec. Only the first 14 are used.
const MAX_SPEC_DIGITS: usize = 17;

/// Where a [`FileDateTime`] came from, in order of preference after the
/// EXIF tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimestampSource {
    /// File system modification time, the last resort.
    Modified = 0,
    DateTimeOriginal = 1,
    DateTime = 2,
    DateTimeDigitized = 3,
    /// Digits in the file name, e.g. `IMG_20161106_112918.jpg`.
    FileName = 4,
}

impl TimestampSource {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// EXIF tag name for the three tag-backed sources.
    pub fn tag_name(self) -> Option<&'static str> {
        match self {
            TimestampSource::DateTimeOriginal => Some("DateTimeOriginal"),
            TimestampSource::DateTime => Some("DateTime"),
            TimestampSource::DateTimeDigitized => Some("DateTimeDigitized"),
            TimestampSource::Modified | TimestampSource::FileName => None,
        }
    }
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampSource::Modified => write!(f, "modified time"),
            TimestampSource::FileName => write!(f, "file name"),
            tag => write!(f, "{}", tag.tag_name().unwrap_or_default()),
        }
    }
}

/// A date spec that does not describe a plausible capture moment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateSpecError {
    #[error("more than {MAX_SPEC_DIGITS} digits in '{0}'")]
    TooManyDigits(String),
    #[error("year {0} is outside 1970..=2100")]
    Year(u32),
    #[error("month {0} is outside 1..=12")]
    Month(u32),
    #[error("day of month {0} is outside 1..=31")]
    Day(u32),
    #[error("hour {0} is above 23")]
    Hour(u32),
    #[error("minute {0} is above 59")]
    Minute(u32),
    #[error("second {0} is above 59")]
    Second(u32),
}

/// Calendar fields of a capture moment, local time, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDateTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub source: TimestampSource,
}

impl FileDateTime {
    /// Parse the digits of `spec` as `YYYYMMDDHHMMSS`.
    ///
    /// Non-digits are skipped, so `2016:11:06 11:29:18` and
    /// `IMG_20161106_112918.jpg` both work. Missing trailing digits read as
    /// zero, which makes a bare `YYYYMMDD` midnight.
    pub fn from_spec(spec: &str, source: TimestampSource) -> Result<Self, DateSpecError> {
        let digits: Vec<u32> = spec.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() > MAX_SPEC_DIGITS {
            return Err(DateSpecError::TooManyDigits(spec.to_string()));
        }
        let mut fields = digits.into_iter().chain(std::iter::repeat(0));
        let mut next = |width: usize| (0..width).fold(0, |acc, _| acc * 10 + fields.next().unwrap_or(0));

        let year = next(4);
        if !(1970..=2100).contains(&year) {
            return Err(DateSpecError::Year(year));
        }
        let month = next(2);
        if !(1..=12).contains(&month) {
            return Err(DateSpecError::Month(month));
        }
        let day = next(2);
        if !(1..=31).contains(&day) {
            return Err(DateSpecError::Day(day));
        }
        let hour = next(2);
        if hour > 23 {
            return Err(DateSpecError::Hour(hour));
        }
        let minute = next(2);
        if minute > 59 {
            return Err(DateSpecError::Minute(minute));
        }
        let second = next(2);
        if second > 59 {
            return Err(DateSpecError::Second(second));
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            source,
        })
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>, source: TimestampSource) -> Self {
        Self {
            year: dt.year().max(0) as u32,
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            source,
        }
    }

    /// Local calendar fields of a file system time.
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_datetime(&DateTime::<Local>::from(time), TimestampSource::Modified)
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now(), TimestampSource::Modified)
    }

    /// Expand the `%` tokens of `pattern`.
    pub fn format(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 8);
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let field = match chars.peek() {
                Some('y') => self.year.to_string(),
                Some('m') => format!("{:02}", self.month),
                Some('d') => format!("{:02}", self.day),
                Some('H') => format!("{:02}", self.hour),
                Some('M') => format!("{:02}", self.minute),
                Some('S') => format!("{:02}", self.second),
                Some('?') => format!("{:02}", self.source.code()),
                _ => {
                    // Not a token: keep the '%' and look at the next char again.
                    out.push('%');
                    continue;
                }
            };
            chars.next();
            out.push_str(&field);
        }
        out
    }
}

impl fmt::Display for FileDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}:{:02} ({})",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileDateTime {
        FileDateTime {
            year: 1984,
            month: 11,
            day: 20,
            hour: 23,
            minute: 59,
            second: 59,
            source: TimestampSource::DateTime,
        }
    }

    // =========================================================================
    // Pattern formatting
    // =========================================================================

    #[test]
    fn default_thumbnail_pattern() {
        assert_eq!(sample().format("%y_%m_%d_%H_%M_%S_"), "1984_11_20_23_59_59_");
    }

    #[test]
    fn unknown_tokens_are_literal() {
        assert_eq!(
            sample().format("%%y-%m-%dT%H-%M-%S%"),
            "%1984-11-20T23-59-59%"
        );
        assert_eq!(sample().format("%x%"), "%x%");
        assert_eq!(sample().format("%"), "%");
    }

    #[test]
    fn log_name_pattern() {
        assert_eq!(sample().format("log-%y%m%d.txt"), "log-19841120.txt");
    }

    #[test]
    fn source_code_token() {
        let mut dt = sample();
        assert_eq!(dt.format("%?"), "02");
        dt.source = TimestampSource::FileName;
        assert_eq!(dt.format("src%?_"), "src04_");
    }

    #[test]
    fn single_digit_fields_are_padded() {
        let dt = FileDateTime::from_spec("2001:02:03 04:05:06", TimestampSource::Modified).unwrap();
        assert_eq!(dt.format("%y%m%d%H%M%S"), "20010203040506");
    }

    #[test]
    fn example_width_is_stable() {
        // The existence cache strips this many chars from thumbnail names.
        let pattern = "%y_%m_%d_%H_%M_%S_";
        assert_eq!(sample().format(pattern).len(), FileDateTime::now().format(pattern).len());
    }

    // =========================================================================
    // Date specs
    // =========================================================================

    #[test]
    fn exif_value_parses() {
        let dt = FileDateTime::from_spec("2016:11:06 11:29:18", TimestampSource::DateTimeOriginal)
            .unwrap();
        assert_eq!(
            (dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second),
            (2016, 11, 6, 11, 29, 18)
        );
        assert_eq!(dt.source, TimestampSource::DateTimeOriginal);
    }

    #[test]
    fn file_name_digits_parse() {
        let dt = FileDateTime::from_spec("IMG_20161106_112918.jpg", TimestampSource::FileName)
            .unwrap();
        assert_eq!(dt.format("%y%m%d%H%M%S"), "20161106112918");
    }

    #[test]
    fn missing_digits_read_as_zero() {
        let dt = FileDateTime::from_spec("PXL_20240101.jpg", TimestampSource::FileName).unwrap();
        assert_eq!((dt.hour, dt.minute, dt.second), (0, 0, 0));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        use DateSpecError::*;
        let cases = [
            ("photo.jpg", Year(0)),
            ("1969:12:31 23:59:59", Year(1969)),
            ("2101:01:01 00:00:00", Year(2101)),
            ("2016:00:06 11:29:18", Month(0)),
            ("2016:13:06 11:29:18", Month(13)),
            ("2016:11:00 11:29:18", Day(0)),
            ("2016:11:32 11:29:18", Day(32)),
            ("2016:11:06 24:29:18", Hour(24)),
            ("2016:11:06 11:60:18", Minute(60)),
            ("2016:11:06 11:29:60", Second(60)),
        ];
        for (spec, expected) in cases {
            assert_eq!(
                FileDateTime::from_spec(spec, TimestampSource::FileName),
                Err(expected),
                "{spec}"
            );
        }
    }

    #[test]
    fn digit_limit() {
        assert!(FileDateTime::from_spec("20161106112918123", TimestampSource::FileName).is_ok());
        assert!(matches!(
            FileDateTime::from_spec("201611061129181234", TimestampSource::FileName),
            Err(DateSpecError::TooManyDigits(_))
        ));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(FileDateTime::from_spec("1970:01:01 00:00:00", TimestampSource::FileName).is_ok());
        assert!(FileDateTime::from_spec("2100:12:31 23:59:59", TimestampSource::FileName).is_ok());
    }

    // =========================================================================
    // Clock sources
    // =========================================================================

    #[test]
    fn system_time_uses_local_fields() {
        let local = Local
            .with_ymd_and_hms(2020, 2, 3, 4, 5, 6)
            .single()
            .unwrap();
        let dt = FileDateTime::from_system_time(SystemTime::from(local));
        assert_eq!(
            (dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second),
            (2020, 2, 3, 4, 5, 6)
        );
        assert_eq!(dt.source, TimestampSource::Modified);
    }

    #[test]
    fn display_names_source() {
        assert_eq!(sample().to_string(), "1984-11-20 23:59:59 (DateTime)");
        let mut dt = sample();
        dt.source = TimestampSource::Modified;
        assert!(dt.to_string().ends_with("(modified time)"));
    }
}
