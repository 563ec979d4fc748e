use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use time::OffsetDateTime;

#[expect(clippy::unwrap_used, reason = "the pattern is a compile-time constant")]
static COPYRIGHT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Copyright \(c\) )[0-9]{4}").unwrap());

/// Errors that can occur when building a [`Year`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YearError {
    #[error("{0} is not a four-digit year")]
    OutOfRange(i32),
}

/// A calendar year with exactly four digits (1000 to 9999)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(u16);

impl Year {
    /// Create a year, rejecting values that do not have four digits.
    ///
    /// # Errors
    ///
    /// Returns [`YearError::OutOfRange`] if `value` is outside `1000..=9999`.
    pub fn new(value: i32) -> Result<Self, YearError> {
        u16::try_from(value)
            .ok()
            .filter(|v| (1000..=9999).contains(v))
            .map(Self)
            .ok_or(YearError::OutOfRange(value))
    }

    /// The current calendar year in the local time zone.
    ///
    /// Falls back to UTC when the local offset cannot be determined, which `time` refuses
    /// to do once the process has spawned other threads.
    ///
    /// # Errors
    ///
    /// Returns [`YearError::OutOfRange`] if the system clock reports a year without four digits.
    pub fn current() -> Result<Self, YearError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::new(now.year())
    }

    /// The year as a plain number
    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Year {
    type Error = YearError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Replace the year of every `Copyright (c) YYYY` notice in `text` with `year`.
///
/// Text without a notice is returned unchanged.
#[must_use]
pub fn rewrite_year(text: &str, year: Year) -> String {
    COPYRIGHT_YEAR
        .replace_all(text, format!("${{1}}{year}").as_str())
        .into_owned()
}

/// Whether `text` contains at least one copyright notice that [`rewrite_year`] would touch.
#[must_use]
pub fn has_copyright_notice(text: &str) -> bool {
    COPYRIGHT_YEAR.is_match(text)
}
