use chrono::{Datelike, Local, NaiveDate};

/// Result of registering a client for a trip. The variants are listed in the
/// order the checks run: the first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    ClientNotFound,
    TripNotFound,
    CapacityReached,
    AlreadyRegistered,
    Registered,
}

impl RegistrationOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Registered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnregistrationOutcome {
    RegistrationNotFound,
    Unregistered,
}

/// Encodes a date as the `YYYYMMDD` integer stored in `Client_Trip.RegisteredAt`.
pub fn registration_date(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Registration date for "now", taken from the local clock.
pub fn today() -> i32 {
    registration_date(Local::now().date_naive())
}

/// Capacity rule: a trip accepts a new registration while it has fewer
/// registrations than its maximum participant count.
pub fn has_capacity(current_registrations: i64, max_people: i32) -> bool {
    current_registrations < i64::from(max_people)
}
