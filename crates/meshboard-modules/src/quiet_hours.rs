//! Quiet-hours window with overnight wraparound.

use chrono::{Local, Timelike};

/// A time-of-day suppression window in minute-of-day arithmetic.
///
/// `start > end` means the window spans midnight (e.g. 22:00–08:00).
/// `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: u32,
    end: u32,
}

impl QuietHours {
    /// Parses `HH:MM` start and end times. Returns `None` for anything
    /// that is not a valid time of day.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        })
    }

    /// Whether the given minute of day falls inside the window.
    pub fn contains(&self, minute_of_day: u32) -> bool {
        if self.start == self.end {
            return false;
        }
        if self.start < self.end {
            minute_of_day >= self.start && minute_of_day < self.end
        } else {
            // Overnight wraparound.
            minute_of_day >= self.start || minute_of_day < self.end
        }
    }

    /// Whether the window is active for the local wall clock right now.
    pub fn active_now(&self) -> bool {
        let now = Local::now();
        self.contains(now.hour() * 60 + now.minute())
    }
}

fn parse_hhmm(s: &str) -> Option<u32> {
    let (hours, minutes) = s.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}
