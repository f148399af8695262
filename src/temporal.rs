//! Maps a requested year onto the years the reference data actually covers.

use crate::error::{Error, Result};
use tracing::warn;

/// Outcome of resolving a requested year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearResolution {
    pub year: i32,
    /// True when `year` differs from the requested year.
    pub is_provisional: bool,
}

/// Picks the available year closest to `requested`.
///
/// An exact match is returned as-is. Otherwise the nearest year wins, and on a
/// tie the earlier year is chosen. An empty `available` set means the store is
/// misconfigured and yields [`Error::NoYearsAvailable`].
pub fn resolve_year<I>(requested: i32, available: I) -> Result<YearResolution>
where
    I: IntoIterator<Item = i32>,
{
    let mut closest: Option<i32> = None;
    for year in available {
        if year == requested {
            return Ok(YearResolution {
                year,
                is_provisional: false,
            });
        }
        closest = match closest {
            Some(best) if distance(best, requested) < distance(year, requested) => Some(best),
            Some(best) if distance(best, requested) == distance(year, requested) => {
                Some(best.min(year))
            }
            _ => Some(year),
        };
    }

    let year = closest.ok_or(Error::NoYearsAvailable)?;
    warn!(
        requested_year = requested,
        year, "Data not available for requested year; using closest available year"
    );
    Ok(YearResolution {
        year,
        is_provisional: true,
    })
}

fn distance(a: i32, b: i32) -> u32 {
    a.abs_diff(b)
}
