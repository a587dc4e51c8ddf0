//! Go-style duration strings.
//!
//! Durations are written the way the cluster tooling has always written them
//! (`8760h`, `1h30m`, `90s`, `1.5h`) and annotated on secrets in the canonical
//! form (`8760h0m0s`), so existing annotations keep comparing equal.

use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a duration such as `"300ms"`, `"1.5h"` or `"2h45m"`.
///
/// Negative durations are rejected. A bare `"0"` is accepted.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    let body = input.strip_prefix('+').unwrap_or(input);

    if body.starts_with('-') {
        return Err(format!("negative duration '{}' is not allowed", s));
    }
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let mut remaining = body;
    let mut total: u128 = 0;

    while !remaining.is_empty() {
        let int_end = remaining.find(|c: char| !c.is_ascii_digit()).unwrap_or(remaining.len());
        let (int_part, rest) = remaining.split_at(int_end);

        let (frac_part, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_end =
                    after_dot.find(|c: char| !c.is_ascii_digit()).unwrap_or(after_dot.len());
                after_dot.split_at(frac_end)
            }
            None => ("", rest),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration '{}': expected a number", s));
        }

        let unit_end = rest.find(|c: char| c == '.' || c.is_ascii_digit()).unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_end);
        if unit.is_empty() {
            return Err(format!("missing unit in duration '{}'", s));
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| format!("unknown unit '{}' in duration '{}'", unit, s))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| format!("invalid number in duration '{}'", s))?
        };

        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("duration '{}' overflows", s))?;

        // Fractional digits beyond nanosecond precision are truncated.
        let mut place = scale;
        for digit in frac_part.chars() {
            place /= 10;
            if place == 0 {
                break;
            }
            let d = u128::from(digit.to_digit(10).unwrap_or(0));
            value += d * place;
        }

        total = total.checked_add(value).ok_or_else(|| format!("duration '{}' overflows", s))?;
        remaining = rest;
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND)
        .map_err(|_| format!("duration '{}' overflows", s))?;
    // Remainder is always below one second.
    let nanos = (total % NANOS_PER_SECOND) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Render a duration the way it is recorded in secret annotations.
///
/// `Duration::from_secs(8760 * 3600)` renders as `8760h0m0s`, 90 seconds as
/// `1m30s`, half a second as `500ms`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_nanos();
    if total == 0 {
        return "0s".to_string();
    }

    if total < NANOS_PER_SECOND {
        return if total < NANOS_PER_MICRO {
            format!("{}ns", total)
        } else if total < NANOS_PER_MILLI {
            format!("{}µs", fractional(total, NANOS_PER_MICRO))
        } else {
            format!("{}ms", fractional(total, NANOS_PER_MILLI))
        };
    }

    let hours = total / NANOS_PER_HOUR;
    let minutes = (total % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = fractional(total % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// `value / unit` with trailing zeros of the fraction dropped.
fn fractional(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
