use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::str::FromStr;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Parse a timestamp like `2/5/2025 17:25:53` or `2/5/2025 17:25` (day first, no zero padding required).
pub fn parse_date_time(content: &str) -> Result<NaiveDateTime, &'static str> {
    let mut parts = content.split_whitespace();
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("Expected date and time separated by a space");
    };
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(date.and_time(time))
}

/// Parse a date like `02/05/2025`.
pub fn parse_date(content: &str) -> Result<NaiveDate, &'static str> {
    let parts: Vec<&str> = content.trim().split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err("Expected date as day/month/year");
    };
    let day: u32 = parse_number(day)?;
    let month: u32 = parse_number(month)?;
    let year: i32 = parse_number(year)?;
    if !(1..=12).contains(&month) {
        return Err("Month out of range");
    }
    if !(1..=31).contains(&day) {
        return Err("Day out of range");
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err("Year out of range");
    }
    // from_ymd_opt refuses combinations like 31/04 instead of rolling over into the next month
    NaiveDate::from_ymd_opt(year, month, day).ok_or("Invalid date")
}

fn parse_time(content: &str) -> Result<NaiveTime, &'static str> {
    let parts: Vec<&str> = content.split(':').collect();
    let (hour, minute, second) = match parts.as_slice() {
        [hour, minute] => (hour, minute, &"0"),
        [hour, minute, second] => (hour, minute, second),
        _ => return Err("Expected time as HH:MM or HH:MM:SS"),
    };
    NaiveTime::from_hms_opt(
        parse_number(hour)?,
        parse_number(minute)?,
        parse_number(second)?,
    )
    .ok_or("Invalid time")
}

fn parse_number<N: FromStr>(content: &str) -> Result<N, &'static str> {
    if content.is_empty() || !content.chars().all(|c| c.is_ascii_digit()) {
        return Err("Failed to parse number");
    }
    content.parse().map_err(|_| "Failed to parse number")
}
