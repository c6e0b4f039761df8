//! Labels in the single display locale (Italian, dd/mm/yyyy).

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::aggregation::MonthKey;

const MONTH_NAMES: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}

pub fn month_label(key: &MonthKey) -> String {
    month_name(key.month()).to_string()
}

pub fn current_month_label(now: DateTime<Utc>, tz: &Tz) -> String {
    month_name(now.with_timezone(tz).month()).to_string()
}

pub fn date_label(now: DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz).format("%d/%m/%Y").to_string()
}

pub fn timestamp_label(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format("%d/%m/%Y, %H:%M").to_string()
}

pub fn export_timestamp(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format("%d/%m/%Y %H:%M:%S").to_string()
}
