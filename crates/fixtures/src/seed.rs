//! Seed pools and random helpers used by the generators.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

pub const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Charles", "Karen", "Aisha", "Luis", "Mei", "Tamika", "Dmitri",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore",
    "Jackson", "Martin", "Lee", "Washington", "Kowalski", "Patel", "Nguyen", "Okafor",
];

pub const CITIES: &[&str] = &[
    "Columbus", "Dublin", "Westerville", "Grove City", "Hilliard", "Reynoldsburg", "Gahanna",
    "Worthington",
];

pub const STREETS: &[&str] = &[
    "Maple Ave", "High St", "Broad St", "Oak Dr", "Cleveland Ave", "Morse Rd", "Sawmill Rd",
    "Main St",
];

pub const PAYERS: &[&str] = &["Ohio Medicaid", "Medicare", "CareSource", "Molina", "Private Pay"];

pub const SERVICE_CODES: &[&str] = &["T1019", "S5125", "S5130", "G0156", "T1002"];

pub const PODS: &[&str] = &["pod-north", "pod-south", "pod-east", "pod-west"];

/// Uniform pick from a non-empty pool.
pub fn pick<T: Copy>(items: &[T]) -> T {
    items[rand::thread_rng().gen_range(0..items.len())]
}

pub fn shuffled<T>(mut items: Vec<T>) -> Vec<T> {
    items.shuffle(&mut rand::thread_rng());
    items
}

pub fn first_name() -> &'static str {
    pick(FIRST_NAMES)
}

pub fn last_name() -> &'static str {
    pick(LAST_NAMES)
}

/// Short prefixed id, e.g. `pat-3f9a1c2b`.
pub fn id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}

pub fn phone() -> String {
    let mut rng = rand::thread_rng();
    format!("(614) {:03}-{:04}", rng.gen_range(200..999), rng.gen_range(0..10000))
}

pub fn chance(probability: f64) -> bool {
    rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
}

pub fn int_between(min: u32, max: u32) -> u32 {
    rand::thread_rng().gen_range(min..=max)
}

/// Money amount rounded to cents.
pub fn money_between(min: f64, max: f64) -> f64 {
    round_cents(rand::thread_rng().gen_range(min..max))
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A date `min_days..=max_days` away from today (negative is past).
pub fn date_offset(min_days: i64, max_days: i64) -> NaiveDate {
    let days = rand::thread_rng().gen_range(min_days..=max_days);
    today() + Duration::days(days)
}

/// A timestamp within the last `max_days` days.
pub fn recent_timestamp(max_days: i64) -> DateTime<Utc> {
    let seconds = rand::thread_rng().gen_range(0..=max_days.max(1) * 86_400);
    Utc::now() - Duration::seconds(seconds)
}

/// A timestamp on `date` at a whole hour between `min_hour` and `max_hour`.
pub fn at_hour(date: NaiveDate, min_hour: u32, max_hour: u32) -> DateTime<Utc> {
    let hour = int_between(min_hour, max_hour);
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
    date.and_time(time).and_utc()
}

pub fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn timestamp_string(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn email(first: &str, last: &str) -> String {
    format!(
        "{}.{}{}@serenitycare.com",
        first.to_lowercase(),
        last.to_lowercase(),
        int_between(1, 99)
    )
}
