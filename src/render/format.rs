use chrono::{DateTime, Utc};

/// `"18:00 - 20:00"` on one day, `"Jun 03 18:00 - Jun 04 02:00"` across days.
pub fn format_time_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    if start.date_naive() == end.date_naive() {
        format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
    } else {
        format!("{} - {}", start.format("%b %d %H:%M"), end.format("%b %d %H:%M"))
    }
}

pub fn format_duration(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    let d = end.signed_duration_since(*start);
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;
    match (hours, minutes) {
        (h, m) if h > 0 && m > 0 => format!("{}h {}m", h, m),
        (h, _) if h > 0 => format!("{}h", h),
        (_, m) => format!("{}m", m),
    }
}

/// Metres below one kilometre, otherwise kilometres with one decimal.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0}m", km * 1000.0)
    } else {
        format!("{:.1} km", km)
    }
}
