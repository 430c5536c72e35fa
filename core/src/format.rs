use chrono::{TimeZone, Utc};

/// Sekunder som "H:MM:SS", eller "M:SS" under én time.
pub fn format_duration(total_s: u64) -> String {
    let h = total_s / 3600;
    let m = (total_s % 3600) / 60;
    let s = total_s % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Meter som "12.45 km" eller "450 m".
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

/// m/s som "42.5 km/h".
pub fn format_speed_kmh(mps: f64) -> String {
    format!("{:.1} km/h", mps * 3.6)
}

pub fn format_elevation(meters: f64) -> String {
    format!("{:.0} m", meters)
}

/// Epoch-ms som "dd/mm/yyyy HH:MM" (UTC). Ugyldig tid gir "-".
pub fn format_date_time(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}
