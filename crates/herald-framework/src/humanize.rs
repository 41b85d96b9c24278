/// Renders a remaining cooldown as `"M minute(s), and S second(s)"`.
///
/// Seconds are rounded to the nearest whole second and the minutes part is
/// dropped when it is zero.
pub fn format_remaining(remaining_ms: u64) -> String {
    let total_secs = remaining_ms.saturating_add(500) / 1000;
    let (minutes, seconds) = (total_secs / 60, total_secs % 60);
    if minutes == 0 {
        format!("{seconds} second(s)")
    } else {
        format!("{minutes} minute(s), and {seconds} second(s)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_remaining(30_000), "30 second(s)");
        assert_eq!(format_remaining(1_499), "1 second(s)");
        assert_eq!(format_remaining(400), "0 second(s)");
    }

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(format_remaining(90_000), "1 minute(s), and 30 second(s)");
        assert_eq!(format_remaining(59_600), "1 minute(s), and 0 second(s)");
        assert_eq!(format_remaining(3_600_000), "60 minute(s), and 0 second(s)");
    }
}
