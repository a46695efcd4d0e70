//! Formatting utilities.

/// Format a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "GB"), (1_000_000, "MB"), (1_000, "KB")];
    UNITS
        .iter()
        .find(|(scale, _)| bytes >= *scale)
        .map(|(scale, unit)| format!("{:.1} {}", bytes as f64 / *scale as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3_400_000), "3.4 MB");
        assert_eq!(format_size(1_500_000_000), "1.5 GB");
    }
}
