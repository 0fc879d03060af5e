use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:(\d+):)?(\d{1,2}):)?(\d+)$").expect("timestamp pattern is valid")
});

/// Seconds from `HH:MM:SS`, `MM:SS` or `SS`.
pub fn time_to_seconds(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let caps = TIMESTAMP
        .captures(value)
        .ok_or_else(|| format!("'{value}' is not HH:MM:SS, MM:SS or SS"))?;
    let field = |i: usize| -> Result<u32, String> {
        caps.get(i)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map(|v| v.unwrap_or(0))
            .map_err(|e| format!("'{value}': {e}"))
    };
    let (h, m, s) = (field(1)?, field(2)?, field(3)?);
    h.checked_mul(3600)
        .and_then(|h| h.checked_add(m * 60))
        .and_then(|hm| hm.checked_add(s))
        .ok_or_else(|| format!("'{value}' is too long"))
}

/// `HH:MM:SS` for a duration in seconds.
pub fn format_duration(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
