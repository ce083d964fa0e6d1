/// Compact amount: `1.23B`, `4.50M`, `7.00K`, `12.00`; `-` for NaN.
pub fn format_number(num: f64) -> String {
    if num.is_nan() {
        return "-".to_string();
    }
    if num >= 1_000_000_000.0 {
        format!("{:.2}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.2}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.2}K", num / 1_000.0)
    } else {
        format!("{num:.2}")
    }
}

/// Escape HTML special characters to prevent XSS
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Shorten a label for chart axes, keeping whole characters.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_numbers() {
        assert_eq!(format_number(1_234_000_000.0), "1.23B");
        assert_eq!(format_number(4_500_000.0), "4.50M");
        assert_eq!(format_number(7_000.0), "7.00K");
        assert_eq!(format_number(12.0), "12.00");
        assert_eq!(format_number(f64::NAN), "-");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"A&B's"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_label("קרן השקעות גדולה", 6), "קרן ה…");
        assert_eq!(truncate_label("USA", 5), "USA");
    }
}
