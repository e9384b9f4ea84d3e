/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use reactor_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a byte count as a human-readable size using 1024-based units.
///
/// Values below 1 KB are shown as whole bytes. Larger values are rounded to
/// two decimals and printed with at least one decimal place.
///
/// # Examples
///
/// ```
/// use reactor_core::formatting::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(512), "512 B");
/// assert_eq!(format_file_size(2048), "2.0 KB");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(5_242_880), "5.0 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["B", "KB", "MB"];
    const K: f64 = 1024.0;

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= K && unit < UNITS.len() - 1 {
        value /= K;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    let mut text = format!("{:.2}", rounded);
    if text.ends_with('0') {
        text.pop();
    }
    format!("{} {}", text, UNITS[unit])
}

/// Format a value with a fixed number of decimals and no grouping, the way
/// result tables print inputs and outputs.
///
/// ```
/// use reactor_core::formatting::format_fixed;
///
/// assert_eq!(format_fixed(0.2, 4), "0.2000");
/// assert_eq!(format_fixed(300.0, 1), "300.0");
/// ```
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.prec$}", value, prec = decimals)
}

/// Direction of change between two consecutive predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Describe the change `delta` as a trend arrow plus its signed value.
///
/// A zero delta yields the flat marker with no number.
///
/// ```
/// use reactor_core::formatting::{delta_indicator, Trend};
///
/// assert_eq!(delta_indicator(0.5), (Trend::Up, "▲ 0.5000".to_string()));
/// assert_eq!(delta_indicator(-2.0), (Trend::Down, "▼ -2.0000".to_string()));
/// assert_eq!(delta_indicator(0.0), (Trend::Flat, "▬".to_string()));
/// ```
pub fn delta_indicator(delta: f64) -> (Trend, String) {
    if delta > 0.0 {
        (Trend::Up, format!("▲ {:.4}", delta))
    } else if delta < 0.0 {
        (Trend::Down, format!("▼ {:.4}", delta))
    } else {
        (Trend::Flat, "▬".to_string())
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use reactor_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Short label for a power-of-ten molecular weight, e.g. `10⁴`.
pub fn decade_label(exponent: i32) -> String {
    const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    let mut label = String::from("10");
    if exponent < 0 {
        label.push('⁻');
    }
    for digit in exponent.unsigned_abs().to_string().chars() {
        if let Some(d) = digit.to_digit(10) {
            label.push(SUPERSCRIPTS[d as usize]);
        }
    }
    label
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
