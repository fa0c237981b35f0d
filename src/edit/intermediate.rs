//! Intermediate values of typed number and time controls.

/// Returns whether `text` may be on its way to a number: only digits,
/// `.`, `-` and `e`, at most two `-`, one `.` and one `e`, and an
/// exponent made of an optional `-` and digits.
pub(crate) fn is_plausible_number(text: &str) -> bool {
    if text
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | 'e')))
    {
        return false;
    }
    if text.matches('-').count() > 2 || text.matches('.').count() > 1 || text.matches('e').count() > 1 {
        return false;
    }
    match text.split_once('e') {
        Some((_, exponent)) => {
            let digits = exponent.strip_prefix('-').unwrap_or(exponent);
            digits.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    }
}

/// Assembles typed digits into `HH:MM`.
///
/// A leading digit of 3 or more is a one-digit hour. A leading `2`
/// followed by 4 or more takes both digits as the hour, which is then
/// clamped to 23. Otherwise two typed digits stay an incomplete hour.
/// Returns `None` while no minutes were typed.
pub(crate) fn build_time_value(text: &str) -> Option<String> {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 2 {
        return None;
    }
    let split = if digits[0] >= 3 {
        1
    } else if digits[0] == 2 && digits[1] >= 4 {
        2
    } else if text.chars().count() == 2 {
        return None;
    } else {
        2
    };
    let (hours, minutes) = digits.split_at(split);
    if minutes.is_empty() {
        return None;
    }
    let number = |part: &[u32]| part.iter().fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(*d));
    Some(format!(
        "{:02}:{:02}",
        number(hours).min(23),
        number(minutes).min(59)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_numbers() {
        for text in ["", "1", "-1", "1.", "1e", "1e-", "1e-5", "3-3", "--1", ".5"] {
            assert!(is_plausible_number(text), "{text}");
        }
        for text in ["1e--", "1..2", "1e5e", "a", "1e.5", "---", "1,5"] {
            assert!(!is_plausible_number(text), "{text}");
        }
    }

    #[test]
    fn test_build_time_value() {
        assert_eq!(build_time_value("1"), None);
        assert_eq!(build_time_value("10"), None);
        assert_eq!(build_time_value("103"), Some("10:03".to_string()));
        assert_eq!(build_time_value("10:030"), Some("10:30".to_string()));
        assert_eq!(build_time_value("30"), Some("03:00".to_string()));
        assert_eq!(build_time_value("99"), Some("09:09".to_string()));
        assert_eq!(build_time_value("24"), None);
        assert_eq!(build_time_value("245"), Some("23:05".to_string()));
    }
}
