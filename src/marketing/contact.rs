#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl Contact {
    /// First word and the rest; the rest is empty for one-word names.
    pub fn split_name(&self) -> (&str, &str) {
        let name = self.name.trim();
        match name.split_once(' ') {
            Some((first, rest)) => (first, rest.trim()),
            None => (name, ""),
        }
    }
}

/// Normalize a phone number to E.164.
///
/// Non-digits are stripped. A number written with a leading `+` keeps its
/// country code; otherwise 10 or 11 digit numbers are taken as Brazilian and
/// get `55` prepended. Five digits or fewer is not a phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() <= 5 {
        return None;
    }

    if !has_plus && (10..=11).contains(&digits.len()) {
        return Some(format!("+55{digits}"));
    }

    Some(format!("+{digits}"))
}
