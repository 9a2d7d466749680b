//! Operator form handling: field validation and the live address input mask.

use std::fmt;

pub const MIN_PORT: u16 = 1024;
pub const MAX_PORT: u16 = 65535;
const MAX_OCTETS: usize = 4;
const MAX_OCTET_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Address,
    Port,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FormField::Name => "name",
            FormField::Address => "IP",
            FormField::Port => "port",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter {}.", prose_list(.0))]
    MissingFields(Vec<FormField>),
    #[error("Port must be a number between 1024 and 65535.")]
    InvalidPort,
}

/// Raw form contents, exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceForm {
    pub name: String,
    pub address: String,
    pub port: String,
}

/// Form contents that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDevice {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl DeviceForm {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port: port.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.address.is_empty() && self.port.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Missing fields are reported before the port range check.
    pub fn validate(&self) -> Result<ValidDevice, ValidationError> {
        let name = self.name.trim();
        let address = self.address.trim();
        let port = self.port.trim();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push(FormField::Name);
        }
        if address.is_empty() {
            missing.push(FormField::Address);
        }
        if port.is_empty() {
            missing.push(FormField::Port);
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let port = port
            .parse::<u32>()
            .ok()
            .filter(|p| (u32::from(MIN_PORT)..=u32::from(MAX_PORT)).contains(p))
            .and_then(|p| u16::try_from(p).ok())
            .ok_or(ValidationError::InvalidPort)?;

        Ok(ValidDevice {
            name: name.to_string(),
            address: address.to_string(),
            port,
        })
    }
}

/// "a", "a and b", "a, b, and c"
pub fn prose_list<T: fmt::Display>(items: &[T]) -> String {
    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// Live IPv4 mask applied on every keystroke.
///
/// `previous` is the value produced by the last call; it is used to detect
/// forward typing, the only case where a separator is auto-inserted after a
/// complete 3-digit octet.
pub fn format_address_input(previous: &str, raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let octets: Vec<String> = cleaned
        .split('.')
        .take(MAX_OCTETS)
        .map(|part| {
            let part: String = part.chars().take(MAX_OCTET_DIGITS).collect();
            match part.parse::<u32>() {
                Ok(value) => value.min(255).to_string(),
                Err(_) => part,
            }
        })
        .collect();

    let mut formatted = octets.join(".");

    if cleaned.len() > previous.len() {
        let last_full = octets.last().is_some_and(|o| o.len() == MAX_OCTET_DIGITS);
        if last_full && octets.len() < MAX_OCTETS && !formatted.ends_with('.') {
            formatted.push('.');
        }
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(keys: &str) -> String {
        keys.chars().fold(String::new(), |current, key| {
            let raw = format!("{current}{key}");
            format_address_input(&current, &raw)
        })
    }

    #[test]
    fn test_missing_fields_listed_in_prose() {
        let err = DeviceForm::new("", "", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "Please enter name, IP, and port.");

        let err = DeviceForm::new("Pi", "", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "Please enter IP and port.");

        let err = DeviceForm::new("Pi", "  ", "10000").validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec![FormField::Address]));
    }

    #[test]
    fn test_port_range() {
        for port in ["1023", "65536", "abc", "-5", "100000"] {
            let err = DeviceForm::new("Pi", "10.0.0.2", port).validate().unwrap_err();
            assert_eq!(err, ValidationError::InvalidPort, "port {port}");
        }
        for (port, expected) in [("1024", 1024), ("65535", 65535), (" 10000 ", 10000)] {
            let valid = DeviceForm::new(" Pi ", "10.0.0.2", port).validate().unwrap();
            assert_eq!(valid.port, expected);
            assert_eq!(valid.name, "Pi");
        }
    }

    #[test]
    fn test_separators_inserted_after_full_octets() {
        assert_eq!(type_keys("192"), "192.");
        assert_eq!(type_keys("192168"), "192.168.");
        assert_eq!(type_keys("1921681.1"), "192.168.1.1");
    }

    #[test]
    fn test_undotted_digits_fill_the_third_octet() {
        // sans point tapé, "11" reste dans le troisième octet
        assert_eq!(type_keys("19216811"), "192.168.11");
        assert_eq!(type_keys("192168111"), "192.168.111.");
    }

    #[test]
    fn test_octets_clamped_to_255() {
        assert_eq!(type_keys("300"), "255.");
        assert_eq!(type_keys("10.999"), "10.255.");
        assert_eq!(format_address_input("", "256.1"), "255.1");
    }

    #[test]
    fn test_mask_strips_and_caps() {
        assert_eq!(format_address_input("", "1a0.b0"), "10.0");
        assert_eq!(format_address_input("", "1.2.3.4.5"), "1.2.3.4");
        assert_eq!(format_address_input("", "1.2.3.1234"), "1.2.3.123");
        // la 4e tranche complète ne reçoit pas de séparateur
        assert_eq!(type_keys("10.0.0.254"), "10.0.0.254");
    }

    #[test]
    fn test_no_separator_when_deleting() {
        // retour arrière depuis "192.1" : pas de point réinséré
        assert_eq!(format_address_input("192.1", "192."), "192.");
        assert_eq!(format_address_input("192.", "192"), "192");
    }
}
