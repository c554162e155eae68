//! Runtime settings
//!
//! Read from the environment the same way the binaries read everything
//! else; every value has a default.

use crate::error::DcimError;
use std::env;

/// Upper bound accepted for `DCIM_RACK_U_HEIGHT_MAX`
pub const RACK_U_HEIGHT_LIMIT: u32 = 1000;

/// Tunables for validation and instantiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefer the IPv4 primary address when both families are set
    pub prefer_ipv4: bool,
    /// Tallest rack accepted, in whole units
    pub rack_u_height_max: u32,
    /// Create each component kind in one batch write
    pub bulk_create: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefer_ipv4: false,
            rack_u_height_max: 100,
            bulk_create: true,
        }
    }
}

impl Settings {
    /// Load from `DCIM_PREFER_IPV4`, `DCIM_RACK_U_HEIGHT_MAX` and `DCIM_BULK_CREATE`
    pub fn from_env() -> Result<Self, DcimError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key/value source; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DcimError> {
        let defaults = Self::default();
        let prefer_ipv4 = match lookup("DCIM_PREFER_IPV4") {
            Some(value) => parse_bool("DCIM_PREFER_IPV4", &value)?,
            None => defaults.prefer_ipv4,
        };
        let bulk_create = match lookup("DCIM_BULK_CREATE") {
            Some(value) => parse_bool("DCIM_BULK_CREATE", &value)?,
            None => defaults.bulk_create,
        };
        let rack_u_height_max = match lookup("DCIM_RACK_U_HEIGHT_MAX") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|max| (1..=RACK_U_HEIGHT_LIMIT).contains(max))
                .ok_or_else(|| {
                    DcimError::InvalidConfig(format!(
                        "DCIM_RACK_U_HEIGHT_MAX must be an integer from 1 to {}, got {:?}",
                        RACK_U_HEIGHT_LIMIT, value
                    ))
                })?,
            None => defaults.rack_u_height_max,
        };

        Ok(Self {
            prefer_ipv4,
            rack_u_height_max,
            bulk_create,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, DcimError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DcimError::InvalidConfig(format!(
            "{} must be a boolean, got {:?}",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.bulk_create);
        assert_eq!(settings.rack_u_height_max, 100);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("DCIM_PREFER_IPV4", "yes"),
            ("DCIM_RACK_U_HEIGHT_MAX", "60"),
            ("DCIM_BULK_CREATE", "false"),
        ]))
        .unwrap();
        assert!(settings.prefer_ipv4);
        assert_eq!(settings.rack_u_height_max, 60);
        assert!(!settings.bulk_create);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = Settings::from_lookup(lookup(&[("DCIM_PREFER_IPV4", "maybe")])).unwrap_err();
        assert!(matches!(err, DcimError::InvalidConfig(_)));
        let err = Settings::from_lookup(lookup(&[("DCIM_RACK_U_HEIGHT_MAX", "0")])).unwrap_err();
        assert!(matches!(err, DcimError::InvalidConfig(_)));
    }

    #[test]
    fn test_rack_height_limit() {
        let settings = Settings::from_lookup(lookup(&[("DCIM_RACK_U_HEIGHT_MAX", "1000")])).unwrap();
        assert_eq!(settings.rack_u_height_max, RACK_U_HEIGHT_LIMIT);
        for value in ["1001", "4294967295"] {
            let err = Settings::from_lookup(lookup(&[("DCIM_RACK_U_HEIGHT_MAX", value)])).unwrap_err();
            assert!(matches!(err, DcimError::InvalidConfig(_)), "{} must be rejected", value);
        }
    }
}
