use anyhow::{Result, anyhow};
use std::net::IpAddr;

use crate::config::Config;
use crate::monitoring::ProbeKind;

/// Validation results with specific error messages
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(msg.into()) }
    }

    pub fn to_result(&self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(anyhow!(self.error.clone().unwrap_or_else(|| "Validation failed".to_string())))
        }
    }
}

/// Validate a device display name.
///
/// Commas and newlines are rejected so one observation is always exactly
/// one well-formed log record.
pub fn validate_device_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return ValidationResult::err("Device name cannot be empty");
    }

    if trimmed.len() > 100 {
        return ValidationResult::err("Device name too long (max 100 characters)");
    }

    if name.contains(',') || name.contains('\n') {
        return ValidationResult::err("Device name cannot contain commas or newlines");
    }

    ValidationResult::ok()
}

/// Validate a ping target (IP address or hostname).
pub fn validate_ping_address(address: &str) -> ValidationResult {
    if address.trim().is_empty() {
        return ValidationResult::err("Address cannot be empty");
    }

    if address.parse::<IpAddr>().is_ok() {
        return ValidationResult::ok();
    }

    if address.contains(' ') {
        return ValidationResult::err("Address cannot contain spaces");
    }

    if address.starts_with('-') || address.ends_with('-') {
        return ValidationResult::err("Hostname cannot start or end with hyphen");
    }

    if address.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-') {
        ValidationResult::ok()
    } else {
        ValidationResult::err("Invalid address. Use IP address or valid hostname")
    }
}

/// Validate a TCP target (host:port format).
pub fn validate_tcp_address(address: &str) -> ValidationResult {
    if address.trim().is_empty() {
        return ValidationResult::err("Address cannot be empty");
    }

    let Some((host, port)) = address.rsplit_once(':') else {
        return ValidationResult::err("TCP target must be in format 'host:port'");
    };

    if host.is_empty() {
        return ValidationResult::err("TCP target must have a host");
    }

    match port.parse::<u16>() {
        Ok(port) if port > 0 => ValidationResult::ok(),
        Ok(_) => ValidationResult::err("Port must be between 1 and 65535"),
        Err(_) => ValidationResult::err("Invalid port number"),
    }
}

/// Validate a device address for the configured probe mechanism.
pub fn validate_device_address(address: &str, probe: ProbeKind) -> ValidationResult {
    match probe {
        ProbeKind::Ping => validate_ping_address(address),
        ProbeKind::Tcp => validate_tcp_address(address),
    }
}

/// Validate the check interval.
pub fn validate_interval(interval: u64) -> ValidationResult {
    if interval == 0 {
        return ValidationResult::err("Interval must be at least 1 second");
    }

    if interval > 86400 {
        return ValidationResult::err("Interval too long (max 24 hours)");
    }

    ValidationResult::ok()
}

/// Validate the probe timeout against the check interval.
pub fn validate_timeout(timeout: u64, interval: u64) -> ValidationResult {
    if timeout == 0 {
        return ValidationResult::err("Timeout must be at least 1 second");
    }

    if timeout >= interval {
        return ValidationResult::err("Timeout must be less than interval");
    }

    ValidationResult::ok()
}

/// Validate the whole startup configuration. Any failure here is fatal:
/// no monitors start and the process exits.
pub fn validate_config(config: &Config) -> ValidationResult {
    if config.devices.is_empty() {
        return ValidationResult::err("No devices configured");
    }

    for (name, address) in &config.devices {
        let result = validate_device_name(name);
        if !result.is_valid {
            return result;
        }

        let result = validate_device_address(address, config.monitoring.probe);
        if !result.is_valid {
            return ValidationResult::err(format!(
                "Invalid address for device '{name}': {}",
                result.error.unwrap_or_default()
            ));
        }
    }

    let result = validate_interval(config.monitoring.interval_seconds);
    if !result.is_valid {
        return result;
    }

    validate_timeout(config.monitoring.timeout_seconds, config.monitoring.interval_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_device_name_validation() {
        assert!(validate_device_name("Home Router").is_valid);
        assert!(validate_device_name("dns-1").is_valid);

        assert!(!validate_device_name("").is_valid);
        assert!(!validate_device_name("   ").is_valid);
        assert!(!validate_device_name("a,b").is_valid);
    }

    #[test]
    fn test_ping_address_validation() {
        assert!(validate_ping_address("8.8.8.8").is_valid);
        assert!(validate_ping_address("2606:4700:4700::1111").is_valid);
        assert!(validate_ping_address("router.local").is_valid);

        assert!(!validate_ping_address("").is_valid);
        assert!(!validate_ping_address("bad host").is_valid);
        assert!(!validate_ping_address("-router").is_valid);
    }

    #[test]
    fn test_tcp_address_validation() {
        assert!(validate_tcp_address("example.com:443").is_valid);
        assert!(validate_tcp_address("10.0.0.1:22").is_valid);

        assert!(!validate_tcp_address("example.com").is_valid);
        assert!(!validate_tcp_address(":443").is_valid);
        assert!(!validate_tcp_address("example.com:0").is_valid);
        assert!(!validate_tcp_address("example.com:notaport").is_valid);
    }

    #[test]
    fn test_timeout_must_be_less_than_interval() {
        assert!(validate_timeout(5, 30).is_valid);
        assert!(!validate_timeout(30, 30).is_valid);
        assert!(!validate_timeout(31, 30).is_valid);
        assert!(!validate_timeout(0, 30).is_valid);
    }

    #[test]
    fn test_empty_device_set_is_fatal() {
        let mut config = Config::default();
        config.devices.clear();

        let result = validate_config(&config);
        assert!(!result.is_valid);
        assert!(result.to_result().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_valid);
    }
}
