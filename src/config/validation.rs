//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (quotas > 0, probability in [0, 1])
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GuardConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("endpoint name must not be empty")]
    EmptyEndpointName,

    #[error("endpoint '{0}': max must be greater than zero")]
    ZeroQuotaMax(String),

    #[error("endpoint '{0}': window_ms must be greater than zero")]
    ZeroQuotaWindow(String),

    #[error("rate_limit.sweep_probability must be within [0, 1]")]
    SweepProbabilityOutOfRange,

    #[error("gate.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("gate.max_transport_bytes must be at least gate.max_body_bytes")]
    TransportBelowBodyLimit,

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("audit.rpc_url: invalid URL '{0}'")]
    InvalidAuditUrl(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (name, quota) in &config.rate_limit.endpoints {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyEndpointName);
        }
        if quota.max == 0 {
            errors.push(ValidationError::ZeroQuotaMax(name.clone()));
        }
        if quota.window_ms == 0 {
            errors.push(ValidationError::ZeroQuotaWindow(name.clone()));
        }
    }

    let probability = config.rate_limit.sweep_probability;
    if !(0.0..=1.0).contains(&probability) {
        errors.push(ValidationError::SweepProbabilityOutOfRange);
    }

    if config.gate.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.gate.max_transport_bytes < config.gate.max_body_bytes {
        errors.push(ValidationError::TransportBelowBodyLimit);
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if !config.audit.rpc_url.is_empty() && url::Url::parse(&config.audit.rpc_url).is_err() {
        errors.push(ValidationError::InvalidAuditUrl(config.audit.rpc_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EndpointQuota;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GuardConfig::default();
        config
            .rate_limit
            .endpoints
            .insert("broken".into(), EndpointQuota::new(0, 0));
        config.rate_limit.sweep_probability = 1.5;
        config.gate.max_body_bytes = 0;
        config.listener.bind_address = "not-an-address".into();
        config.audit.rpc_url = "::nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroQuotaMax("broken".into())));
        assert!(errors.contains(&ValidationError::ZeroQuotaWindow("broken".into())));
        assert!(errors.contains(&ValidationError::SweepProbabilityOutOfRange));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::InvalidAuditUrl("::nope".into())));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_transport_cap_below_body_limit() {
        let mut config = GuardConfig::default();
        config.gate.max_transport_bytes = config.gate.max_body_bytes - 1;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::TransportBelowBodyLimit]);
    }

    #[test]
    fn test_admin_address_checked_only_when_enabled() {
        let mut config = GuardConfig::default();
        config.admin.bind_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.admin.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
