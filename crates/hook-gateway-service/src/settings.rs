//! Layered configuration loading.
//!
//! Sources, applied in order (later sources override earlier ones):
//!  1. `/etc/hook-gateway/service.yaml`, system-wide defaults
//!  2. `./config/service.yaml`, deployment-local override
//!  3. an explicit file from `--config` / `HOOK_GATEWAY_CONFIG`
//!  4. environment variables prefixed `HG__` with `__` as separator,
//!     e.g. `HG__SERVER__PORT=9090` sets `server.port`
//!
//! Absent optional files are ignored. A malformed file, an environment value
//! of the wrong type or a configuration failing validation is an error.

use hook_gateway_api::{ConfigError, ServiceConfig};
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "HG";

const SYSTEM_CONFIG: &str = "/etc/hook-gateway/service";
const LOCAL_CONFIG: &str = "config/service";

/// Load and validate the service configuration.
///
/// `env` replaces the process environment as the source of `HG__` variables
/// when given.
pub fn load_config(
    explicit: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name(SYSTEM_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name(LOCAL_CONFIG)
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Some(path) = explicit {
        builder = builder.add_source(
            config::File::from(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .source(env),
        )
        .build()
        .map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })?;

    let service_config: ServiceConfig =
        config.try_deserialize().map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })?;

    service_config.validate()?;
    Ok(service_config)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
