//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Error returned when an environment variable without default is unset.
struct LookupError {
    var_name: String,
}

/// Expand environment variable references in `value`.
///
/// Values without `${` are returned untouched. Any other value goes through
/// shell-style expansion as a whole, so a bare `$VAR` next to a braced one is
/// expanded too. `field` is the config path reported when a variable is
/// missing.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.var_name),
    })
}
