//! CLI configuration: thin wrapper around `mistly_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --org, --api-token, --timeout, --insecure).

use secrecy::SecretString;

use mistly_core::{AssignConfig, ConnectionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use mistly_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the core configs from the config file, profile, and CLI overrides.
///
/// Without a matching profile, flags alone are enough as long as `--org`
/// is given.
pub fn resolve_configs(global: &GlobalOpts) -> Result<(ConnectionConfig, AssignConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        None if global.org.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };

    apply_overrides(&mut profile, global, cfg.defaults.timeout);

    let assign = mistly_config::assign_config(&profile, &profile_name)?;
    let token = match global.api_token {
        Some(ref token) => SecretString::from(token.clone()),
        None => mistly_config::resolve_api_token(&profile, &profile_name)?,
    };
    let connection = mistly_config::connection_config(&profile, token)?;

    tracing::debug!(
        profile = %profile_name,
        api_url = %connection.url,
        org = %assign.org_id,
        "resolved configuration"
    );
    Ok((connection, assign))
}

/// Flag > env > profile > defaults.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts, default_timeout: u64) {
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(ref org) = global.org {
        profile.org_id = Some(org.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile.timeout = Some(global.timeout.or(profile.timeout).unwrap_or(default_timeout));
}
