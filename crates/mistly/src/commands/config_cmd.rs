//! Config subcommand handlers.

use dialoguer::Password;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

const REDACTED: &str = "********";

const VALID_KEYS: &str = "api_url, org_id, api_token, api_token_env, case_insensitive_names, \
                          max_concurrent_sites, ca_cert, insecure, timeout";

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            mistly_config::parse_api_url(&value)?;
            profile.api_url = value;
        }
        "org_id" | "org-id" | "org" => profile.org_id = Some(value),
        "api_token" | "api-token" => profile.api_token = Some(value),
        "api_token_env" | "api-token-env" => profile.api_token_env = Some(value),
        "case_insensitive_names" | "case-insensitive-names" => {
            profile.case_insensitive_names =
                parse_value(key, &value, "must be 'true' or 'false'")?;
        }
        "max_concurrent_sites" | "max-concurrent-sites" => {
            let n: usize = parse_value(key, &value, "must be a positive number")?;
            if n == 0 {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.max_concurrent_sites = Some(n);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "must be 'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "must be a number (seconds)")?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_token.is_some() {
            profile.api_token = Some(REDACTED.into());
        }
    }
    cfg
}

fn render_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, render_toml, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            let path = config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}' ({})", path.display());
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let token = Password::new()
                .with_prompt(format!("API token for '{profile_name}'"))
                .interact()
                .map_err(util::prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "api_token".into(),
                    reason: "token cannot be empty".into(),
                });
            }

            mistly_config::store_api_token(&profile_name, token.trim())?;
            eprintln!("✓ API token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: mistly config set org_id <ORG>");
                return Ok(());
            }
            let default = cfg.default_profile_name();
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
