use crate::config::{
    IssuerConfig, DEFAULT_ACCESS_SESSION_ID_LEN, DEFAULT_ACCESS_TTL_SECONDS,
    DEFAULT_REFRESH_SESSION_ID_LEN, DEFAULT_REFRESH_TTL_SECONDS, DEFAULT_STORE_TIMEOUT_MS,
};
use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_ACCESS_SECRET: &str = "access-secret";
pub const ARG_REFRESH_SECRET: &str = "refresh-secret";
pub const ARG_ACCESS_TTL_SECONDS: &str = "access-ttl-seconds";
pub const ARG_REFRESH_TTL_SECONDS: &str = "refresh-ttl-seconds";
pub const ARG_STORE_URL: &str = "store-url";
pub const ARG_STORE_TIMEOUT_MS: &str = "store-timeout-ms";
pub const ARG_ACCESS_SESSION_ID_LEN: &str = "access-session-id-len";
pub const ARG_REFRESH_SESSION_ID_LEN: &str = "refresh-session-id-len";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    let command = with_ttl_args(command);
    with_store_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_SECRET)
                .long(ARG_ACCESS_SECRET)
                .help("HMAC secret for access tokens")
                .env("TESSERA_ACCESS_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_SECRET)
                .long(ARG_REFRESH_SECRET)
                .help("HMAC secret for refresh tokens, must differ from the access secret")
                .env("TESSERA_REFRESH_SECRET")
                .hide_env_values(true)
                .global(true),
        )
}

fn with_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TTL_SECONDS)
                .long(ARG_ACCESS_TTL_SECONDS)
                .help("Access token and session lifetime in seconds")
                .env("TESSERA_ACCESS_TTL_SECONDS")
                .default_value("900")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL_SECONDS)
                .long(ARG_REFRESH_TTL_SECONDS)
                .help("Refresh token and session lifetime in seconds")
                .env("TESSERA_REFRESH_TTL_SECONDS")
                .default_value("604800")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_ACCESS_SESSION_ID_LEN)
                .long(ARG_ACCESS_SESSION_ID_LEN)
                .help("Length of access session identifiers")
                .env("TESSERA_ACCESS_SESSION_ID_LEN")
                .default_value("30")
                .global(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_REFRESH_SESSION_ID_LEN)
                .long(ARG_REFRESH_SESSION_ID_LEN)
                .help("Length of refresh session identifiers")
                .env("TESSERA_REFRESH_SESSION_ID_LEN")
                .default_value("60")
                .global(true)
                .value_parser(clap::value_parser!(usize)),
        )
}

fn with_store_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORE_URL)
                .long(ARG_STORE_URL)
                .help("Session store URL: redis://, rediss:// or memory:// (issue and verify only, not persisted)")
                .env("TESSERA_STORE_URL")
                .default_value("redis://127.0.0.1:6379/0")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STORE_TIMEOUT_MS)
                .long(ARG_STORE_TIMEOUT_MS)
                .help("Timeout for each session store operation in milliseconds")
                .env("TESSERA_STORE_TIMEOUT_MS")
                .default_value("2000")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
}

pub struct Options;

impl Options {
    /// Build an unvalidated [`IssuerConfig`] from parsed arguments.
    ///
    /// # Errors
    /// Returns an error if a secret is missing.
    pub fn parse(matches: &ArgMatches) -> Result<IssuerConfig> {
        let access_secret = matches
            .get_one::<String>(ARG_ACCESS_SECRET)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_ACCESS_SECRET}"))?;
        let refresh_secret = matches
            .get_one::<String>(ARG_REFRESH_SECRET)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{ARG_REFRESH_SECRET}"))?;

        let seconds = |name: &str, default: u64| {
            Duration::from_secs(matches.get_one::<u64>(name).copied().unwrap_or(default))
        };
        let length = |name: &str, default: usize| {
            matches.get_one::<usize>(name).copied().unwrap_or(default)
        };

        let mut config =
            IssuerConfig::new(SecretString::from(access_secret), SecretString::from(refresh_secret))
                .with_access_ttl(seconds(ARG_ACCESS_TTL_SECONDS, DEFAULT_ACCESS_TTL_SECONDS))
                .with_refresh_ttl(seconds(ARG_REFRESH_TTL_SECONDS, DEFAULT_REFRESH_TTL_SECONDS))
                .with_session_id_lengths(
                    length(ARG_ACCESS_SESSION_ID_LEN, DEFAULT_ACCESS_SESSION_ID_LEN),
                    length(ARG_REFRESH_SESSION_ID_LEN, DEFAULT_REFRESH_SESSION_ID_LEN),
                )
                .with_store_timeout(Duration::from_millis(
                    matches
                        .get_one::<u64>(ARG_STORE_TIMEOUT_MS)
                        .copied()
                        .unwrap_or(DEFAULT_STORE_TIMEOUT_MS),
                ));

        if let Some(url) = matches.get_one::<String>(ARG_STORE_URL) {
            config = config.with_store_url(url.clone());
        }

        Ok(config)
    }
}
