//! Map parsed arguments to an [`Action`].
//!
//! Issuer configuration is validated here, before any store connection is
//! attempted, so a bad secret or TTL pair never reaches the network.

use crate::cli::actions::Action;
use crate::cli::commands::issuer;
use crate::session::Identity;
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use url::Url;

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: {name}"))
}

/// # Errors
/// Returns an error if required arguments are missing or the issuer
/// configuration is inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let config = issuer::Options::parse(matches)?;
    config
        .validate()
        .context("invalid issuer configuration")?;

    let subcommand = matches.subcommand_name().unwrap_or_default();
    if matches!(subcommand, "resolve" | "refresh" | "revoke")
        && Url::parse(config.store_url()).is_ok_and(|url| url.scheme() == "memory")
    {
        bail!("{subcommand} needs a persistent store; memory:// is empty in every invocation");
    }

    match matches.subcommand() {
        Some(("issue", sub)) => Ok(Action::Issue {
            config,
            identity: Identity::new(
                required(sub, "id")?,
                required(sub, "username")?,
                required(sub, "email")?,
                required(sub, "phone")?,
            ),
        }),
        Some(("verify", sub)) => Ok(Action::Verify {
            config,
            token: required(sub, "token")?,
            refresh: sub.get_flag("refresh"),
        }),
        Some(("resolve", sub)) => Ok(Action::Resolve {
            config,
            token: required(sub, "token")?,
        }),
        Some(("refresh", sub)) => Ok(Action::Refresh {
            config,
            token: required(sub, "token")?,
        }),
        Some(("revoke", sub)) => Ok(Action::Revoke {
            config,
            session_ids: sub
                .get_many::<String>("session-id")
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default(),
        }),
        _ => Err(anyhow!("no subcommand given")),
    }
}
