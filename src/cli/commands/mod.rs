pub mod issuer;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

fn token_arg() -> Arg {
    Arg::new("token").help("Signed token").required(true)
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("tessera")
        .about("Dual-token session issuer")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("issue")
                .about("Issue an access/refresh token pair for an authenticated identity")
                .arg(Arg::new("id").long("id").help("User id").required(true))
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("Username")
                        .required(true),
                )
                .arg(Arg::new("email").long("email").help("Email").required(true))
                .arg(Arg::new("phone").long("phone").help("Phone").required(true)),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify a token signature and expiry, print its claims")
                .arg(token_arg())
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .help("Verify as a refresh token instead of an access token")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve an access token to its stored identity")
                .arg(token_arg()),
        )
        .subcommand(
            Command::new("refresh")
                .about("Exchange a refresh token for a new token pair")
                .arg(token_arg()),
        )
        .subcommand(
            Command::new("revoke")
                .about("Delete session records by session id")
                .arg(
                    Arg::new("session-id")
                        .help("Session ids to revoke")
                        .required(true)
                        .num_args(1..),
                ),
        );

    let command = issuer::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "tessera");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Dual-token session issuer".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_debug_assert() {
        new().debug_assert();
    }

    #[test]
    fn test_check_issue_args() {
        temp_env::with_vars(
            [
                ("TESSERA_ACCESS_TTL_SECONDS", None::<&str>),
                ("TESSERA_REFRESH_TTL_SECONDS", None),
            ],
            check_issue_args,
        );
    }

    fn check_issue_args() {
        let matches = new().get_matches_from(vec![
            "tessera",
            "--access-secret",
            "a-secret",
            "--refresh-secret",
            "r-secret",
            "issue",
            "--id",
            "u1",
            "--username",
            "alice",
            "--email",
            "a@x.com",
            "--phone",
            "555",
        ]);

        assert_eq!(
            matches.get_one::<String>("access-secret").map(String::as_str),
            Some("a-secret")
        );
        assert_eq!(matches.get_one::<u64>("access-ttl-seconds").copied(), Some(900));
        assert_eq!(
            matches.get_one::<u64>("refresh-ttl-seconds").copied(),
            Some(604_800)
        );

        let Some(("issue", sub)) = matches.subcommand() else {
            panic!("expected issue subcommand");
        };
        assert_eq!(sub.get_one::<String>("username").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("TESSERA_ACCESS_SECRET", Some("env-access")),
                ("TESSERA_REFRESH_SECRET", Some("env-refresh")),
                ("TESSERA_ACCESS_TTL_SECONDS", Some("60")),
                ("TESSERA_REFRESH_TTL_SECONDS", Some("3600")),
                ("TESSERA_STORE_URL", Some("memory://")),
                ("TESSERA_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["tessera", "resolve", "token"]);
                assert_eq!(
                    matches.get_one::<String>("access-secret").map(String::as_str),
                    Some("env-access")
                );
                assert_eq!(matches.get_one::<u64>("access-ttl-seconds").copied(), Some(60));
                assert_eq!(
                    matches.get_one::<u64>("refresh-ttl-seconds").copied(),
                    Some(3600)
                );
                assert_eq!(
                    matches.get_one::<String>("store-url").map(String::as_str),
                    Some("memory://")
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("TESSERA_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["tessera", "verify", "token"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5usize {
            temp_env::with_vars([("TESSERA_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["tessera".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }
                args.push("verify".to_string());
                args.push("token".to_string());

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_revoke_takes_many_ids() {
        let matches = new().get_matches_from(vec!["tessera", "revoke", "a", "b", "c"]);
        let Some(("revoke", sub)) = matches.subcommand() else {
            panic!("expected revoke subcommand");
        };
        let ids: Vec<&String> = sub
            .get_many::<String>("session-id")
            .map(Iterator::collect)
            .unwrap_or_default();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_subcommand_required() {
        temp_env::with_vars([("TESSERA_LOG_LEVEL", None::<String>)], || {
            assert!(new().try_get_matches_from(vec!["tessera"]).is_err());
        });
    }
}
