use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("tessera")
        .about("Credential issuance service")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8000")
                .env("TESSERA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("TESSERA_DSN")
                .required(true),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Process-wide secret used to sign and verify bearer tokens")
                .env("TESSERA_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .help("Bearer token lifetime in seconds")
                .default_value("86400")
                .env("TESSERA_TOKEN_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("rate-limit-window")
                .long("rate-limit-window")
                .help("Verification rate-limit window in seconds")
                .default_value("60")
                .env("TESSERA_RATE_LIMIT_WINDOW")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("rate-limit-max")
                .long("rate-limit-max")
                .help("Verification attempts allowed per client within the window")
                .default_value("6")
                .env("TESSERA_RATE_LIMIT_MAX")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("TESSERA_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
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
            Some("Credential issuance service".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_dsn() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "tessera",
            "--dsn",
            "postgres://localhost/tessera",
            "--token-secret",
            "s3cret",
            "--port",
            "9000",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9000));
        assert_eq!(
            matches.get_one::<String>("dsn").map(String::as_str),
            Some("postgres://localhost/tessera")
        );
    }

    #[test]
    fn test_defaults() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "tessera",
            "--dsn",
            "postgres://localhost/tessera",
            "--token-secret",
            "s3cret",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8000));
        assert_eq!(matches.get_one::<i64>("token-ttl").copied(), Some(86400));
        assert_eq!(
            matches.get_one::<u64>("rate-limit-window").copied(),
            Some(60)
        );
        assert_eq!(matches.get_one::<u32>("rate-limit-max").copied(), Some(6));
    }

    #[test]
    fn test_token_secret_from_env() {
        temp_env::with_var("TESSERA_TOKEN_SECRET", Some("from-env"), || {
            let command = new();
            let matches =
                command.get_matches_from(vec!["tessera", "--dsn", "postgres://localhost/tessera"]);
            assert_eq!(
                matches
                    .get_one::<String>("token-secret")
                    .map(String::as_str),
                Some("from-env")
            );
        });
    }

    #[test]
    fn test_missing_dsn_fails() {
        temp_env::with_vars(
            [
                ("TESSERA_DSN", None::<&str>),
                ("TESSERA_TOKEN_SECRET", Some("s3cret")),
            ],
            || {
                let command = new();
                let result = command.try_get_matches_from(vec!["tessera"]);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn test_verbosity_count() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "tessera",
            "--dsn",
            "postgres://localhost/tessera",
            "--token-secret",
            "s3cret",
            "-vvv",
        ]);
        assert_eq!(matches.get_count("verbosity"), 3);
    }
}
