use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

/// Turn parsed arguments into an action plus the process-wide secrets.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let token_secret = matches
        .get_one::<String>("token-secret")
        .map(|s| SecretString::from(s.clone()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-secret"))?;

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8000),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        token_ttl_seconds: matches
            .get_one::<i64>("token-ttl")
            .copied()
            .unwrap_or(24 * 60 * 60),
        rate_limit_window_seconds: matches
            .get_one::<u64>("rate-limit-window")
            .copied()
            .unwrap_or(60),
        rate_limit_max_attempts: matches
            .get_one::<u32>("rate-limit-max")
            .copied()
            .unwrap_or(6),
    };

    Ok((action, GlobalArgs::new(token_secret)))
}
