use crate::auth::AuthConfig;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::tessera;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_ttl_seconds,
            rate_limit_window_seconds,
            rate_limit_max_attempts,
        } => {
            let config = AuthConfig::new()
                .with_token_ttl_seconds(token_ttl_seconds)
                .with_rate_limit_window_seconds(rate_limit_window_seconds)
                .with_rate_limit_max_attempts(rate_limit_max_attempts);

            tessera::new(port, dsn, globals, config).await?;
        }
    }

    Ok(())
}
