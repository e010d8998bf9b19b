use secrecy::SecretString;

/// Process-wide secrets, read-only after startup.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self { token_secret }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("s3cret".to_string()));
        assert_eq!(args.token_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let args = GlobalArgs::new(SecretString::from("s3cret".to_string()));
        let debug = format!("{args:?}");
        assert!(!debug.contains("s3cret"));
    }
}
