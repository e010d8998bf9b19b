pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_ttl_seconds: i64,
        rate_limit_window_seconds: u64,
        rate_limit_max_attempts: u32,
    },
}
