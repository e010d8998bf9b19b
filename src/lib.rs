pub mod auth;
pub mod cli;
pub mod store;
pub mod tessera;
