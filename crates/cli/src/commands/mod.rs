pub mod config_cmd;
pub mod score;
pub mod session;
