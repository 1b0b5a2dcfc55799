pub mod archive;
pub mod config;
pub mod generate;
pub mod health;
pub mod illustration;
pub mod tui;
