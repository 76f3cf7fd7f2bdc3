pub mod chat;
pub mod cost;
pub mod prompt;
pub mod views;
