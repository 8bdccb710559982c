pub mod cooldown;
pub mod engine;
pub mod format;
pub mod rules;
pub mod sink;
pub mod telegram;
