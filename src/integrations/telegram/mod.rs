// src/integrations/telegram/mod.rs
//
// Telegram Bot API publisher.

pub mod client;

pub use client::TelegramClient;
