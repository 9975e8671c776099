//! # Clanhall - Clan Membership & Invitation Engine
//!
//! Clanhall manages named groups of players ("clans") for multiplayer game hosts:
//! founding, invitations, ranks, kicks and disbanding, backed by a durable store that
//! survives restarts.
//!
//! ## Features
//!
//! - **Ranked Membership**: Member, Admin and Owner ranks with a fixed permission table.
//! - **Invitation Handshake**: Explicit pending invitations that can be accepted, declined or revoked.
//! - **Registry Invariants**: One owner per clan, unique clan names, one clan per player.
//! - **Durable Storage**: Versioned JSON snapshot written atomically after each change.
//! - **Chat Commands**: Optional `/clan ...` parser and reply formatter for hosts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clanhall::config::Config;
//! use clanhall::clan::ClanService;
//! use clanhall::commands::handle_clan_command;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let clans = ClanService::from_config(&config)?;
//!
//!     if let Some(reply) = handle_clan_command(&clans, "alice", "/clan create Raptors") {
//!         println!("{}", reply.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`clan`] - Ranks, clans, the registry and the lock-guarded service
//! - [`storage`] - Snapshot codec and the atomic file store
//! - [`commands`] - Chat command parsing and player-facing replies
//! - [`config`] - Configuration management
//! - [`validation`] - Clan name and identity validation
//! - [`logutil`] - Logger setup and log-safe escaping

pub mod clan;
pub mod commands;
pub mod config;
pub mod logutil;
pub mod storage;
pub mod validation;
