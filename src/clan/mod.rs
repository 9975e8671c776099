//! # Clan Membership & Invitation Engine
//!
//! - [`rank`] - the `None < Member < Admin < Owner` ordering and the permission table
//! - [`model`] - a single [`Clan`]: owner, member ranks, pending invitations
//! - [`registry`] - all clans plus the cross-clan rules (unique names, one clan per identity)
//! - [`service`] - [`ClanService`], the lock-guarded session object hosts talk to
//! - [`errors`] - [`ClanError`] and its [`ErrorKind`] classification
//!
//! Operations take already-resolved identity strings and return structured results;
//! turning them into player-facing text is the host's job (see [`crate::commands`]
//! for a ready-made chat command layer).
//!
//! ```rust
//! use clanhall::clan::{ClanService, Rank};
//!
//! let clans = ClanService::in_memory();
//! clans.create_clan("Raptors", "alice").unwrap();
//! clans.invite_player("alice", "bob").unwrap();
//! clans.accept_invite("bob", "Raptors").unwrap();
//! assert_eq!(clans.query_rank_of("bob"), Rank::Member);
//! ```

pub mod errors;
pub mod model;
pub mod rank;
pub mod registry;
pub mod service;

pub use errors::{ClanError, ErrorKind};
pub use model::Clan;
pub use rank::{parse_rank, ClanAction, Rank};
pub use registry::{LeaveOutcome, Registry};
pub use service::ClanService;
