//! Clan ranks and the permission table that governs privileged actions.
//!
//! Ranks are totally ordered: `None < Member < Admin < Owner`. `None` is never stored
//! for a member; it is the sentinel for "not a member" and for rank text that did not parse.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Rank {
    #[default]
    None,
    Member,
    Admin,
    Owner,
}

/// Privileged actions an actor may attempt against their own clan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClanAction {
    Invite,
    RevokeInvite,
    Kick,
    ChangeRank,
    Disband,
}

impl Rank {
    /// Whether a member holding this rank may perform `action`.
    ///
    /// Owners may do everything. Admins may manage invitations and kick, but never
    /// change ranks or disband. Members (and non-members) may do none of these.
    pub fn permits(self, action: ClanAction) -> bool {
        match self {
            Rank::Owner => true,
            Rank::Admin => matches!(
                action,
                ClanAction::Invite | ClanAction::RevokeInvite | ClanAction::Kick
            ),
            Rank::Member | Rank::None => false,
        }
    }

    /// True for ranks that represent real membership.
    pub fn is_member(self) -> bool {
        self != Rank::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::None => "None",
            Rank::Member => "Member",
            Rank::Admin => "Admin",
            Rank::Owner => "Owner",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            ClanAction::Invite => "invite",
            ClanAction::RevokeInvite => "revoke invitations",
            ClanAction::Kick => "kick",
            ClanAction::ChangeRank => "change ranks",
            ClanAction::Disband => "disband",
        };
        f.write_str(verb)
    }
}

/// Parse user supplied rank text, case-insensitively.
///
/// Returns [`Rank::None`] for anything other than `member`, `admin` or `owner`
/// (surrounding whitespace is ignored). Callers treat `None` as a parse failure.
pub fn parse_rank(text: &str) -> Rank {
    match text.trim().to_ascii_lowercase().as_str() {
        "member" => Rank::Member,
        "admin" => Rank::Admin,
        "owner" => Rank::Owner,
        _ => Rank::None,
    }
}
