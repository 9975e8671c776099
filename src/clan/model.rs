//! A single clan: its owner, member ranks and pending invitations.

use std::collections::{HashMap, HashSet};

use crate::clan::errors::ClanError;
use crate::clan::rank::Rank;

/// A named group of identities with per-member rank.
///
/// Invariants kept by every method:
/// - `owner` is a member and is the only member ranked [`Rank::Owner`];
/// - no member is ranked [`Rank::None`];
/// - an identity is never both a member and a pending invitee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clan {
    name: String,
    owner: String,
    members: HashMap<String, Rank>,
    pending_invites: HashSet<String>,
}

impl Clan {
    /// Found a new clan. The founder becomes owner and sole member.
    pub fn new(name: &str, founder: &str) -> Self {
        let mut members = HashMap::new();
        members.insert(founder.to_string(), Rank::Owner);
        Self {
            name: name.to_string(),
            owner: founder.to_string(),
            members,
            pending_invites: HashSet::new(),
        }
    }

    /// Rebuild a clan from stored parts, checking every clan invariant.
    pub(crate) fn from_parts(
        name: String,
        owner: String,
        members: HashMap<String, Rank>,
        pending_invites: HashSet<String>,
    ) -> Result<Self, ClanError> {
        let clan = Self { name, owner, members, pending_invites };
        clan.check_invariants().map_err(ClanError::CorruptData)?;
        Ok(clan)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn members(&self) -> &HashMap<String, Rank> {
        &self.members
    }

    pub fn pending_invites(&self) -> &HashSet<String> {
        &self.pending_invites
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, identity: &str) -> bool {
        self.members.contains_key(identity)
    }

    /// Rank of `identity`, or [`Rank::None`] when not a member.
    pub fn get_member_rank(&self, identity: &str) -> Rank {
        self.members.get(identity).copied().unwrap_or(Rank::None)
    }

    /// Insert or re-rank a member.
    ///
    /// Granting [`Rank::Owner`] is refused: ownership is fixed at founding. The owner's
    /// own rank cannot be changed here either. Any pending invite for `identity` is cleared.
    pub fn add_member(&mut self, identity: &str, rank: Rank) -> Result<(), ClanError> {
        match rank {
            Rank::None => return Err(ClanError::InvalidRank(rank.to_string())),
            Rank::Owner => return Err(ClanError::OwnerTransferNotAllowed),
            Rank::Member | Rank::Admin => {}
        }
        if identity == self.owner {
            return Err(ClanError::CannotRankOwner);
        }
        self.pending_invites.remove(identity);
        self.members.insert(identity.to_string(), rank);
        Ok(())
    }

    /// Remove a member, returning their former rank.
    ///
    /// No-op (returns `None`) when absent. The owner is never removed this way: a
    /// clan without its owner must be disbanded instead.
    pub fn remove_member(&mut self, identity: &str) -> Option<Rank> {
        if identity == self.owner {
            return None;
        }
        self.members.remove(identity)
    }

    pub fn invite(&mut self, identity: &str) -> Result<(), ClanError> {
        if self.is_member(identity) {
            return Err(ClanError::TargetAlreadyMember(identity.to_string()));
        }
        if !self.pending_invites.insert(identity.to_string()) {
            return Err(ClanError::AlreadyInvited(identity.to_string()));
        }
        Ok(())
    }

    pub fn is_invited(&self, identity: &str) -> bool {
        self.pending_invites.contains(identity)
    }

    /// Withdraw a pending invitation. Returns false if there was none.
    pub fn revoke_invite(&mut self, identity: &str) -> bool {
        self.pending_invites.remove(identity)
    }

    /// Turn a pending invitation into membership at [`Rank::Member`].
    pub fn accept_invite(&mut self, identity: &str) -> Result<(), ClanError> {
        if !self.pending_invites.remove(identity) {
            return Err(ClanError::NotInvited {
                identity: identity.to_string(),
                clan: self.name.clone(),
            });
        }
        self.members.insert(identity.to_string(), Rank::Member);
        Ok(())
    }

    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("clan with empty name".to_string());
        }
        if self.members.contains_key("") || self.pending_invites.contains("") {
            return Err(format!("clan '{}': empty identity", self.name));
        }
        if self.members.get(&self.owner) != Some(&Rank::Owner) {
            return Err(format!(
                "clan '{}': owner '{}' is not a member ranked Owner",
                self.name, self.owner
            ));
        }
        for (identity, rank) in &self.members {
            match rank {
                Rank::None => {
                    return Err(format!("clan '{}': member '{}' has rank None", self.name, identity))
                }
                Rank::Owner if identity != &self.owner => {
                    return Err(format!(
                        "clan '{}': second owner '{}'",
                        self.name, identity
                    ))
                }
                _ => {}
            }
            if self.pending_invites.contains(identity) {
                return Err(format!(
                    "clan '{}': '{}' is both member and invitee",
                    self.name, identity
                ));
            }
        }
        Ok(())
    }
}
