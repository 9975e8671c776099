//! The set of all clans and the cross-clan rules over identities.
//!
//! Every check that spans clans (an identity belongs to at most one clan, clan names
//! are unique) lives here. Authorisation runs in a fixed order: actor membership,
//! actor permission, target existence, self-targeting, then the operation's own
//! conflict checks. The first failure is reported.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::clan::errors::ClanError;
use crate::clan::model::Clan;
use crate::clan::rank::{ClanAction, Rank};
use crate::logutil::escape_log;

/// Result of [`Registry::leave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub clan: String,
    /// True when the leaver was the owner and the clan was removed.
    pub disbanded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    clans: HashMap<String, Clan>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-validated clans, enforcing name uniqueness and
    /// single membership across clans.
    pub fn from_clans(clans: impl IntoIterator<Item = Clan>) -> Result<Self, ClanError> {
        let mut registry = Registry::new();
        for clan in clans {
            let name = clan.name().to_string();
            if registry.clans.insert(name.clone(), clan).is_some() {
                return Err(ClanError::CorruptData(format!("duplicate clan '{}'", name)));
            }
        }
        registry.check_invariants().map_err(ClanError::CorruptData)?;
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.clans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clans.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Clan> {
        self.clans.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clans.contains_key(name)
    }

    pub fn clans(&self) -> impl Iterator<Item = &Clan> {
        self.clans.values()
    }

    /// The clan `identity` belongs to, if any.
    pub fn clan_of(&self, identity: &str) -> Option<&Clan> {
        self.clans.values().find(|clan| clan.is_member(identity))
    }

    /// `identity`'s rank in its clan, [`Rank::None`] if it has none.
    pub fn rank_of(&self, identity: &str) -> Rank {
        self.clan_of(identity)
            .map(|clan| clan.get_member_rank(identity))
            .unwrap_or(Rank::None)
    }

    pub fn is_in_clan(&self, identity: &str) -> bool {
        self.clan_of(identity).is_some()
    }

    pub fn create_clan(&mut self, name: &str, founder: &str) -> Result<(), ClanError> {
        if name.is_empty() {
            return Err(ClanError::InvalidName("clan name is empty".to_string()));
        }
        if founder.is_empty() {
            return Err(ClanError::InvalidIdentity("identity is empty".to_string()));
        }
        if self.is_in_clan(founder) {
            return Err(ClanError::AlreadyInClan(founder.to_string()));
        }
        if self.clans.contains_key(name) {
            return Err(ClanError::NameTaken(name.to_string()));
        }
        self.drop_invites_for(founder);
        self.clans.insert(name.to_string(), Clan::new(name, founder));
        info!("Clan '{}' created by {}", escape_log(name), escape_log(founder));
        Ok(())
    }

    /// Remove a clan unconditionally. Authorisation is the caller's concern.
    pub fn disband_clan(&mut self, name: &str) -> Result<Clan, ClanError> {
        let clan = self
            .clans
            .remove(name)
            .ok_or_else(|| ClanError::ClanNotFound(name.to_string()))?;
        info!("Clan '{}' disbanded ({} members)", escape_log(name), clan.member_count());
        Ok(clan)
    }

    /// Leave the current clan. An owner leaving disbands the clan.
    pub fn leave(&mut self, identity: &str) -> Result<LeaveOutcome, ClanError> {
        let (clan_name, rank) = self.membership(identity)?;
        if rank == Rank::Owner {
            self.disband_clan(&clan_name)?;
            return Ok(LeaveOutcome { clan: clan_name, disbanded: true });
        }
        self.clan_mut(&clan_name)?.remove_member(identity);
        debug!("{} left clan '{}'", escape_log(identity), escape_log(&clan_name));
        Ok(LeaveOutcome { clan: clan_name, disbanded: false })
    }

    pub fn change_rank(&mut self, actor: &str, target: &str, new_rank: Rank) -> Result<Rank, ClanError> {
        let (clan_name, _) = self.authorize(actor, ClanAction::ChangeRank)?;
        if new_rank == Rank::None {
            return Err(ClanError::InvalidRank(new_rank.to_string()));
        }
        let clan = self.clan_mut(&clan_name)?;
        let current = clan.get_member_rank(target);
        if current == Rank::None {
            return Err(ClanError::TargetNotMember(target.to_string()));
        }
        if actor == target {
            return Err(ClanError::CannotTargetSelf(ClanAction::ChangeRank));
        }
        if current == Rank::Owner {
            return Err(ClanError::CannotRankOwner);
        }
        clan.add_member(target, new_rank)?;
        debug!(
            "{} ranked {} as {} in clan '{}'",
            escape_log(actor),
            escape_log(target),
            new_rank,
            escape_log(&clan_name)
        );
        Ok(new_rank)
    }

    /// Invite `target` into the actor's clan. Returns the clan name.
    pub fn invite_player(&mut self, actor: &str, target: &str) -> Result<String, ClanError> {
        let (clan_name, _) = self.authorize(actor, ClanAction::Invite)?;
        if target.is_empty() {
            return Err(ClanError::InvalidIdentity("identity is empty".to_string()));
        }
        {
            let clan = self.clan_ref(&clan_name)?;
            if clan.is_member(target) {
                return Err(ClanError::TargetAlreadyMember(target.to_string()));
            }
            if clan.is_invited(target) {
                return Err(ClanError::AlreadyInvited(target.to_string()));
            }
        }
        if self.is_in_clan(target) {
            return Err(ClanError::TargetAlreadyInClan(target.to_string()));
        }
        self.clan_mut(&clan_name)?.invite(target)?;
        debug!(
            "{} invited {} to clan '{}'",
            escape_log(actor),
            escape_log(target),
            escape_log(&clan_name)
        );
        Ok(clan_name)
    }

    pub fn revoke_invite(&mut self, actor: &str, target: &str) -> Result<(), ClanError> {
        let (clan_name, _) = self.authorize(actor, ClanAction::RevokeInvite)?;
        if !self.clan_mut(&clan_name)?.revoke_invite(target) {
            return Err(ClanError::NotInvited { identity: target.to_string(), clan: clan_name });
        }
        debug!(
            "{} revoked invitation of {} to clan '{}'",
            escape_log(actor),
            escape_log(target),
            escape_log(&clan_name)
        );
        Ok(())
    }

    pub fn kick_player(&mut self, actor: &str, target: &str) -> Result<(), ClanError> {
        let (clan_name, _) = self.authorize(actor, ClanAction::Kick)?;
        let clan = self.clan_mut(&clan_name)?;
        let current = clan.get_member_rank(target);
        if current == Rank::None {
            return Err(ClanError::TargetNotMember(target.to_string()));
        }
        if actor == target {
            return Err(ClanError::CannotTargetSelf(ClanAction::Kick));
        }
        if current == Rank::Owner {
            return Err(ClanError::CannotKickOwner);
        }
        clan.remove_member(target);
        debug!(
            "{} kicked {} from clan '{}'",
            escape_log(actor),
            escape_log(target),
            escape_log(&clan_name)
        );
        Ok(())
    }

    pub fn accept_invite(&mut self, identity: &str, clan_name: &str) -> Result<(), ClanError> {
        if self.is_in_clan(identity) {
            return Err(ClanError::AlreadyInClan(identity.to_string()));
        }
        self.clan_mut(clan_name)?.accept_invite(identity)?;
        self.drop_invites_for(identity);
        debug!("{} joined clan '{}'", escape_log(identity), escape_log(clan_name));
        Ok(())
    }

    /// The invitee turns down a pending invitation.
    pub fn decline_invite(&mut self, identity: &str, clan_name: &str) -> Result<(), ClanError> {
        let clan = self.clan_mut(clan_name)?;
        if !clan.revoke_invite(identity) {
            return Err(ClanError::NotInvited {
                identity: identity.to_string(),
                clan: clan_name.to_string(),
            });
        }
        debug!("{} declined clan '{}'", escape_log(identity), escape_log(clan_name));
        Ok(())
    }

    /// Verify every clan invariant plus single membership across clans.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (key, clan) in &self.clans {
            if key != clan.name() {
                return Err(format!("clan '{}' stored under key '{}'", clan.name(), key));
            }
            clan.check_invariants()?;
            for identity in clan.members().keys() {
                if !seen.insert(identity.as_str()) {
                    return Err(format!("'{}' is a member of more than one clan", identity));
                }
            }
        }
        Ok(())
    }

    fn membership(&self, identity: &str) -> Result<(String, Rank), ClanError> {
        self.clan_of(identity)
            .map(|clan| (clan.name().to_string(), clan.get_member_rank(identity)))
            .ok_or_else(|| ClanError::NotInClan(identity.to_string()))
    }

    fn authorize(&self, actor: &str, action: ClanAction) -> Result<(String, Rank), ClanError> {
        let (clan_name, rank) = self.membership(actor)?;
        if !rank.permits(action) {
            return Err(ClanError::PermissionDenied { action, rank });
        }
        Ok((clan_name, rank))
    }

    fn clan_ref(&self, name: &str) -> Result<&Clan, ClanError> {
        self.clans
            .get(name)
            .ok_or_else(|| ClanError::ClanNotFound(name.to_string()))
    }

    fn clan_mut(&mut self, name: &str) -> Result<&mut Clan, ClanError> {
        self.clans
            .get_mut(name)
            .ok_or_else(|| ClanError::ClanNotFound(name.to_string()))
    }

    fn drop_invites_for(&mut self, identity: &str) {
        for clan in self.clans.values_mut() {
            clan.revoke_invite(identity);
        }
    }
}
