//! The engine's top-level session object.
//!
//! [`ClanService`] owns the [`Registry`], the store it persists to and the persistence
//! policy. Every mutation runs check, mutate and save under one write lock, because
//! cross-clan rules (an identity is in at most one clan) span several clans at once.
//! Queries share the read lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};

use crate::clan::errors::ClanError;
use crate::clan::model::Clan;
use crate::clan::rank::{parse_rank, ClanAction, Rank};
use crate::clan::registry::{LeaveOutcome, Registry};
use crate::config::{Config, PersistMode};
use crate::logutil::escape_log;
use crate::storage::ClanStore;
use crate::validation::{validate_clan_name, validate_identity, ClanNameRules};

pub struct ClanService {
    registry: RwLock<Registry>,
    store: Option<ClanStore>,
    persist: PersistMode,
    dirty: AtomicBool,
    name_rules: ClanNameRules,
    max_identity_length: usize,
}

impl ClanService {
    /// A service with no backing store (tests, dry runs).
    pub fn in_memory() -> Self {
        Self::with_registry(Registry::new(), None, PersistMode::EveryMutation)
    }

    /// Load the registry from `store`. A corrupt store is an error; the caller decides
    /// whether to start empty instead.
    pub fn open(store: ClanStore, persist: PersistMode) -> Result<Self, ClanError> {
        let registry = store.load()?;
        Ok(Self::with_registry(registry, Some(store), persist))
    }

    pub fn from_config(config: &Config) -> Result<Self, ClanError> {
        let store = ClanStore::from_config(&config.storage);
        let service = Self::open(store, config.storage.persist)?;
        Ok(service.with_limits(config.clans.name_rules(), config.clans.max_identity_length))
    }

    fn with_registry(registry: Registry, store: Option<ClanStore>, persist: PersistMode) -> Self {
        Self {
            registry: RwLock::new(registry),
            store,
            persist,
            dirty: AtomicBool::new(false),
            name_rules: ClanNameRules::default(),
            max_identity_length: 64,
        }
    }

    pub fn with_limits(mut self, name_rules: ClanNameRules, max_identity_length: usize) -> Self {
        self.name_rules = name_rules;
        self.max_identity_length = max_identity_length;
        self
    }

    pub fn persist_mode(&self) -> PersistMode {
        self.persist
    }

    /// True when changes exist that have not reached the store.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn create_clan(&self, name: &str, founder: &str) -> Result<(), ClanError> {
        validate_clan_name(name, &self.name_rules).map_err(|e| ClanError::InvalidName(e.to_string()))?;
        self.check_identity(founder)?;
        self.mutate(|registry| registry.create_clan(name, founder))
    }

    pub fn leave(&self, identity: &str) -> Result<LeaveOutcome, ClanError> {
        self.mutate(|registry| registry.leave(identity))
    }

    /// Disband the actor's clan. Only the owner may do this. Returns the clan name.
    pub fn disband(&self, actor: &str) -> Result<String, ClanError> {
        self.mutate(|registry| {
            let (name, rank) = registry
                .clan_of(actor)
                .map(|clan| (clan.name().to_string(), clan.get_member_rank(actor)))
                .ok_or_else(|| ClanError::NotInClan(actor.to_string()))?;
            if !rank.permits(ClanAction::Disband) {
                return Err(ClanError::PermissionDenied { action: ClanAction::Disband, rank });
            }
            registry.disband_clan(&name)?;
            Ok(name)
        })
    }

    /// Change `target`'s rank from raw rank text (`member`, `admin`, `owner`).
    pub fn change_rank(&self, actor: &str, target: &str, rank_text: &str) -> Result<Rank, ClanError> {
        let rank = parse_rank(rank_text);
        self.mutate(|registry| registry.change_rank(actor, target, rank))
            .map_err(|e| match e {
                ClanError::InvalidRank(_) => ClanError::InvalidRank(rank_text.to_string()),
                other => other,
            })
    }

    /// Invite `target` to the actor's clan. Returns the clan name for the host's notice.
    pub fn invite_player(&self, actor: &str, target: &str) -> Result<String, ClanError> {
        self.check_identity(target)?;
        self.mutate(|registry| registry.invite_player(actor, target))
    }

    pub fn revoke_invite(&self, actor: &str, target: &str) -> Result<(), ClanError> {
        self.mutate(|registry| registry.revoke_invite(actor, target))
    }

    pub fn accept_invite(&self, identity: &str, clan_name: &str) -> Result<(), ClanError> {
        self.mutate(|registry| registry.accept_invite(identity, clan_name))
    }

    pub fn decline_invite(&self, identity: &str, clan_name: &str) -> Result<(), ClanError> {
        self.mutate(|registry| registry.decline_invite(identity, clan_name))
    }

    pub fn kick_player(&self, actor: &str, target: &str) -> Result<(), ClanError> {
        self.mutate(|registry| registry.kick_player(actor, target))
    }

    /// Snapshot of the clan `identity` belongs to.
    pub fn query_clan_of(&self, identity: &str) -> Option<Clan> {
        self.read().clan_of(identity).cloned()
    }

    pub fn query_rank_of(&self, identity: &str) -> Rank {
        self.read().rank_of(identity)
    }

    pub fn clan(&self, name: &str) -> Option<Clan> {
        self.read().get(name).cloned()
    }

    /// All clans, sorted by name.
    pub fn list_clans(&self) -> Vec<Clan> {
        let mut clans: Vec<Clan> = self.read().clans().cloned().collect();
        clans.sort_by(|a, b| a.name().cmp(b.name()));
        clans
    }

    pub fn snapshot(&self) -> Registry {
        self.read().clone()
    }

    /// Write pending changes to the store. Returns whether anything was written.
    pub fn flush(&self) -> Result<bool, ClanError> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let registry = self.read();
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        if let Err(e) = store.save(&*registry) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        info!("Flushed {} clans to {}", registry.len(), store.path().display());
        Ok(true)
    }

    fn check_identity(&self, identity: &str) -> Result<(), ClanError> {
        validate_identity(identity, self.max_identity_length)
            .map(|_| ())
            .map_err(|e| ClanError::InvalidIdentity(e.to_string()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` under the write lock and persist the result per the configured mode.
    ///
    /// Registry operations validate before mutating, so an `Err` from `op` leaves the
    /// registry untouched. If saving fails the registry is restored to its prior state.
    fn mutate<T>(&self, op: impl FnOnce(&mut Registry) -> Result<T, ClanError>) -> Result<T, ClanError> {
        let mut registry = self.write();
        let store = match (&self.store, self.persist) {
            (Some(store), PersistMode::EveryMutation) => store,
            _ => {
                let out = op(&mut *registry)?;
                self.dirty.store(true, Ordering::Release);
                return Ok(out);
            }
        };

        let before = registry.clone();
        let out = op(&mut *registry)?;
        if let Err(e) = store.save(&*registry) {
            warn!(
                "Failed to save clans to {}: {}; change rolled back",
                escape_log(&store.path().display().to_string()),
                e
            );
            *registry = before;
            return Err(e);
        }
        Ok(out)
    }
}

impl Drop for ClanService {
    fn drop(&mut self) {
        if self.store.is_some() && self.is_dirty() {
            if let Err(e) = self.flush() {
                warn!("Failed to flush clans on shutdown: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clan::errors::ErrorKind;

    #[test]
    fn change_rank_reports_raw_text() {
        let svc = ClanService::in_memory();
        svc.create_clan("Raptors", "alice").unwrap();
        svc.invite_player("alice", "bob").unwrap();
        svc.accept_invite("bob", "Raptors").unwrap();
        match svc.change_rank("alice", "bob", "captain") {
            Err(ClanError::InvalidRank(text)) => assert_eq!(text, "captain"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(svc.change_rank("alice", "bob", "ADMIN").unwrap(), Rank::Admin);
    }

    #[test]
    fn permission_checked_before_rank_text() {
        let svc = ClanService::in_memory();
        svc.create_clan("Raptors", "alice").unwrap();
        svc.invite_player("alice", "bob").unwrap();
        svc.accept_invite("bob", "Raptors").unwrap();
        let err = svc.change_rank("bob", "alice", "nonsense").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn create_applies_name_rules() {
        let svc = ClanService::in_memory();
        assert!(matches!(svc.create_clan("Red Raptors", "alice"), Err(ClanError::InvalidName(_))));
        assert!(matches!(svc.create_clan("Raptors", ""), Err(ClanError::InvalidIdentity(_))));
        let svc = ClanService::in_memory().with_limits(ClanNameRules { max_length: 3, allow_spaces: false }, 64);
        assert!(matches!(svc.create_clan("Raptors", "alice"), Err(ClanError::InvalidName(_))));
        svc.create_clan("Rap", "alice").unwrap();
    }

    #[test]
    fn disband_requires_owner() {
        let svc = ClanService::in_memory();
        svc.create_clan("Raptors", "alice").unwrap();
        svc.invite_player("alice", "bob").unwrap();
        svc.accept_invite("bob", "Raptors").unwrap();
        svc.change_rank("alice", "bob", "admin").unwrap();
        assert!(matches!(
            svc.disband("bob"),
            Err(ClanError::PermissionDenied { action: ClanAction::Disband, rank: Rank::Admin })
        ));
        assert!(matches!(svc.disband("zed"), Err(ClanError::NotInClan(_))));
        assert_eq!(svc.disband("alice").unwrap(), "Raptors");
        assert!(svc.query_clan_of("bob").is_none());
    }

    #[test]
    fn queries_return_snapshots() {
        let svc = ClanService::in_memory();
        svc.create_clan("Owls", "carol").unwrap();
        svc.create_clan("Raptors", "alice").unwrap();
        let names: Vec<String> = svc.list_clans().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Owls", "Raptors"]);
        assert_eq!(svc.query_rank_of("carol"), Rank::Owner);
        assert_eq!(svc.query_rank_of("nobody"), Rank::None);
        assert_eq!(svc.clan("Owls").unwrap().owner(), "carol");
    }

    #[test]
    fn in_memory_flush_is_noop() {
        let svc = ClanService::in_memory();
        svc.create_clan("Raptors", "alice").unwrap();
        assert!(!svc.flush().unwrap());
    }
}
