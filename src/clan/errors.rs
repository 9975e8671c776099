use thiserror::Error;

use crate::clan::rank::{ClanAction, Rank};

/// Coarse classification of [`ClanError`] used by hosts to pick a response style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed clan name, identity or rank text.
    InvalidArgument,
    /// Referenced clan, membership or invitation does not exist.
    NotFound,
    /// Name taken, identity already in a clan, already invited or already a member.
    Conflict,
    /// Actor lacks the rank for the action or targets a protected owner.
    Forbidden,
    /// Persistent store is unreadable or violates registry invariants.
    CorruptData,
    /// The store could not be read or written.
    Storage,
}

/// Errors returned by clan registry and service operations.
#[derive(Debug, Error)]
pub enum ClanError {
    #[error("invalid clan name: {0}")]
    InvalidName(String),

    #[error("invalid rank: {0:?}")]
    InvalidRank(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("{0} is not in a clan")]
    NotInClan(String),

    #[error("clan '{0}' does not exist")]
    ClanNotFound(String),

    #[error("{0} is not a member of the clan")]
    TargetNotMember(String),

    #[error("{identity} has not been invited to clan '{clan}'")]
    NotInvited { identity: String, clan: String },

    #[error("{0} is already in a clan")]
    AlreadyInClan(String),

    #[error("clan '{0}' already exists")]
    NameTaken(String),

    #[error("{0} is already a member of the clan")]
    TargetAlreadyMember(String),

    #[error("{0} is already a member of another clan")]
    TargetAlreadyInClan(String),

    #[error("{0} has already been invited")]
    AlreadyInvited(String),

    #[error("rank {rank} may not {action}")]
    PermissionDenied { action: ClanAction, rank: Rank },

    #[error("the clan owner cannot be kicked")]
    CannotKickOwner,

    #[error("the clan owner's rank cannot be changed")]
    CannotRankOwner,

    #[error("ownership cannot be granted through a rank change")]
    OwnerTransferNotAllowed,

    #[error("cannot target yourself ({0})")]
    CannotTargetSelf(ClanAction),

    #[error("corrupt clan data: {0}")]
    CorruptData(String),

    #[error("clan data schema mismatch: expected {expected}, got {found}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClanError::InvalidName(_) | ClanError::InvalidRank(_) | ClanError::InvalidIdentity(_) => {
                ErrorKind::InvalidArgument
            }
            ClanError::NotInClan(_)
            | ClanError::ClanNotFound(_)
            | ClanError::TargetNotMember(_)
            | ClanError::NotInvited { .. } => ErrorKind::NotFound,
            ClanError::AlreadyInClan(_)
            | ClanError::NameTaken(_)
            | ClanError::TargetAlreadyMember(_)
            | ClanError::TargetAlreadyInClan(_)
            | ClanError::AlreadyInvited(_) => ErrorKind::Conflict,
            ClanError::PermissionDenied { .. }
            | ClanError::CannotKickOwner
            | ClanError::CannotRankOwner
            | ClanError::OwnerTransferNotAllowed
            | ClanError::CannotTargetSelf(_) => ErrorKind::Forbidden,
            ClanError::CorruptData(_) | ClanError::SchemaMismatch { .. } => ErrorKind::CorruptData,
            ClanError::Io(_) => ErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for ClanError {
    fn from(err: serde_json::Error) -> Self {
        ClanError::CorruptData(err.to_string())
    }
}
