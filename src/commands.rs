//! Chat command layer for hosts that expose clans through `/clan ...` commands.
//!
//! Parses player input into a [`ClanCommand`], runs it against a [`ClanService`] on
//! behalf of an already-resolved actor identity, and renders a [`CommandReply`].
//! Delivering the reply (and any [`Notice`] for another player) is up to the host.
//!
//! Accepted forms, all case-insensitive on the verb:
//!
//! ```text
//! /clan create Raptors     clan create Raptors
//! /clancreate Raptors      clancreate Raptors
//! /cc Raptors              cc Raptors
//! ```
//!
//! Short aliases: `cc` create, `cl` leave, `cr` rank, `ca` accept, `ci` invite,
//! `ck` kick, `ch` help.

use log::{debug, error};

use crate::clan::{ClanAction, ClanError, ClanService, ErrorKind, Rank};
use crate::logutil::escape_log;

/// Parsed clan command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClanCommand {
    Create(String),               // create <clanName>
    Leave,                        // leave
    Rank { player: String, rank: String }, // rank <player> <rank>
    Accept(String),               // accept <clanName>
    Decline(String),              // decline <clanName>
    Invite(String),               // invite <player>
    Revoke(String),               // revoke <player>
    Kick(String),                 // kick <player>
    Disband,                      // disband
    Info(Option<String>),         // info [clanName]
    List,                         // list
    Help,                         // help
    /// Recognised verb with missing arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTone {
    Success,
    Error,
    Info,
}

/// A message the host should deliver to another player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub tone: ReplyTone,
    pub lines: Vec<String>,
    pub notice: Option<Notice>,
}

impl CommandReply {
    fn success(text: impl Into<String>) -> Self {
        Self { tone: ReplyTone::Success, lines: vec![text.into()], notice: None }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { tone: ReplyTone::Error, lines: vec![text.into()], notice: None }
    }

    fn info(lines: Vec<String>) -> Self {
        Self { tone: ReplyTone::Info, lines, notice: None }
    }

    fn with_notice(mut self, recipient: &str, text: String) -> Self {
        self.notice = Some(Notice { recipient: recipient.to_string(), text });
        self
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

const USAGE_CREATE: &str = "/clan create <clanName>";
const USAGE_RANK: &str = "/clan rank <playerName> <rank>";
const USAGE_ACCEPT: &str = "/clan accept <clanName>";
const USAGE_DECLINE: &str = "/clan decline <clanName>";
const USAGE_INVITE: &str = "/clan invite <playerName>";
const USAGE_REVOKE: &str = "/clan revoke <playerName>";
const USAGE_KICK: &str = "/clan kick <playerName>";

const HELP_LINES: &[&str] = &[
    "==== Clans ====",
    "/clan create <clanName> - Create a new clan.",
    "/clan leave - Leave your current clan.",
    "/clan rank <playerName> <rank> - Change a player's rank in your clan.",
    "/clan accept <clanName> - Accept an invitation to join a clan.",
    "/clan decline <clanName> - Decline an invitation.",
    "/clan invite <playerName> - Invite a player to join your clan.",
    "/clan revoke <playerName> - Withdraw an invitation.",
    "/clan kick <playerName> - Kick a player from your clan.",
    "/clan disband - Disband your clan (owner only).",
    "/clan info [clanName] - Show clan members.",
    "/clan list - List all clans.",
];

/// Verb following `/clan ` or glued onto `clan`.
fn clan_verb(verb: &str) -> Option<&'static str> {
    Some(match verb.to_ascii_lowercase().as_str() {
        "create" => "create",
        "leave" => "leave",
        "rank" => "rank",
        "accept" => "accept",
        "decline" => "decline",
        "invite" => "invite",
        "revoke" => "revoke",
        "kick" => "kick",
        "disband" => "disband",
        "info" => "info",
        "list" => "list",
        "help" => "help",
        _ => return None,
    })
}

/// A head word other than `clan`: a two-letter alias or `clan<verb>`. Bare verbs such
/// as `kick` or `help` belong to the host.
fn head_verb(head: &str) -> Option<&'static str> {
    let lowered = head.to_ascii_lowercase();
    match lowered.as_str() {
        "cc" => Some("create"),
        "cl" => Some("leave"),
        "cr" => Some("rank"),
        "ca" => Some("accept"),
        "ci" => Some("invite"),
        "ck" => Some("kick"),
        "ch" => Some("help"),
        _ => lowered
            .strip_prefix("clan")
            .filter(|v| !v.is_empty())
            .and_then(clan_verb),
    }
}

/// Parse chat input. Returns `None` when the input is not a clan command at all.
pub fn parse_clan_command(input: &str) -> Option<ClanCommand> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input);
    let mut words = input.split_whitespace();
    let head = words.next()?;

    let verb = if head.eq_ignore_ascii_case("clan") {
        match words.next() {
            None => return Some(ClanCommand::Help),
            Some(v) => match clan_verb(v) {
                Some(verb) => verb,
                None => return Some(ClanCommand::Unknown(v.to_string())),
            },
        }
    } else {
        head_verb(head)?
    };

    let args: Vec<String> = words.map(str::to_string).collect();
    let first = args.first().cloned();
    let cmd = match verb {
        "create" => first.map(ClanCommand::Create).unwrap_or(ClanCommand::Usage(USAGE_CREATE)),
        "leave" => ClanCommand::Leave,
        "rank" => match (args.first(), args.get(1)) {
            (Some(player), Some(rank)) => ClanCommand::Rank { player: player.clone(), rank: rank.clone() },
            _ => ClanCommand::Usage(USAGE_RANK),
        },
        "accept" => first.map(ClanCommand::Accept).unwrap_or(ClanCommand::Usage(USAGE_ACCEPT)),
        "decline" => first.map(ClanCommand::Decline).unwrap_or(ClanCommand::Usage(USAGE_DECLINE)),
        "invite" => first.map(ClanCommand::Invite).unwrap_or(ClanCommand::Usage(USAGE_INVITE)),
        "revoke" => first.map(ClanCommand::Revoke).unwrap_or(ClanCommand::Usage(USAGE_REVOKE)),
        "kick" => first.map(ClanCommand::Kick).unwrap_or(ClanCommand::Usage(USAGE_KICK)),
        "disband" => ClanCommand::Disband,
        "info" => ClanCommand::Info(first),
        "list" => ClanCommand::List,
        _ => ClanCommand::Help,
    };
    Some(cmd)
}

/// Parse and execute `input` for `actor`. `None` if the input is not a clan command.
pub fn handle_clan_command(service: &ClanService, actor: &str, input: &str) -> Option<CommandReply> {
    let cmd = parse_clan_command(input)?;
    debug!("Clan command from {}: {:?}", escape_log(actor), cmd);
    Some(execute(service, actor, cmd))
}

pub fn execute(service: &ClanService, actor: &str, cmd: ClanCommand) -> CommandReply {
    let result = match cmd {
        ClanCommand::Create(name) => service
            .create_clan(&name, actor)
            .map(|_| CommandReply::success(format!("Clan '{}' created.", name))),
        ClanCommand::Leave => service.leave(actor).map(|out| {
            if out.disbanded {
                CommandReply::success(format!("Your clan '{}' has been disbanded.", out.clan))
            } else {
                CommandReply::success(format!("You have left clan '{}'.", out.clan))
            }
        }),
        ClanCommand::Rank { player, rank } => service.change_rank(actor, &player, &rank).map(|new_rank| {
            CommandReply::success(format!("Player '{}' has been ranked as '{}'.", player, new_rank))
        }),
        ClanCommand::Accept(name) => service
            .accept_invite(actor, &name)
            .map(|_| CommandReply::success(format!("You have joined clan '{}'.", name))),
        ClanCommand::Decline(name) => service
            .decline_invite(actor, &name)
            .map(|_| CommandReply::success(format!("You declined the invitation to '{}'.", name))),
        ClanCommand::Invite(player) => service.invite_player(actor, &player).map(|clan| {
            CommandReply::success(format!("Invitation sent to player '{}'.", player)).with_notice(
                &player,
                format!(
                    "You have been invited to join '{}'. Type '/clan accept {}' to join.",
                    clan, clan
                ),
            )
        }),
        ClanCommand::Revoke(player) => service
            .revoke_invite(actor, &player)
            .map(|_| CommandReply::success(format!("Invitation for '{}' withdrawn.", player))),
        ClanCommand::Kick(player) => service.kick_player(actor, &player).map(|_| {
            CommandReply::success(format!("Player '{}' has been kicked from the clan.", player))
        }),
        ClanCommand::Disband => service
            .disband(actor)
            .map(|name| CommandReply::success(format!("Clan '{}' has been disbanded.", name))),
        ClanCommand::Info(name) => Ok(info_reply(service, actor, name.as_deref())),
        ClanCommand::List => Ok(list_reply(service)),
        ClanCommand::Help => Ok(CommandReply::info(HELP_LINES.iter().map(|s| s.to_string()).collect())),
        ClanCommand::Usage(usage) => Ok(CommandReply::error(format!(
            "Invalid syntax! Proper syntax: {}",
            usage
        ))),
        ClanCommand::Unknown(verb) => Ok(CommandReply::error(format!(
            "Unknown clan command '{}'. Type /clan help for a list.",
            verb
        ))),
    };
    result.unwrap_or_else(|e| CommandReply::error(describe_error(&e, actor)))
}

fn info_reply(service: &ClanService, actor: &str, name: Option<&str>) -> CommandReply {
    let clan = match name {
        Some(name) => service.clan(name),
        None => service.query_clan_of(actor),
    };
    let Some(clan) = clan else {
        return match name {
            Some(name) => CommandReply::error(format!("Clan '{}' does not exist.", name)),
            None => CommandReply::error("You are not in a clan."),
        };
    };

    let by_rank = |wanted: Rank| {
        let mut names: Vec<&str> = clan
            .members()
            .iter()
            .filter(|(_, rank)| **rank == wanted)
            .map(|(who, _)| who.as_str())
            .collect();
        names.sort_unstable();
        names.join(", ")
    };
    let admins = by_rank(Rank::Admin);
    let members = by_rank(Rank::Member);

    let mut lines = vec![
        format!("==== {} ({} members) ====", clan.name(), clan.member_count()),
        format!("Owner: {}", clan.owner()),
    ];
    if !admins.is_empty() {
        lines.push(format!("Admins: {}", admins));
    }
    if !members.is_empty() {
        lines.push(format!("Members: {}", members));
    }
    if clan.get_member_rank(actor) >= Rank::Admin && !clan.pending_invites().is_empty() {
        let mut pending: Vec<&str> = clan.pending_invites().iter().map(String::as_str).collect();
        pending.sort_unstable();
        lines.push(format!("Pending invites: {}", pending.join(", ")));
    }
    CommandReply::info(lines)
}

fn list_reply(service: &ClanService) -> CommandReply {
    let clans = service.list_clans();
    if clans.is_empty() {
        return CommandReply::info(vec!["No clans exist yet.".to_string()]);
    }
    let entries: Vec<String> = clans
        .iter()
        .map(|c| format!("{} ({})", c.name(), c.member_count()))
        .collect();
    CommandReply::info(vec![format!("Clans ({}): {}", clans.len(), entries.join(", "))])
}

/// Player-facing text for an engine error, worded from `actor`'s point of view.
pub fn describe_error(err: &ClanError, actor: &str) -> String {
    match err {
        ClanError::InvalidName(reason) => format!("Invalid clan name: {}", reason),
        ClanError::InvalidRank(_) => "Invalid rank specified. Use member or admin.".to_string(),
        ClanError::InvalidIdentity(reason) => format!("Invalid player name: {}", reason),
        ClanError::NotInClan(_) => "You are not in a clan.".to_string(),
        ClanError::ClanNotFound(name) => format!("Clan '{}' does not exist.", name),
        ClanError::TargetNotMember(player) => {
            format!("Player '{}' is not a member of your clan.", player)
        }
        ClanError::NotInvited { identity, clan } if identity == actor => {
            format!("You have not been invited to join clan '{}'.", clan)
        }
        ClanError::NotInvited { identity, .. } => {
            format!("Player '{}' has no pending invitation.", identity)
        }
        ClanError::AlreadyInClan(who) if who == actor => "You are already in a clan.".to_string(),
        ClanError::AlreadyInClan(who) => format!("Player '{}' is already in a clan.", who),
        ClanError::NameTaken(name) => format!("Clan '{}' already exists.", name),
        ClanError::TargetAlreadyMember(player) => {
            format!("Player '{}' is already in your clan.", player)
        }
        ClanError::TargetAlreadyInClan(player) => {
            format!("Player '{}' is already in another clan.", player)
        }
        ClanError::AlreadyInvited(player) => format!("Player '{}' has already been invited.", player),
        ClanError::PermissionDenied { action, .. } => match action {
            ClanAction::Invite => "You don't have permission to invite players to the clan.".to_string(),
            ClanAction::RevokeInvite => "You don't have permission to revoke clan invitations.".to_string(),
            ClanAction::Kick => "You don't have permission to kick players from the clan.".to_string(),
            ClanAction::ChangeRank => "You cannot rank other players in the clan.".to_string(),
            ClanAction::Disband => "Only the clan owner can disband the clan.".to_string(),
        },
        ClanError::CannotKickOwner => "The clan owner cannot be kicked.".to_string(),
        ClanError::CannotRankOwner => "The clan owner's rank cannot be changed.".to_string(),
        ClanError::OwnerTransferNotAllowed => {
            "Ownership cannot be transferred with a rank change.".to_string()
        }
        ClanError::CannotTargetSelf(ClanAction::ChangeRank) => "You cannot unrank yourself!".to_string(),
        ClanError::CannotTargetSelf(ClanAction::Kick) => {
            "You cannot kick yourself. Use /clan leave instead.".to_string()
        }
        ClanError::CannotTargetSelf(action) => format!("You cannot {} yourself.", action),
        other => {
            debug_assert!(matches!(other.kind(), ErrorKind::CorruptData | ErrorKind::Storage));
            error!("Clan command failed for {}: {}", escape_log(actor), other);
            "Clan data is unavailable right now. Please try again later.".to_string()
        }
    }
}
