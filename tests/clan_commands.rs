use clanhall::clan::{ClanService, Rank};
use clanhall::commands::{handle_clan_command, ReplyTone};

fn run(svc: &ClanService, actor: &str, input: &str) -> (ReplyTone, String) {
    let reply = handle_clan_command(svc, actor, input).expect("clan command");
    (reply.tone, reply.text())
}

#[test]
fn full_round_through_chat_commands() {
    let svc = ClanService::in_memory();

    assert_eq!(run(&svc, "alice", "/clan create Raptors"), (ReplyTone::Success, "Clan 'Raptors' created.".into()));

    let reply = handle_clan_command(&svc, "alice", "/ci bob").unwrap();
    assert_eq!(reply.tone, ReplyTone::Success);
    assert_eq!(reply.text(), "Invitation sent to player 'bob'.");
    let notice = reply.notice.expect("invitee notice");
    assert_eq!(notice.recipient, "bob");
    assert!(notice.text.contains("/clan accept Raptors"));

    assert_eq!(run(&svc, "bob", "/ca Raptors"), (ReplyTone::Success, "You have joined clan 'Raptors'.".into()));
    assert_eq!(
        run(&svc, "alice", "/clanrank bob admin"),
        (ReplyTone::Success, "Player 'bob' has been ranked as 'Admin'.".into())
    );
    assert_eq!(svc.query_rank_of("bob"), Rank::Admin);

    assert_eq!(run(&svc, "bob", "/ck alice"), (ReplyTone::Error, "The clan owner cannot be kicked.".into()));
    assert_eq!(
        run(&svc, "alice", "/cl"),
        (ReplyTone::Success, "Your clan 'Raptors' has been disbanded.".into())
    );
    assert!(svc.query_clan_of("bob").is_none());
}

#[test]
fn errors_use_original_wording() {
    let svc = ClanService::in_memory();
    assert_eq!(run(&svc, "alice", "/cl"), (ReplyTone::Error, "You are not in a clan.".into()));
    assert_eq!(
        run(&svc, "alice", "/clan create"),
        (ReplyTone::Error, "Invalid syntax! Proper syntax: /clan create <clanName>".into())
    );
    run(&svc, "alice", "/cc Raptors");
    assert_eq!(run(&svc, "alice", "/cc Owls"), (ReplyTone::Error, "You are already in a clan.".into()));
    assert_eq!(run(&svc, "carol", "/cc Raptors"), (ReplyTone::Error, "Clan 'Raptors' already exists.".into()));
    assert_eq!(
        run(&svc, "bob", "/ca Raptors"),
        (ReplyTone::Error, "You have not been invited to join clan 'Raptors'.".into())
    );
    assert_eq!(run(&svc, "bob", "/ca Nope"), (ReplyTone::Error, "Clan 'Nope' does not exist.".into()));
    assert_eq!(
        run(&svc, "alice", "/cr alice member"),
        (ReplyTone::Error, "You cannot unrank yourself!".into())
    );
    run(&svc, "alice", "/ci bob");
    run(&svc, "bob", "/ca Raptors");
    assert_eq!(
        run(&svc, "alice", "/cr bob boss"),
        (ReplyTone::Error, "Invalid rank specified. Use member or admin.".into())
    );
    assert_eq!(
        run(&svc, "bob", "/ci carol"),
        (ReplyTone::Error, "You don't have permission to invite players to the clan.".into())
    );
    assert_eq!(
        run(&svc, "bob", "/clan disband"),
        (ReplyTone::Error, "Only the clan owner can disband the clan.".into())
    );
}

#[test]
fn revoke_and_decline_commands() {
    let svc = ClanService::in_memory();
    run(&svc, "alice", "/cc Raptors");
    run(&svc, "alice", "/ci bob");
    assert_eq!(run(&svc, "alice", "/clan revoke bob").0, ReplyTone::Success);
    assert_eq!(
        run(&svc, "alice", "/clan revoke bob"),
        (ReplyTone::Error, "Player 'bob' has no pending invitation.".into())
    );
    run(&svc, "alice", "/ci bob");
    assert_eq!(run(&svc, "bob", "/clan decline Raptors").0, ReplyTone::Success);
    assert!(!svc.clan("Raptors").unwrap().is_invited("bob"));
}

#[test]
fn info_and_list() {
    let svc = ClanService::in_memory();
    assert_eq!(run(&svc, "zed", "/clan list"), (ReplyTone::Info, "No clans exist yet.".into()));
    run(&svc, "alice", "/cc Raptors");
    run(&svc, "alice", "/ci bob");
    run(&svc, "bob", "/ca Raptors");
    run(&svc, "alice", "/ci carol");
    run(&svc, "dave", "/cc Owls");

    let (tone, text) = run(&svc, "alice", "/clan info");
    assert_eq!(tone, ReplyTone::Info);
    assert!(text.contains("==== Raptors (2 members) ===="));
    assert!(text.contains("Owner: alice"));
    assert!(text.contains("Members: bob"));
    assert!(text.contains("Pending invites: carol"));

    // Plain members do not see the pending list.
    let (_, text) = run(&svc, "bob", "/clan info");
    assert!(!text.contains("Pending invites"));

    let (_, text) = run(&svc, "zed", "/clan info Owls");
    assert!(text.contains("Owner: dave"));

    assert_eq!(run(&svc, "zed", "/clan list").1, "Clans (2): Owls (1), Raptors (2)");
}

#[test]
fn help_and_unknown() {
    let svc = ClanService::in_memory();
    let (tone, text) = run(&svc, "alice", "/ch");
    assert_eq!(tone, ReplyTone::Info);
    assert!(text.starts_with("==== Clans ===="));
    assert!(text.contains("/clan kick <playerName>"));
    assert_eq!(run(&svc, "alice", "/clan dance").0, ReplyTone::Error);
    assert!(handle_clan_command(&svc, "alice", "/say hi").is_none());
}

#[test]
fn host_commands_are_left_alone() {
    let svc = ClanService::in_memory();
    run(&svc, "alice", "/cc Raptors");
    run(&svc, "alice", "/ci bob");
    run(&svc, "bob", "/ca Raptors");

    for input in ["/kick bob", "/leave", "/help", "/list", "/disband", "/invite carol"] {
        assert!(handle_clan_command(&svc, "alice", input).is_none(), "input {input:?}");
    }
    let clan = svc.clan("Raptors").expect("clan still exists");
    assert!(clan.is_member("bob"));
    assert!(!clan.is_invited("carol"));

    assert_eq!(run(&svc, "alice", "/clankick bob").0, ReplyTone::Success);
    assert!(!svc.clan("Raptors").unwrap().is_member("bob"));
}
