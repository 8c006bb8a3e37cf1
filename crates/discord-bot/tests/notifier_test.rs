use giveaways_core::models::{
    GiveawayId, GiveawayRecord, GiveawayStatus, ParticipantId, ParticipantSet, Timestamp,
};
use giveaways_core::notifier::EligibilityChecker;
use giveaways_discord_bot::eligibility::MemberRoles;
use giveaways_discord_bot::notifier::{closed_description, format_winners, open_description};
use pretty_assertions::assert_eq;

fn record(participants: &[&str]) -> GiveawayRecord {
    GiveawayRecord {
        id: GiveawayId::new(),
        host_ref: "100".to_string(),
        channel_ref: "200".to_string(),
        message_ref: None,
        prize: "Nitro".to_string(),
        winner_count: 2,
        required_role_ref: Some("300".to_string()),
        participants: participants.iter().map(|p| ParticipantId::from(*p)).collect::<ParticipantSet>(),
        status: GiveawayStatus::Open,
        created_at: Timestamp::from_millis(1_699_999_000_000),
        end_at: Timestamp::from_millis(1_700_000_000_000),
        closed_at: None,
        winners: Vec::new(),
        purge_at: None,
    }
}

#[test]
fn test_open_description_mentions_deadline_and_role() {
    assert_eq!(
        open_description(&record(&[])),
        "Hosted by <@100>\nWinners: **2**\nEnds <t:1700000000:R>\nRequires <@&300>"
    );
}

#[test]
fn test_closed_description_lists_winners() {
    let winners = vec![ParticipantId::from("2"), ParticipantId::from("1")];

    assert_eq!(format_winners(&winners), "<@2>, <@1>");
    assert_eq!(
        closed_description(&record(&["1", "2", "3"]), &winners),
        "Hosted by <@100>\nEntries: **3**\nWinners: <@2>, <@1>"
    );
}

#[test]
fn test_closed_description_without_participants() {
    assert_eq!(
        closed_description(&record(&[]), &[]),
        "Hosted by <@100>\nNobody entered, so there are no winners."
    );
}

#[test]
fn test_member_roles_eligibility() {
    let member = MemberRoles::new(["300", "301"]);
    let participant = ParticipantId::from("1");

    assert!(member.is_eligible(&participant, None));
    assert!(member.is_eligible(&participant, Some("300")));
    assert!(!member.is_eligible(&participant, Some("999")));
    assert!(!MemberRoles::default().is_eligible(&participant, Some("300")));
    assert!(MemberRoles::from_member(None).is_eligible(&participant, None));
}
