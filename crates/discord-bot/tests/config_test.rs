use giveaways_discord_bot::config::parse_log_level;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tracing::Level;

#[rstest]
#[case("trace", Level::TRACE)]
#[case("DEBUG", Level::DEBUG)]
#[case(" info ", Level::INFO)]
#[case("warn", Level::WARN)]
#[case("error", Level::ERROR)]
fn test_parse_log_level(#[case] value: &str, #[case] expected: Level) {
    assert_eq!(parse_log_level(value).unwrap(), expected);
}

#[test]
fn test_parse_log_level_rejects_unknown() {
    let error = parse_log_level("loud").unwrap_err();
    assert!(error.to_string().contains("LOG_LEVEL"));
}
