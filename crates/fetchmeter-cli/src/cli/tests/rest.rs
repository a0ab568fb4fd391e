//! Tests for probe and config.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_probe() {
    match parse(&["fetchmeter", "probe", "https://example.com/a.zip"]) {
        CliCommand::Probe { url } => assert_eq!(url, "https://example.com/a.zip"),
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["fetchmeter", "config"]), CliCommand::Config));
}
