// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rill_core::DecodeErrorPolicy;

#[test]
fn empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.app_id(), "rill");
    assert_eq!(config.channel.capacity, 1);
}

#[test]
fn full_config_parses_durations() {
    let config = Config::parse(
        r#"
app_id = "clicks"

[table]
name = "counts"
ttl = "1h"

[window]
kind = "hopping"
size = "10m"
step = "5m"
expires = "1day"

[channel]
capacity = 8
decode_error_policy = "hold"
"#,
    )
    .unwrap();

    assert_eq!(config.app_id(), "clicks");
    assert_eq!(config.table_name(), Some("counts"));
    assert_eq!(
        config.table.as_ref().unwrap().ttl,
        Some(Duration::from_secs(3600))
    );
    assert_eq!(
        config.window,
        Some(WindowConfig::Hopping {
            size: Duration::from_secs(600),
            step: Duration::from_secs(300),
            expires: Some(Duration::from_secs(86_400)),
        })
    );
    assert_eq!(config.channel.capacity, 8);
    assert_eq!(config.channel.decode_error_policy, DecodeErrorPolicy::Hold);
    // unspecified channel fields keep their defaults
    assert!(config.channel.clone_shares_queue);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(Config::parse("app = \"typo\"").is_err());
    assert!(Config::parse("[table]\nname = \"t\"\nttl_secs = 5").is_err());
}

#[test]
fn window_config_builds_policy() {
    let tumbling = WindowConfig::Tumbling {
        size: Duration::from_secs(60),
        expires: None,
    };
    assert_eq!(tumbling.policy().unwrap().size(), Duration::from_secs(60));

    let invalid = WindowConfig::Hopping {
        size: Duration::from_secs(5),
        step: Duration::from_secs(10),
        expires: None,
    };
    assert!(invalid.policy().is_err());
}

#[test]
fn config_round_trips_through_toml() {
    let config = Config {
        app_id: Some("clicks".into()),
        table: Some(TableConfig {
            name: "counts".into(),
            ttl: Some(Duration::from_secs(90)),
        }),
        window: Some(WindowConfig::Tumbling {
            size: Duration::from_secs(60),
            expires: None,
        }),
        channel: ChannelConfig::default(),
    };

    let text = toml::to_string(&config).unwrap();
    assert_eq!(Config::parse(&text).unwrap(), config);
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(format!("{:#}", err).contains("cannot read config"));
}

#[test]
fn load_reads_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rill.toml");
    std::fs::write(&path, "app_id = \"from-file\"\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.app_id(), "from-file");
}
