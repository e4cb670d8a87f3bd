//! GateConfig serde round-trips with human-readable durations.

#![cfg(feature = "serde")]

use std::time::Duration;

use nebula_lifecycle::GateConfig;
use pretty_assertions::assert_eq;

#[test]
fn deserialize_humantime_durations() {
    let config: GateConfig =
        serde_json::from_str(r#"{ "name": "warehouse", "drain_warn_after": "1m 30s" }"#).unwrap();
    assert_eq!(config.name, "warehouse");
    assert_eq!(config.drain_warn_after, Some(Duration::from_secs(90)));
}

#[test]
fn missing_fields_use_defaults() {
    let config: GateConfig = serde_json::from_str(r#"{ "name": "cache" }"#).unwrap();
    assert_eq!(config, GateConfig::named("cache"));

    let config: GateConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, GateConfig::default());
}

#[test]
fn null_disables_drain_warning() {
    let config: GateConfig =
        serde_json::from_str(r#"{ "name": "quiet", "drain_warn_after": null }"#).unwrap();
    assert_eq!(config.drain_warn_after, None);
}

#[test]
fn serialize_round_trip() {
    let config = GateConfig::named("queue").with_drain_warn_after(Duration::from_millis(1500));
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "name": "queue", "drain_warn_after": "1s 500ms" })
    );
    let back: GateConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}
