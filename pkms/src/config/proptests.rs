//! Property-based tests for configuration merging.

use super::merger::ConfigMerger;
use super::schema::{CheckerConfig, Config, DatabaseSettings, OutputFormat};
use proptest::prelude::*;
use std::path::PathBuf;

fn roots_strategy() -> impl Strategy<Value = Option<Vec<PathBuf>>> {
    prop::option::of(prop::collection::vec("/[a-z]{1,6}", 0..4))
        .prop_map(|roots| roots.map(|r| r.into_iter().map(PathBuf::from).collect()))
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of(1u64..10_000),
        prop::option::of(1u64..10_000),
        roots_strategy(),
        prop::option::of(prop_oneof![Just(OutputFormat::Json), Just(OutputFormat::Human)]),
    )
        .prop_map(|(verify_hash, timeout_ms, busy, vault_roots, output_format)| Config {
            database: busy.map(|ms| DatabaseSettings {
                file_name: None,
                busy_timeout_ms: Some(ms),
            }),
            checker: Some(CheckerConfig {
                verify_hash,
                trash_dirs: None,
                vault_roots,
                timeout_ms,
            }),
            output_format,
            ..Default::default()
        })
}

proptest! {
    // Higher precedence values win wherever they are present
    #[test]
    fn merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        let low_checker = low.checker.unwrap_or_default();
        let high_checker = high.checker.unwrap_or_default();
        let merged_checker = merged.checker.unwrap_or_default();

        prop_assert_eq!(merged.output_format, high.output_format.or(low.output_format));
        prop_assert_eq!(merged_checker.verify_hash, high_checker.verify_hash.or(low_checker.verify_hash));
        prop_assert_eq!(merged_checker.timeout_ms, high_checker.timeout_ms.or(low_checker.timeout_ms));
    }

    // Vault roots from both layers survive the merge exactly once
    #[test]
    fn merge_vault_roots_is_union(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);
        let roots = merged.checker.unwrap_or_default().vault_roots.unwrap_or_default();

        for layer in [&low, &high] {
            for root in layer.checker.as_ref().and_then(|c| c.vault_roots.as_ref()).into_iter().flatten() {
                prop_assert!(roots.contains(root));
            }
        }
        let mut deduped = roots.clone();
        deduped.sort();
        deduped.dedup();
        let low_roots = low.checker.and_then(|c| c.vault_roots).unwrap_or_default();
        let mut low_deduped = low_roots.clone();
        low_deduped.sort();
        low_deduped.dedup();
        if low_deduped.len() == low_roots.len() {
            prop_assert_eq!(deduped.len(), roots.len());
        }
    }

    // Merging an empty config changes nothing
    #[test]
    fn merge_with_default_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    // YAML serialization round-trips
    #[test]
    fn config_yaml_roundtrip(config in config_strategy()) {
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(parsed, config);
    }
}
