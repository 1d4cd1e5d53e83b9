//! Configuration merging and precedence handling.
//!
//! This module implements hierarchical merging of configuration sources,
//! with special handling for accumulated fields like `checker.vault_roots`.

use crate::config::loader::ConfigSource;
use crate::config::schema::{CheckerConfig, Config, DatabaseSettings, ResolveConfig};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use pkms::config::{Config, ConfigMerger, OutputFormat};
///
/// let low = Config { output_format: Some(OutputFormat::Json), ..Default::default() };
/// let high = Config { output_format: Some(OutputFormat::Human), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.output_format, Some(OutputFormat::Human));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();

        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }

        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// # Merging Rules
    ///
    /// - Simple fields: source overwrites if Some
    /// - Nested configs: field-by-field merge
    /// - Vault roots: accumulated (union, first occurrence order)
    /// - Trash dirs: replaced as a whole
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.workspace_dir.is_some() {
            target.workspace_dir.clone_from(&source.workspace_dir);
        }

        if source.log_mode.is_some() {
            target.log_mode = source.log_mode;
        }

        if source.output_format.is_some() {
            target.output_format = source.output_format;
        }

        if let Some(ref source_db) = source.database {
            target.database = Some(match &target.database {
                Some(target_db) => Self::merge_database(target_db, source_db),
                None => source_db.clone(),
            });
        }

        if let Some(ref source_checker) = source.checker {
            target.checker = Some(match &target.checker {
                Some(target_checker) => Self::merge_checker(target_checker, source_checker),
                None => source_checker.clone(),
            });
        }

        if let Some(source_resolve) = source.resolve {
            target.resolve = Some(match target.resolve {
                Some(target_resolve) => ResolveConfig {
                    include_status: source_resolve
                        .include_status
                        .or(target_resolve.include_status),
                },
                None => source_resolve,
            });
        }
    }

    fn merge_database(target: &DatabaseSettings, source: &DatabaseSettings) -> DatabaseSettings {
        DatabaseSettings {
            file_name: source.file_name.clone().or_else(|| target.file_name.clone()),
            busy_timeout_ms: source.busy_timeout_ms.or(target.busy_timeout_ms),
        }
    }

    fn merge_checker(target: &CheckerConfig, source: &CheckerConfig) -> CheckerConfig {
        let vault_roots = match (&target.vault_roots, &source.vault_roots) {
            (Some(existing), Some(added)) => {
                let mut roots = existing.clone();
                for root in added {
                    if !roots.contains(root) {
                        roots.push(root.clone());
                    }
                }
                Some(roots)
            }
            (existing, None) => existing.clone(),
            (None, added) => added.clone(),
        };

        CheckerConfig {
            verify_hash: source.verify_hash.or(target.verify_hash),
            trash_dirs: source.trash_dirs.clone().or_else(|| target.trash_dirs.clone()),
            vault_roots,
            timeout_ms: source.timeout_ms.or(target.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OutputFormat;
    use crate::logging::LogLevel;
    use std::path::PathBuf;

    fn make_source(precedence: u8, config: Config) -> ConfigSource {
        ConfigSource {
            path: PathBuf::from(format!("test-{precedence}.yaml")),
            precedence,
            config,
        }
    }

    fn checker(roots: &[&str]) -> CheckerConfig {
        CheckerConfig {
            vault_roots: Some(roots.iter().map(PathBuf::from).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_simple_fields() {
        let mut target = Config::default();
        let source = Config {
            workspace_dir: Some(PathBuf::from("/ws")),
            log_mode: Some(LogLevel::Quiet),
            ..Default::default()
        };

        ConfigMerger::merge_into(&mut target, &source);
        assert_eq!(target.workspace_dir, Some(PathBuf::from("/ws")));
        assert_eq!(target.log_mode, Some(LogLevel::Quiet));
    }

    #[test]
    fn test_merge_none_does_not_overwrite() {
        let mut target = Config {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        ConfigMerger::merge_into(&mut target, &Config::default());
        assert_eq!(target.output_format, Some(OutputFormat::Human));
    }

    #[test]
    fn test_merge_nested_field_by_field() {
        let mut target = Config {
            database: Some(DatabaseSettings {
                file_name: Some("a.db".into()),
                busy_timeout_ms: Some(100),
            }),
            checker: Some(CheckerConfig {
                verify_hash: Some(false),
                timeout_ms: Some(1000),
                ..Default::default()
            }),
            resolve: Some(ResolveConfig {
                include_status: Some(true),
            }),
            ..Default::default()
        };
        let source = Config {
            database: Some(DatabaseSettings {
                file_name: None,
                busy_timeout_ms: Some(300),
            }),
            checker: Some(CheckerConfig {
                timeout_ms: Some(50),
                ..Default::default()
            }),
            resolve: Some(ResolveConfig::default()),
            ..Default::default()
        };

        ConfigMerger::merge_into(&mut target, &source);
        let database = target.database.unwrap();
        assert_eq!(database.file_name.as_deref(), Some("a.db"));
        assert_eq!(database.busy_timeout_ms, Some(300));
        let checker = target.checker.unwrap();
        assert_eq!(checker.verify_hash, Some(false));
        assert_eq!(checker.timeout_ms, Some(50));
        assert_eq!(target.resolve.unwrap().include_status, Some(true));
    }

    #[test]
    fn test_merge_vault_roots_accumulate() {
        let mut target = Config {
            checker: Some(checker(&["/a", "/b"])),
            ..Default::default()
        };
        let source = Config {
            checker: Some(checker(&["/b", "/c"])),
            ..Default::default()
        };

        ConfigMerger::merge_into(&mut target, &source);
        assert_eq!(
            target.checker.unwrap().vault_roots.unwrap(),
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn test_merge_trash_dirs_replace() {
        let mut target = Config {
            checker: Some(CheckerConfig {
                trash_dirs: Some(vec![PathBuf::from(".trash")]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let source = Config {
            checker: Some(CheckerConfig {
                trash_dirs: Some(vec![PathBuf::from("/bin")]),
                ..Default::default()
            }),
            ..Default::default()
        };

        ConfigMerger::merge_into(&mut target, &source);
        assert_eq!(
            target.checker.unwrap().trash_dirs,
            Some(vec![PathBuf::from("/bin")])
        );
    }

    #[test]
    fn test_merge_sources_in_order() {
        let sources = vec![
            make_source(
                1,
                Config {
                    output_format: Some(OutputFormat::Json),
                    log_mode: Some(LogLevel::Verbose),
                    ..Default::default()
                },
            ),
            make_source(
                2,
                Config {
                    output_format: Some(OutputFormat::Human),
                    ..Default::default()
                },
            ),
        ];

        let result = ConfigMerger::merge(sources);
        assert_eq!(result.output_format, Some(OutputFormat::Human));
        assert_eq!(result.log_mode, Some(LogLevel::Verbose));
    }
}
