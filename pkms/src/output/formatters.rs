//! Output formatter implementations.

use serde_json::json;

use crate::identity::Capability;
use crate::location::FileLocation;
use crate::resolver::{Currency, ResolvedTarget};
use crate::Result;

use super::OutputFormatter;

/// Formatter for JSON output.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_resolution(&self, target: &ResolvedTarget) -> Result<String> {
        Ok(serde_json::to_string_pretty(target)?)
    }

    fn format_location(&self, location: &FileLocation) -> Result<String> {
        let value = json!({
            "uri": location.to_uri(),
            "scheme": location.scheme(),
            "authority": location.authority(),
            "segments": location.segments(),
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// Formatter for human-readable output.
pub struct HumanFormatter;

fn currency_label(currency: Currency) -> &'static str {
    match currency {
        Currency::Current => "yes",
        Currency::Stale => "no",
        Currency::Unknown => "unknown",
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_resolution(&self, target: &ResolvedTarget) -> Result<String> {
        let mut lines = vec![format!("outcome:      {}", target.outcome)];
        if let Some(status) = target.resolution_status {
            lines.push(format!("status:       {status}"));
        }

        if let Some(identity) = &target.identity {
            let mut line = format!(
                "identity:     {}{}",
                identity.file_id,
                identity.extension.as_deref().unwrap_or_default()
            );
            if let Some(uid) = &identity.file_uid {
                line.push_str(&format!(" (uid {uid})"));
            }
            lines.push(line);
        }

        if let Some(revision) = &target.revision {
            lines.push(format!(
                "revision:     {} sha256:{} captured {}",
                revision.id,
                revision.content_hash,
                revision.captured_at.to_rfc3339()
            ));
        }

        if let Some(location) = &target.file_location {
            lines.push(format!("location:     {location}"));
        }
        lines.push(format!("current:      {}", currency_label(target.is_current)));

        if !target.available_capabilities.is_empty() {
            let names: Vec<&str> = target
                .available_capabilities
                .iter()
                .map(Capability::as_str)
                .collect();
            lines.push(format!("capabilities: {}", names.join(", ")));
        }

        if let Some(conflict) = &target.conflict {
            let observed = conflict
                .observed
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            lines.push(format!(
                "conflict:     expected {} observed {observed}",
                conflict.expected
            ));
        }
        if let Some(observed) = &target.observed_location {
            lines.push(format!("observed at:  {observed}"));
        }

        Ok(lines.join("\n"))
    }

    fn format_location(&self, location: &FileLocation) -> Result<String> {
        let mut lines = vec![
            location.to_uri(),
            format!("  scheme:    {}", location.scheme()),
            format!(
                "  authority: {}",
                location
                    .authority()
                    .map_or_else(|| "(none)".to_string(), |authority| format!("{authority:?}"))
            ),
        ];
        let segments = location.segments();
        lines.push(format!(
            "  path:      {} {:?}",
            if segments.is_rooted() { "rooted" } else { "relative" },
            segments.names()
        ));
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::identity::{ContentHash, FileId, Identity, Revision, RevisionId, SeqId};
    use crate::resolver::{HashConflict, Outcome, ResolutionStatus};

    fn current_target() -> ResolvedTarget {
        let identity = Identity::new(SeqId::from_raw(1), FileId::new("note").unwrap(), Some(".md"))
            .unwrap()
            .with_capabilities([Capability::new("render").unwrap()]);
        let revision = Revision::builder(
            RevisionId::new("r1").unwrap(),
            ContentHash::new("deadbeef").unwrap(),
            FileLocation::from_uri("file:///vault/note.md").unwrap(),
        )
        .build()
        .unwrap();
        let mut target = ResolvedTarget::for_revision(&identity, &revision, Outcome::ResolvedCurrent);
        target.is_current = Currency::Current;
        target.resolution_status = Some(ResolutionStatus::Ok);
        target
    }

    #[test]
    fn test_json_resolution_has_wire_fields() {
        let text = JsonFormatter.format_resolution(&current_target()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outcome"], "RESOLVED_CURRENT");
        assert_eq!(value["is_current"], true);
        assert_eq!(value["resolution_status"], "OK");
        assert_eq!(value["identity"]["file_id"], "note");
        assert_eq!(value["revision"]["id"], "r1");
        assert_eq!(value["file_location"]["scheme"], "file");
        assert!(value.get("conflict").is_none());
    }

    #[test]
    fn test_json_not_found() {
        let text = JsonFormatter
            .format_resolution(&ResolvedTarget::not_found(None))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outcome"], "NOT_FOUND");
        assert!(value["identity"].is_null());
        assert!(value["is_current"].is_null());
        assert!(value["resolution_status"].is_null());
    }

    #[test]
    fn test_json_location() {
        let location = FileLocation::from_uri("scheme:/a/b").unwrap();
        let text = JsonFormatter.format_location(&location).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["uri"], "scheme:/a/b");
        assert!(value["authority"].is_null());
        assert_eq!(value["segments"], json!([null, "a", "b"]));
    }

    #[test]
    fn test_human_resolution() {
        let text = HumanFormatter.format_resolution(&current_target()).unwrap();
        assert!(text.starts_with("outcome:      RESOLVED_CURRENT"));
        assert!(text.contains("status:       OK"));
        assert!(text.contains("identity:     note.md"));
        assert!(text.contains("location:     file:///vault/note.md"));
        assert!(text.contains("current:      yes"));
        assert!(text.contains("capabilities: render"));
    }

    #[test]
    fn test_human_conflict_without_observed_hash() {
        let mut target = current_target();
        target.outcome = Outcome::Conflict;
        target.is_current = Currency::Stale;
        target.conflict = Some(HashConflict {
            expected: ContentHash::new("aa").unwrap(),
            observed: None,
        });
        let text = HumanFormatter.format_resolution(&target).unwrap();
        assert!(text.contains("current:      no"));
        assert!(text.contains("conflict:     expected aa observed unknown"));
    }

    #[test]
    fn test_human_location_distinguishes_authority() {
        let absent = FileLocation::from_uri("scheme:/a").unwrap();
        let empty = FileLocation::from_uri("scheme:///a").unwrap();
        assert!(HumanFormatter
            .format_location(&absent)
            .unwrap()
            .contains("authority: (none)"));
        assert!(HumanFormatter
            .format_location(&empty)
            .unwrap()
            .contains("authority: \"\""));
    }

    #[test]
    fn test_create_formatter() {
        let location = FileLocation::from_uri("file:///a").unwrap();
        let json = OutputFormat::Json.create_formatter().format_location(&location).unwrap();
        assert!(json.trim_start().starts_with('{'));
        let human = OutputFormat::Human.create_formatter().format_location(&location).unwrap();
        assert!(human.starts_with("file:///a"));
    }
}
