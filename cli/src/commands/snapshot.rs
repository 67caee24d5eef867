use std::path::Path;

use armora_core::calculator::RiskLevel;
use armora_core::error::AssessmentError;
use armora_core::responses::ResponseMap;
use armora_core::service::ServiceTier;
use armora_core::snapshot::{AssessmentSnapshot, RecordStore, SnapshotFilter};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::util::{EXIT_OK, JsonFileStore, emit, exit_error, fail, read_responses, store_path};

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Score responses and persist the outcome
    Save {
        /// Responses JSON file (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
    },
    /// List saved snapshots, oldest first
    List {
        /// Only snapshots at this risk level (GREEN, YELLOW, ORANGE, RED)
        #[arg(long)]
        level: Option<String>,
        /// Only snapshots recommending this tier (e.g. "armora-executive")
        #[arg(long)]
        tier: Option<String>,
        /// Only snapshots completed after this timestamp (RFC3339)
        #[arg(long)]
        since: Option<String>,
    },
}

pub fn run(store: Option<&Path>, command: SnapshotCommands, raw: bool) -> i32 {
    let path = store_path(store);
    let mut store = match JsonFileStore::open(&path) {
        Ok(store) => store,
        Err(err) => return fail(&err),
    };
    tracing::debug!(path = %store.path().display(), "opened snapshot store");

    match command {
        SnapshotCommands::Save { responses } => {
            let responses = read_responses(responses.as_deref())
                .unwrap_or_else(|e| exit_error(&e, Some("Pass --responses <file> or '-' for stdin")));
            match save(&mut store, &responses) {
                Ok(snapshot) => emit(&snapshot, raw, EXIT_OK),
                Err(err) => fail(&err),
            }
        }
        SnapshotCommands::List { level, tier, since } => {
            let filter = parse_filter(level.as_deref(), tier.as_deref(), since.as_deref());
            match store.query(&filter) {
                Ok(snapshots) => emit(
                    &json!({ "count": snapshots.len(), "snapshots": snapshots }),
                    raw,
                    EXIT_OK,
                ),
                Err(err) => fail(&err),
            }
        }
    }
}

fn save(
    store: &mut impl RecordStore,
    responses: &ResponseMap,
) -> Result<AssessmentSnapshot, AssessmentError> {
    let snapshot = store.create(AssessmentSnapshot::capture(responses))?;
    tracing::info!(
        id = %snapshot.id,
        level = %snapshot.risk_level,
        tier = %snapshot.service_tier,
        "saved assessment snapshot"
    );
    Ok(snapshot)
}

fn parse_filter(level: Option<&str>, tier: Option<&str>, since: Option<&str>) -> SnapshotFilter {
    let risk_level = level.map(|raw| {
        RiskLevel::parse(raw).unwrap_or_else(|| {
            exit_error(
                &format!("Unknown risk level '{raw}'"),
                Some("Use GREEN, YELLOW, ORANGE or RED"),
            )
        })
    });
    let service_tier = tier.map(|raw| {
        ServiceTier::parse(raw).unwrap_or_else(|| {
            exit_error(
                &format!("Unknown service tier '{raw}'"),
                Some("Use armora-standard, armora-executive or armora-shadow"),
            )
        })
    });
    let completed_after = since.map(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|e| exit_error(&format!("Invalid --since '{raw}': {e}"), None))
    });

    SnapshotFilter {
        risk_level,
        service_tier,
        completed_after,
    }
}

#[cfg(test)]
mod tests {
    use armora_core::responses::keys;
    use armora_core::snapshot::InMemoryRecordStore;

    use super::*;

    #[test]
    fn save_persists_captured_snapshot() {
        let mut store = InMemoryRecordStore::new();
        let responses = ResponseMap::new()
            .with(keys::PROFESSIONAL_PROFILE, "celebrity")
            .with(keys::COVERAGE_AREAS, vec!["international_specialized"]);
        let snapshot = save(&mut store, &responses).unwrap();
        assert_eq!(snapshot.risk_level, RiskLevel::Orange);
        assert_eq!(store.get(snapshot.id).unwrap(), Some(snapshot));
    }

    #[test]
    fn filter_parses_all_criteria() {
        let filter = parse_filter(Some("orange"), Some("armora-shadow"), Some("2025-06-01T09:00:00Z"));
        assert_eq!(filter.risk_level, Some(RiskLevel::Orange));
        assert_eq!(filter.service_tier, Some(ServiceTier::Shadow));
        assert!(filter.completed_after.is_some());
        assert_eq!(parse_filter(None, None, None), SnapshotFilter::default());
    }
}
