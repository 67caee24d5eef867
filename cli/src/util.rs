use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use armora_core::error::{AssessmentError, ErrorReport, codes};
use armora_core::responses::ResponseMap;
use armora_core::snapshot::{AssessmentSnapshot, InMemoryRecordStore, RecordStore, SnapshotFilter};
use serde::Serialize;
use uuid::Uuid;

/// Exit codes: 0=success, 1=validation failure reported, 4=usage/input error
pub const EXIT_OK: i32 = 0;
pub const EXIT_INVALID: i32 = 1;
pub const EXIT_USAGE: i32 = 4;

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut report = ErrorReport::new(codes::CLI_ERROR, message);
    if let Some(hint) = docs_hint {
        report = report.with_hint(hint);
    }
    print_error(&report);
    std::process::exit(EXIT_USAGE);
}

pub fn print_error(report: &ErrorReport) {
    match serde_json::to_string_pretty(report) {
        Ok(body) => eprintln!("{body}"),
        Err(_) => eprintln!("{}: {}", report.error, report.message),
    }
}

/// Print an engine error as a structured report and return the usage exit code.
pub fn fail(err: &AssessmentError) -> i32 {
    print_error(&ErrorReport::from(err));
    EXIT_USAGE
}

/// Print a JSON result: stdout on success, stderr otherwise. Returns `exit_code`.
pub fn emit<T: Serialize>(value: &T, raw: bool, exit_code: i32) -> i32 {
    let formatted = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    let formatted = match formatted {
        Ok(f) => f,
        Err(e) => {
            print_error(&ErrorReport::new(
                codes::CLI_ERROR,
                format!("Failed to serialize output: {e}"),
            ));
            return EXIT_USAGE;
        }
    };

    if exit_code == EXIT_OK {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }
    exit_code
}

/// Default store location, overridable with `--store` / `ARMORA_STORE_PATH`.
pub fn store_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("armora")
        .join("assessments.json")
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

/// Load a response map; no path means nothing has been answered yet.
pub fn read_responses(path: Option<&str>) -> Result<ResponseMap, String> {
    let Some(path) = path else {
        return Ok(ResponseMap::new());
    };
    let value = read_json_from_file(path)?;
    serde_json::from_value(value)
        .map_err(|e| format!("Responses in '{path}' must be an object keyed by step: {e}"))
}

/// Snapshot store backed by a single JSON array on disk.
///
/// The whole file is loaded on open and rewritten after every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: InMemoryRecordStore,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AssessmentError> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => InMemoryRecordStore::new(),
            Ok(data) => {
                let snapshots: Vec<AssessmentSnapshot> = serde_json::from_str(&data).map_err(|e| {
                    AssessmentError::Store(format!("invalid store file '{}': {e}", path.display()))
                })?;
                InMemoryRecordStore::from_records(snapshots)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => InMemoryRecordStore::new(),
            Err(e) => {
                return Err(AssessmentError::Store(format!(
                    "cannot read '{}': {e}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AssessmentError> {
        let io_err = |e: std::io::Error| {
            AssessmentError::Store(format!("cannot write '{}': {e}", self.path.display()))
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut snapshots: Vec<&AssessmentSnapshot> = self.records.records().collect();
        snapshots.sort_by_key(|s| (s.completed_at, s.id));
        let data = serde_json::to_string_pretty(&snapshots)
            .map_err(|e| AssessmentError::Store(e.to_string()))?;

        // Snapshots describe a client's risk profile: owner-only (0o600)
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(data.as_bytes()).map_err(io_err)
    }
}

impl RecordStore for JsonFileStore {
    fn create(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError> {
        let created = self.records.create(snapshot)?;
        self.persist()?;
        Ok(created)
    }

    fn get(&self, id: Uuid) -> Result<Option<AssessmentSnapshot>, AssessmentError> {
        self.records.get(id)
    }

    fn update(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError> {
        let updated = self.records.update(snapshot)?;
        self.persist()?;
        Ok(updated)
    }

    fn query(&self, filter: &SnapshotFilter) -> Result<Vec<AssessmentSnapshot>, AssessmentError> {
        self.records.query(filter)
    }
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
