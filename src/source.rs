//! Supply of event records to the analysis
//!
//! Records are materialized one at a time: a source only knows where each
//! record lives, and decodes a fresh `Event` whenever one is requested.

use crate::event::Event;
use eyre::{eyre, Result, WrapErr};
use std::{fs, ops::Range, path::Path};

/// Random-access supplier of event records
pub trait EventSource: Sync {
    /// Number of records available
    fn num_events(&self) -> usize;

    /// Decode the record at a given index
    fn event(&self, index: usize) -> Result<Event>;
}

/// Event records stored as JSON, one per non-blank line
pub struct JsonLinesSource {
    /// Raw file contents
    text: String,

    /// Byte range of each record within `text`
    records: Vec<Range<usize>>,
}
//
impl JsonLinesSource {
    /// Read and index a JSON-lines event file
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read event file {}", path.display()))?;
        Ok(Self::from_text(text))
    }

    /// Index JSON-lines data that is already in memory
    pub fn from_text(text: String) -> Self {
        let mut records = Vec::new();
        let mut start = 0;
        for line in text.split_inclusive('\n') {
            let end = start + line.len();
            if !line.trim().is_empty() {
                records.push(start..end);
            }
            start = end;
        }
        Self { text, records }
    }
}
//
impl EventSource for JsonLinesSource {
    fn num_events(&self) -> usize {
        self.records.len()
    }

    fn event(&self, index: usize) -> Result<Event> {
        let range = self
            .records
            .get(index)
            .ok_or_else(|| eyre!("Event {index} is out of range ({} events)", self.records.len()))?;
        let event: Event = serde_json::from_str(&self.text[range.clone()])
            .wrap_err_with(|| format!("Malformed record for event {index}"))?;
        event
            .validate()
            .wrap_err_with(|| format!("Inconsistent record for event {index}"))?;
        Ok(event)
    }
}

/// Truth that a dataset file holds signal events, judging from its base name
pub fn is_signal_dataset(path: &Path, signal_prefix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with(signal_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_EVENTS: &str = r#"{"met": {"pt": 10.0, "phi": 0.5}}

{"jets": {"pt": [150.0, 90.0], "eta": [0.5, -0.8], "phi": [0.3, 2.9], "mass": [10.0, 8.0], "tight_lep_veto_id": [true, true], "btag_score": [0.5, 0.5]}, "met": {"pt": 50.0, "phi": -1.2}}
"#;

    #[test]
    fn reads_records_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_EVENTS.as_bytes()).unwrap();
        let source = JsonLinesSource::open(file.path()).unwrap();
        assert_eq!(source.num_events(), 2);
        assert_eq!(source.event(0).unwrap().met.pt, 10.0);
        let second = source.event(1).unwrap();
        assert_eq!(second.jets.kin.pt, vec![150.0, 90.0]);
        assert!(source.event(2).is_err());
    }

    #[test]
    fn empty_and_missing_files() {
        let source = JsonLinesSource::from_text(String::new());
        assert_eq!(source.num_events(), 0);
        assert!(JsonLinesSource::open(Path::new("/nonexistent/events.jsonl")).is_err());
    }

    #[test]
    fn bad_records_are_reported() {
        let source = JsonLinesSource::from_text(
            "{\"met\": {\"pt\": 1.0}}\nnot json\n{\"jets\": {\"pt\": [1.0]}}".to_owned(),
        );
        assert_eq!(source.num_events(), 3);
        assert!(source.event(0).is_ok());
        let err = source.event(1).unwrap_err();
        assert!(format!("{err:#}").contains("event 1"));
        assert!(source.event(2).is_err());
    }

    #[test]
    fn dataset_identity() {
        assert!(is_signal_dataset(Path::new("/data/GluGluH-signal.jsonl"), "GluGluH"));
        assert!(!is_signal_dataset(Path::new("/data/GluGluH/TTbar.jsonl"), "GluGluH"));
        assert!(!is_signal_dataset(Path::new("/"), "GluGluH"));
    }
}
