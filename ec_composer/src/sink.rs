// Output sinks: persistence of finished compositions and chart data.
//
// Both are observers. Nothing written here feeds back into the search.
//
// - `CompositionSink` receives a composition id and its text dump.
//   `TextFileSink` writes one `<id>.txt` per composition.
// - `ChartSink` receives per-generation average scores (a line series per
//   style) and per-individual (generation of origin, final score) points (a
//   scatter series per style). `ChartData` collects them in memory;
//   `JsonChartSink` writes the collected data as JSON.

use crate::composition::CompositionId;
use crate::error::SinkError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub trait CompositionSink {
    fn persist(&mut self, id: &CompositionId, text: &str) -> Result<(), SinkError>;
}

/// Writes each composition to `<dir>/<id>.txt`.
#[derive(Clone, Debug)]
pub struct TextFileSink {
    dir: PathBuf,
}

impl TextFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TextFileSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &CompositionId) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }
}

impl CompositionSink for TextFileSink {
    fn persist(&mut self, id: &CompositionId, text: &str) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(id);
        std::fs::write(&path, text).map_err(|source| SinkError::Io { path, source })
    }
}

pub trait ChartSink {
    /// One point of a line series: `label`'s average at `generation`.
    fn record_generation(&mut self, label: &str, generation: u64, value: f64);

    /// One point of a scatter series.
    fn record_scatter(&mut self, label: &str, x: f64, y: f64);
}

/// Chart series collected in memory, keyed by label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub lines: BTreeMap<String, Vec<(u64, f64)>>,
    pub scatter: BTreeMap<String, Vec<(f64, f64)>>,
}

impl ChartSink for ChartData {
    fn record_generation(&mut self, label: &str, generation: u64, value: f64) {
        self.lines.entry(label.to_string()).or_default().push((generation, value));
    }

    fn record_scatter(&mut self, label: &str, x: f64, y: f64) {
        self.scatter.entry(label.to_string()).or_default().push((x, y));
    }
}

/// Collects chart data and writes it as pretty JSON on `finish()`.
#[derive(Debug)]
pub struct JsonChartSink {
    path: PathBuf,
    data: ChartData,
}

impl JsonChartSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonChartSink {
            path: path.into(),
            data: ChartData::default(),
        }
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn finish(self) -> Result<PathBuf, SinkError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path)
    }
}

impl ChartSink for JsonChartSink {
    fn record_generation(&mut self, label: &str, generation: u64, value: f64) {
        self.data.record_generation(label, generation, value);
    }

    fn record_scatter(&mut self, label: &str, x: f64, y: f64) {
        self.data.record_scatter(label, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(serial: u64) -> CompositionId {
        CompositionId {
            serial,
            namespace: "sink".into(),
        }
    }

    #[test]
    fn text_sink_writes_one_file_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = TextFileSink::new(dir.path().join("out"));
        sink.persist(&id(1), "first").unwrap();
        sink.persist(&id(2), "second").unwrap();
        let text = std::fs::read_to_string(sink.path_for(&id(2))).unwrap();
        assert_eq!(text, "second");
        assert!(sink.path_for(&id(1)).ends_with("sink-C0001.txt"));
    }

    #[test]
    fn text_sink_reports_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let mut sink = TextFileSink::new(&blocker);
        let err = sink.persist(&id(1), "x").unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }), "{err}");
    }

    #[test]
    fn chart_data_groups_by_label() {
        let mut data = ChartData::default();
        data.record_generation("a", 1, 0.5);
        data.record_generation("a", 2, 0.6);
        data.record_generation("b", 1, 0.1);
        data.record_scatter("a", 3.0, 0.9);
        assert_eq!(data.lines["a"], vec![(1, 0.5), (2, 0.6)]);
        assert_eq!(data.lines["b"].len(), 1);
        assert_eq!(data.scatter["a"], vec![(3.0, 0.9)]);
    }

    #[test]
    fn json_sink_writes_collected_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonChartSink::new(dir.path().join("charts").join("run.json"));
        sink.record_generation("golden", 1, 0.75);
        sink.record_scatter("golden", 1.0, 0.9);
        let expected = sink.data().clone();
        let path = sink.finish().unwrap();
        let restored: ChartData = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(restored, expected);
    }
}
