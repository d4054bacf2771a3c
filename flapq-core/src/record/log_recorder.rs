use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Writes records through the `log` facade.
///
/// Stored records are aggregated with [`RecordStorage`] and written as a single
/// line at every flush, keys in alphabetical order.
pub struct LogRecorder {
    storage: RecordStorage,
    prefix: String,
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new("train")
    }
}

impl LogRecorder {
    /// Constructs the recorder. `prefix` starts every logged line.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            storage: RecordStorage::new(),
            prefix: prefix.into(),
        }
    }

    fn format(record: &Record) -> String {
        let mut items = record
            .iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{}={}", k, v),
                RecordValue::DateTime(v) => format!("{}={}", k, v.format("%Y-%m-%d %H:%M:%S")),
            })
            .collect::<Vec<_>>();
        items.sort();
        items.join(", ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("{}: {}", self.prefix, Self::format(&record));
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            info!("{} ({}): {}", self.prefix, step, Self::format(&record));
        }
    }
}
