// src/sink.rs

use std::io::Write;

use crate::error::Result;
use crate::model::Record;

/// Append-only destination for extracted records.
pub trait OutputHandler {
    fn write(&mut self, record: Record) -> Result<()>;
}

/// Collects records in memory, in write order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Moves every collected record into `sink`, preserving order.
    pub fn drain_into(self, sink: &mut dyn OutputHandler) -> Result<usize> {
        let count = self.records.len();
        for record in self.records {
            sink.write(record)?;
        }
        Ok(count)
    }
}

impl OutputHandler for MemorySink {
    fn write(&mut self, record: Record) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}

/// Writes one JSON object per record and line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> OutputHandler for JsonLinesSink<W> {
    fn write(&mut self, record: Record) -> Result<()> {
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitRecord;

    fn commit(id: &str) -> Record {
        Record::Commit(CommitRecord {
            repo_id: 1,
            commit_id: id.to_string(),
            author_name: "Ann".into(),
            author_email: "ann@example.com".into(),
            author_time: 0,
            committer_name: "Ann".into(),
            committer_email: "ann@example.com".into(),
            committer_time: 0,
            message: "msg\n".into(),
            parent_count: 0,
            tree_id: "t".into(),
        })
    }

    #[test]
    fn memory_sink_drains_in_order() {
        let mut acc = MemorySink::new();
        acc.write(commit("a")).unwrap();
        acc.write(commit("b")).unwrap();

        let mut target = MemorySink::new();
        assert_eq!(acc.drain_into(&mut target).unwrap(), 2);
        let ids: Vec<&str> = target.records().iter().map(Record::commit_id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn json_lines_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write(commit("a")).unwrap();
        sink.write(commit("b")).unwrap();
        assert_eq!(sink.written(), 2);

        let bytes = sink.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: Record = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, commit("b"));
    }
}
