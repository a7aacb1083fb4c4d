use anyhow::{Context, bail, ensure};
use tract_onnx::prelude::*;

use crate::source::Source;

/// Class id to human readable label. Ids are dense, from 0 to `len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    labels: Vec<String>,
}

impl ClassTable {
    pub fn load(source: &Source) -> TractResult<ClassTable> {
        let bytes = source.fetch_cached()?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("Label table {source} is not valid utf-8"))?;
        let table: ClassTable =
            text.parse().with_context(|| format!("Parsing label table {source}"))?;
        info!("Loaded {} labels from {source}", table.len());
        Ok(table)
    }

    pub fn from_labels(labels: impl IntoIterator<Item = impl Into<String>>) -> ClassTable {
        ClassTable { labels: labels.into_iter().map(|l| l.into()).collect() }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(|s| &**s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|s| &**s).enumerate()
    }
}

fn is_header(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    let mut fields = lower.split(',').map(|f| f.trim().trim_matches('"'));
    matches!(
        (fields.next(), fields.next(), fields.next()),
        (Some("id" | "index" | "class_id"), Some("name" | "label" | "class_name"), None)
    )
}

/// One line of a label table: an explicit id if the line carries one, and the label.
fn parse_line(line: &str) -> (Option<usize>, String) {
    if let Some((id, name)) = line.split_once(',') {
        if let Ok(id) = id.trim().parse::<usize>() {
            return (Some(id), name.trim().trim_matches('"').to_string());
        }
    }
    if let Some((id, name)) = line.split_once(char::is_whitespace) {
        if let Ok(id) = id.parse::<usize>() {
            return (Some(id), name.trim().to_string());
        }
    }
    (None, line.to_string())
}

impl std::str::FromStr for ClassTable {
    type Err = TractError;

    fn from_str(text: &str) -> TractResult<ClassTable> {
        let mut entries: Vec<(usize, String)> = vec![];
        for (ix, line) in text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).enumerate() {
            if ix == 0 && is_header(line) {
                continue;
            }
            let (id, label) = parse_line(line);
            ensure!(!label.is_empty(), "Empty label on line {:?}", line);
            entries.push((id.unwrap_or(entries.len()), label));
        }
        ensure!(!entries.is_empty(), "No label found");
        let mut labels = vec![None; entries.len()];
        for (id, label) in entries {
            let Some(slot) = labels.get_mut(id) else {
                bail!("Class id {id} out of range, table has {} entries", labels.len())
            };
            if let Some(previous) = slot.replace(label) {
                bail!("Class id {id} defined twice (first as {previous:?})")
            }
        }
        // Every slot is filled: ids are unique and in range, and there are as many as slots.
        Ok(ClassTable { labels: labels.into_iter().flatten().collect() })
    }
}
