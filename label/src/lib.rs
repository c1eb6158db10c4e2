//! Class label schema and the label map document consumed by the detection trainer.

use anyhow::{bail, ensure, format_err, Context, Result};
use indexmap::IndexSet;
use std::{fs, io, path::Path};

/// The set of class names of a dataset and their integer ids.
///
/// Classes are kept sorted. The id used when encoding examples is the
/// zero-based position of the class, while the label map document numbers
/// the same classes starting from one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSchema {
    classes: IndexSet<String>,
}

impl LabelSchema {
    /// Builds the schema from class name occurrences in any order, duplicates allowed.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: IndexSet<String> = names.into_iter().map(Into::into).collect();
        classes.sort();
        Self { classes }
    }

    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The zero-based id used in encoded examples.
    pub fn id_of(&self, class_name: &str) -> Option<i64> {
        self.classes
            .get_index_of(class_name)
            .map(|index| index as i64)
    }

    /// The one-based id written to the label map document.
    pub fn display_id_of(&self, class_name: &str) -> Option<i64> {
        self.id_of(class_name).map(|id| id + 1)
    }

    /// Iterates over `(class name, zero-based id)` pairs in id order.
    pub fn label_to_id(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), index as i64))
    }

    /// Renders the label map document.
    ///
    /// Items are separated by a blank line and the document has no trailing newline.
    pub fn to_pbtxt(&self) -> String {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, name)| {
                format!(
                    "item {{\n    id: {}\n    name: '{}'\n    display_name: '{}'\n }}",
                    index + 1,
                    name,
                    name
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Writes the label map document to a file.
    pub fn save<P>(&self, path: P) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        fs::write(path, self.to_pbtxt())
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read label map '{}'", path.display()))?;
        Self::from_pbtxt(&text)
            .with_context(|| format!("failed to parse label map '{}'", path.display()))
    }

    /// Parses a label map document.
    ///
    /// The items must carry the ids `1..=N` for the sorted class names, which
    /// holds for every document produced by [LabelSchema::to_pbtxt].
    pub fn from_pbtxt(text: &str) -> Result<Self> {
        let mut items: Vec<(i64, String)> = vec![];
        let mut id: Option<i64> = None;
        let mut name: Option<String> = None;
        let mut in_item = false;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            let lineno = lineno + 1;

            if line.is_empty() {
                continue;
            }

            if line == "item {" {
                ensure!(!in_item, "line {}: nested item block", lineno);
                in_item = true;
            } else if line == "}" {
                ensure!(in_item, "line {}: unexpected '}}'", lineno);
                let id = id
                    .take()
                    .ok_or_else(|| format_err!("line {}: item without id", lineno))?;
                let name = name
                    .take()
                    .ok_or_else(|| format_err!("line {}: item without name", lineno))?;
                items.push((id, name));
                in_item = false;
            } else if let Some(value) = line.strip_prefix("id:") {
                ensure!(in_item, "line {}: id outside of item", lineno);
                let value: i64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("line {}: invalid id", lineno))?;
                id = Some(value);
            } else if let Some(value) = line.strip_prefix("name:") {
                ensure!(in_item, "line {}: name outside of item", lineno);
                name = Some(unquote(value.trim()).to_string());
            } else if line.starts_with("display_name:") {
                ensure!(in_item, "line {}: display_name outside of item", lineno);
            } else {
                bail!("line {}: unexpected content '{}'", lineno, line);
            }
        }
        ensure!(!in_item, "unterminated item block");

        let schema = Self::from_names(items.iter().map(|(_, name)| name.as_str()));
        ensure!(
            schema.len() == items.len(),
            "duplicated class names found in label map"
        );

        for (id, name) in &items {
            let expect = schema.display_id_of(name);
            if expect != Some(*id) {
                log::warn!(
                    "class '{}' has id {} but {} is expected from its sorted position",
                    name,
                    id,
                    expect.unwrap_or_default()
                );
                bail!("ids in label map are not assigned in sorted class order");
            }
        }

        Ok(schema)
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|value| value.strip_suffix('\''))
        .or_else(|| {
            value
                .strip_prefix('"')
                .and_then(|value| value.strip_suffix('"'))
        })
        .unwrap_or(value)
}
