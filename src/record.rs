//! Patent metadata record and its on-disk text format.
//!
//! The metadata file is line-oriented so a human can read it and so it stays
//! parseable after hand edits:
//!
//! ```text
//! Patent Number: US1234567B2
//! Title: Widget assembly
//! Filing Date: 2019-03-04
//! Publication Date: 2021-06-01
//! Inventors: Ada Lovelace, Charles Babbage
//!
//! Abstract:
//! Free-form text up to the end of the file.
//! ```
//!
//! Every field is described once in [`METADATA_SCHEMA`]. The writer
//! ([`MetadataRecord::to_metadata_text`]), the tolerant reader
//! ([`parse_metadata`]) and the HTML extractor all walk that schema, so a
//! field's default applies the same way whichever source built the record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder stored for a text field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Metadata for one patent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub patent_number: String,
    pub title: String,
    pub filing_date: String,
    pub publication_date: String,
    pub inventors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Field names of [`MetadataRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    PatentNumber,
    Title,
    FilingDate,
    PublicationDate,
    Inventors,
    Abstract,
}

/// How a field is laid out in the metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `Label: value` on one line.
    Line,
    /// `Label: a, b, c` on one line, split into a list.
    List,
    /// A blank line, `Label:` on its own line, then text to end of file.
    Block,
}

/// Value used when a field is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// [`NOT_AVAILABLE`].
    NotAvailable,
    /// An empty list.
    Empty,
    /// The identifier the record was requested for.
    Identifier,
}

/// One entry of [`METADATA_SCHEMA`].
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

/// The metadata file layout, in file order.
pub const METADATA_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        field: Field::PatentNumber,
        label: "Patent Number",
        kind: FieldKind::Line,
        default: FieldDefault::Identifier,
    },
    FieldSpec {
        field: Field::Title,
        label: "Title",
        kind: FieldKind::Line,
        default: FieldDefault::NotAvailable,
    },
    FieldSpec {
        field: Field::FilingDate,
        label: "Filing Date",
        kind: FieldKind::Line,
        default: FieldDefault::NotAvailable,
    },
    FieldSpec {
        field: Field::PublicationDate,
        label: "Publication Date",
        kind: FieldKind::Line,
        default: FieldDefault::NotAvailable,
    },
    FieldSpec {
        field: Field::Inventors,
        label: "Inventors",
        kind: FieldKind::List,
        default: FieldDefault::Empty,
    },
    FieldSpec {
        field: Field::Abstract,
        label: "Abstract",
        kind: FieldKind::Block,
        default: FieldDefault::NotAvailable,
    },
];

/// Compiled extraction patterns, index-aligned with [`METADATA_SCHEMA`].
static SCHEMA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    METADATA_SCHEMA
        .iter()
        .map(|spec| {
            let label = regex::escape(spec.label);
            let pattern = match spec.kind {
                FieldKind::Line | FieldKind::List => format!(r"(?m)^{label}:[ \t]*([^\r\n]*)"),
                FieldKind::Block => format!(r"(?ms)^{label}:[ \t]*(?:\r?\n(.*))?\z"),
            };
            Regex::new(&pattern).unwrap()
        })
        .collect()
});

const LIST_SEPARATOR: &str = ", ";

/// A raw field value before it is stored in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(t) => t.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Collapse every whitespace run, line breaks included, into one space.
    fn single_line(self) -> Self {
        let collapse = |t: &str| t.split_whitespace().collect::<Vec<_>>().join(" ");
        match self {
            FieldValue::Text(t) => FieldValue::Text(collapse(&t)),
            FieldValue::List(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| collapse(item))
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
        }
    }

    fn into_text(self) -> String {
        match self {
            FieldValue::Text(t) => t,
            FieldValue::List(items) => items.join(LIST_SEPARATOR),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::Text(t) => split_list(&t),
            FieldValue::List(items) => items,
        }
    }
}

impl FieldDefault {
    fn value(self, id: &str) -> FieldValue {
        match self {
            FieldDefault::NotAvailable => FieldValue::Text(NOT_AVAILABLE.to_string()),
            FieldDefault::Empty => FieldValue::List(Vec::new()),
            FieldDefault::Identifier => FieldValue::Text(id.to_string()),
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl MetadataRecord {
    /// Build a record by asking `lookup` for each schema field in order.
    ///
    /// `lookup` receives the field's index in [`METADATA_SCHEMA`] and its
    /// spec. Values of one-line fields are collapsed onto a single line, and
    /// a `None` or blank answer is replaced by the field's default.
    pub fn from_fields(
        id: &str,
        mut lookup: impl FnMut(usize, &FieldSpec) -> Option<FieldValue>,
    ) -> Self {
        let mut record = Self {
            patent_number: String::new(),
            title: String::new(),
            filing_date: String::new(),
            publication_date: String::new(),
            inventors: Vec::new(),
            abstract_text: String::new(),
        };
        for (index, spec) in METADATA_SCHEMA.iter().enumerate() {
            let value = lookup(index, spec)
                .map(|v| match spec.kind {
                    FieldKind::Line | FieldKind::List => v.single_line(),
                    FieldKind::Block => v,
                })
                .filter(|v| !v.is_blank())
                .unwrap_or_else(|| spec.default.value(id));
            record.set(spec.field, value);
        }
        record
    }

    fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::PatentNumber => self.patent_number = value.into_text(),
            Field::Title => self.title = value.into_text(),
            Field::FilingDate => self.filing_date = value.into_text(),
            Field::PublicationDate => self.publication_date = value.into_text(),
            Field::Inventors => self.inventors = value.into_list(),
            Field::Abstract => self.abstract_text = value.into_text(),
        }
    }

    fn rendered(&self, field: Field) -> String {
        match field {
            Field::PatentNumber => self.patent_number.clone(),
            Field::Title => self.title.clone(),
            Field::FilingDate => self.filing_date.clone(),
            Field::PublicationDate => self.publication_date.clone(),
            Field::Inventors => self.inventors.join(LIST_SEPARATOR),
            Field::Abstract => self.abstract_text.clone(),
        }
    }

    /// The record as it reads back from its own metadata file.
    ///
    /// Storing this instead of `self` guarantees that a later cache hit
    /// returns exactly the record the fetch returned.
    pub fn normalised(&self) -> MetadataRecord {
        let id = &self.patent_number;
        let collapsed = MetadataRecord::from_fields(id, |_, spec| Some(self.value(spec.field)));
        parse_metadata(&collapsed.to_metadata_text(), id)
    }

    fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Inventors => FieldValue::List(self.inventors.clone()),
            other => FieldValue::Text(self.rendered(other)),
        }
    }

    /// Render the record in the metadata file format.
    pub fn to_metadata_text(&self) -> String {
        let mut out = String::new();
        for spec in METADATA_SCHEMA {
            let value = self.rendered(spec.field);
            match spec.kind {
                FieldKind::Line | FieldKind::List => {
                    out.push_str(&format!("{}: {}\n", spec.label, value));
                }
                FieldKind::Block => {
                    out.push_str(&format!("\n{}:\n{}\n", spec.label, value));
                }
            }
        }
        out
    }
}

/// Parse a metadata file's contents, never failing.
///
/// Each field is matched on its own. A field whose pattern does not match
/// gets its schema default. Line fields are only searched above the
/// abstract block so abstract text that happens to start with `Title:` is
/// not mistaken for a header.
pub fn parse_metadata(text: &str, id: &str) -> MetadataRecord {
    let block_start = METADATA_SCHEMA
        .iter()
        .zip(SCHEMA_PATTERNS.iter())
        .filter(|(spec, _)| spec.kind == FieldKind::Block)
        .filter_map(|(_, re)| re.find(text).map(|m| m.start()))
        .min()
        .unwrap_or(text.len());
    let header = &text[..block_start];

    MetadataRecord::from_fields(id, |index, spec| {
        let re = &SCHEMA_PATTERNS[index];
        match spec.kind {
            FieldKind::Line => re
                .captures(header)
                .and_then(|c| c.get(1))
                .map(|m| FieldValue::Text(m.as_str().trim().to_string())),
            FieldKind::List => re
                .captures(header)
                .and_then(|c| c.get(1))
                .map(|m| FieldValue::List(split_list(m.as_str()))),
            FieldKind::Block => re
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| FieldValue::Text(m.as_str().trim().to_string())),
        }
    })
}
