//! Slot types for Airtable's column types.
//!
//! Most columns are plain JSON values and map onto ordinary Rust types; the
//! aliases below only name them after the column type they come from.
//! Attachments are records, and formula results go through a parse hook
//! because a formula may evaluate to any JSON type.

use crate::error::{Error, Result};
use crate::mapper::{Kind, ParseValue};
use crate::{parse_hook, record};
use serde_json::Value;

/// Single line text.
pub type Text = String;

/// Long text, possibly with rich text markup.
pub type LongText = String;

/// Checkbox. Unchecked boxes are omitted by the API and map to `false`.
pub type Checkbox = bool;

/// Rating from 1 to the column's maximum. Unrated is `0`.
pub type Rating = i64;

/// Date or date-time in ISO 8601, as sent by the API.
pub type Date = String;

/// Names of the selected options of a multiple select column.
pub type MultipleSelect = Vec<String>;

/// Ids of the records linked from a link column.
pub type RecordLink = Vec<String>;

/// Attachments of an attachment column.
pub type Attachment = Vec<AttachmentFile>;

record! {
    /// One file of an attachment column.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AttachmentFile {
        pub id: String => "id",
        pub url: String => "url",
        pub filename: String => "filename",
        /// Size in bytes.
        pub size: u64 => "size",
        /// MIME type.
        pub mime_type: String => "type",
        /// Present for images and documents with a preview.
        pub thumbnails: Thumbnails => "thumbnails",
    }
}

record! {
    /// Preview images generated for an attachment.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Thumbnails {
        pub small: Thumbnail => "small",
        pub large: Thumbnail => "large",
        pub full: Thumbnail => "full",
    }
}

record! {
    /// One preview image of an attachment.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Thumbnail {
        /// Temporary download URL.
        pub url: String => "url",
        /// Width in pixels.
        pub width: u32 => "width",
        /// Height in pixels.
        pub height: u32 => "height",
    }
}

/// The value of a formula, rollup or lookup column.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormulaResult {
    /// The formula produced no value.
    #[default]
    Empty,
    /// A numeric result. Currency, percent and duration formats arrive as numbers too.
    Number(f64),
    /// A text result, including dates formatted by the formula.
    Text(String),
    /// A checkbox-like result.
    Bool(bool),
    /// Several values, as produced by rollups and lookups.
    List(Vec<FormulaResult>),
    /// The formula failed, e.g. `#ERROR!`.
    Error(String),
}

impl FormulaResult {
    /// The numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormulaResult::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormulaResult::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if the formula failed.
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaResult::Error(_))
    }
}

impl ParseValue for FormulaResult {
    fn parse_value(&mut self, key: &str, value: &Value) -> Result<()> {
        *self = match value {
            Value::Null => FormulaResult::Empty,
            Value::Bool(b) => FormulaResult::Bool(*b),
            Value::Number(n) => FormulaResult::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => FormulaResult::Text(s.clone()),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let mut result = FormulaResult::default();
                    result.parse_value(key, item)?;
                    list.push(result);
                }
                FormulaResult::List(list)
            }
            Value::Object(map) => match map.get("error").and_then(Value::as_str) {
                Some(error) => FormulaResult::Error(error.to_string()),
                None => return Err(Error::coercion(key, Kind::Custom, value)),
            },
        };
        Ok(())
    }
}

parse_hook!(FormulaResult);
