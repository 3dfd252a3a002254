//! Response envelopes of the Airtable API.

use crate::error::Result;
use crate::mapper::{map_fields, Record};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A single record as returned by the API, with its fields still untyped.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordEnvelope {
    /// Record id, e.g. `recfUW0mFSobdU9PX`.
    pub id: String,
    /// Column values keyed by column name. Empty columns are omitted by the API.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Creation timestamp in ISO 8601.
    pub created_time: String,
}

impl RecordEnvelope {
    /// Decode a record envelope from a response body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Map the fields of this record onto `dest`.
    pub fn map_into<R: Record>(&self, dest: &mut R) -> Result<()> {
        map_fields(dest, &self.fields)
    }

    /// Convert into a typed record.
    pub fn into_record<R: Record>(self) -> Result<TableRecord<R>> {
        let mut fields = R::default();
        self.map_into(&mut fields)?;
        Ok(TableRecord {
            id: self.id,
            created_time: self.created_time,
            fields,
        })
    }
}

/// One page of a list request.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListEnvelope {
    /// Records of this page.
    pub records: Vec<RecordEnvelope>,
    /// Cursor for the next page, absent on the last page.
    pub offset: Option<String>,
}

impl ListEnvelope {
    /// Decode a list page from a response body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A record with its fields mapped onto `R`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord<R> {
    /// Record id.
    pub id: String,
    /// Creation timestamp in ISO 8601.
    pub created_time: String,
    /// Typed column values.
    pub fields: R,
}

/// A typed page of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Records of this page.
    pub records: Vec<TableRecord<R>>,
    /// Cursor for the next page, absent on the last page.
    pub offset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::record;

    record! {
        #[derive(Debug, PartialEq)]
        struct Named {
            name: String => "Name",
        }
    }

    #[test]
    fn test_decode_record_envelope() {
        let body = br#"{"id":"rec1","fields":{"Name":"Ada"},"createdTime":"2018-01-01T00:00:00.000Z"}"#;
        let envelope = RecordEnvelope::from_slice(body).unwrap();
        assert_eq!(envelope.id, "rec1");
        assert_eq!(envelope.created_time, "2018-01-01T00:00:00.000Z");

        let record: TableRecord<Named> = envelope.into_record().unwrap();
        assert_eq!(record.fields.name, "Ada");
        assert_eq!(record.id, "rec1");
    }

    #[test]
    fn test_missing_fields_object_is_empty() {
        let envelope = RecordEnvelope::from_slice(br#"{"id":"rec1","createdTime":"t"}"#).unwrap();
        assert!(envelope.fields.is_empty());
    }

    #[test]
    fn test_decode_errors() {
        let not_json = RecordEnvelope::from_slice(b"nope").unwrap_err();
        assert!(matches!(not_json, Error::Json(_)));

        let wrong_shape = RecordEnvelope::from_slice(br#"{"id":1,"fields":[]}"#).unwrap_err();
        assert!(matches!(wrong_shape, Error::Json(_)));

        let not_a_page = ListEnvelope::from_slice(br#"{"id":"rec1"}"#).unwrap_err();
        assert!(matches!(not_a_page, Error::Json(_)));
    }

    #[test]
    fn test_decode_list_envelope() {
        let body = br#"{"records":[{"id":"a","fields":{},"createdTime":"t"}],"offset":"itr1/a"}"#;
        let page = ListEnvelope::from_slice(body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.offset.as_deref(), Some("itr1/a"));
    }
}
