//! Typed access to the records of one table.

use crate::client::Client;
use crate::error::Result;
use crate::mapper::Record;
use crate::query::ListOptions;
use crate::types::{ListEnvelope, Page, RecordEnvelope, TableRecord};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// A table of a base, bound to the record type its rows are mapped onto.
pub struct Table<R> {
    client: Client,
    name: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            name: self.name.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("base_id", &self.client.base_id())
            .finish()
    }
}

impl<R: Record> Table<R> {
    pub(crate) fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            _record: PhantomData,
        }
    }

    /// Table name, as used in request paths.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch one record and map its fields onto `dest`.
    ///
    /// Fields absent from the response keep their current value in `dest`.
    /// Returns the envelope with the untyped fields.
    pub async fn get_into(&self, id: &str, dest: &mut R) -> Result<RecordEnvelope> {
        let endpoint = format!("{}/{}", self.name, id);
        let bytes = self.client.request_bytes(&endpoint, None).await?;
        let envelope = RecordEnvelope::from_slice(&bytes)?;
        envelope.map_into(dest)?;
        Ok(envelope)
    }

    /// Fetch one record.
    pub async fn get(&self, id: &str) -> Result<TableRecord<R>> {
        let mut fields = R::default();
        let envelope = self.get_into(id, &mut fields).await?;
        Ok(TableRecord {
            id: envelope.id,
            created_time: envelope.created_time,
            fields,
        })
    }

    /// Fetch a single page of records.
    ///
    /// Pass the returned offset back through [`ListOptions::offset`] to read
    /// the next page.
    pub async fn list_page(&self, options: &ListOptions) -> Result<Page<R>> {
        let bytes = self
            .client
            .request_bytes(&self.name, Some(options))
            .await?;
        let page = ListEnvelope::from_slice(&bytes)?;

        let records = page
            .records
            .into_iter()
            .map(RecordEnvelope::into_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            records,
            offset: page.offset,
        })
    }

    /// Fetch every record matching `options`, following page cursors.
    ///
    /// Each page is a separate request and waits for the rate limiter. Paging
    /// stops once `max_records` records are collected, or when the server
    /// hands back a cursor it already returned.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<TableRecord<R>>> {
        let limit = options.max_records.map(|max| max as usize);
        let mut options = options.clone();
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        loop {
            let page = self.list_page(&options).await?;
            records.extend(page.records);

            if let Some(limit) = limit {
                if records.len() >= limit {
                    records.truncate(limit);
                    break;
                }
            }

            match page.offset {
                Some(offset) if !seen.insert(offset.clone()) => {
                    warn!(table = %self.name, %offset, "server repeated a page cursor, stopping");
                    break;
                }
                Some(offset) => {
                    debug!(table = %self.name, fetched = records.len(), "fetching next page");
                    options.offset = Some(offset);
                }
                None => break,
            }
        }

        Ok(records)
    }

    /// Fetch every record matching `options` and append its fields to `dest`.
    pub async fn list_into(&self, dest: &mut Vec<R>, options: &ListOptions) -> Result<()> {
        let records = self.list(options).await?;
        dest.extend(records.into_iter().map(|record| record.fields));
        Ok(())
    }
}
