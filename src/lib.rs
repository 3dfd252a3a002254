//! Typed client for the Airtable API.
//!
//! Records are plain Rust structs declared with [`record!`]. The client fetches
//! the untyped fields of a record and maps them onto the struct, following
//! nested records and lists, and reporting the offending field when a value
//! has the wrong type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use airtable::{columns::FormulaResult, record, Client, ListOptions};
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct Task {
//!         pub name: String => "Name",
//!         pub done: bool => "Done",
//!         pub tags: Vec<String> => "Tags",
//!         pub score: FormulaResult => "Score",
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), airtable::Error> {
//!     let client = airtable::ClientBuilder::from_env()?.build();
//!     let tasks = client.table::<Task>("Tasks");
//!
//!     let task = tasks.get("recXXXXXXXXXXXXXX").await?;
//!     println!("{:?}", task.fields);
//!
//!     let open = tasks
//!         .list(&ListOptions::default().filter_by_formula("NOT({Done})"))
//!         .await?;
//!     println!("{} open tasks", open.len());
//!     Ok(())
//! }
//! ```

mod client;
pub mod columns;
mod error;
mod mapper;
mod query;
mod table;
mod types;

pub use client::{Client, ClientBuilder, Limiter};
pub use error::{Error, Result};
pub use mapper::{from_fields, map_fields, type_name, Coerce, Field, Kind, ParseValue, Record};
pub use query::{ListOptions, QueryEncoder, QueryParams, Sort, SortDirection};
pub use table::Table;
pub use types::{ListEnvelope, Page, RecordEnvelope, TableRecord};

#[doc(hidden)]
pub mod __private {
    pub use crate::mapper::map_nested;
    pub use serde_json::Value;
}
