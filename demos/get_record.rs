//! Fetch a record and list a table.
//!
//! Run with:
//! `AIRTABLE_API_KEY=key AIRTABLE_BASE_ID=app cargo run --example get_record -- Main recXXXXXXXXXXXXXX`

use airtable::columns::{Attachment, Checkbox, FormulaResult, LongText, MultipleSelect, Text};
use airtable::{record, ClientBuilder, ListOptions, SortDirection};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

record! {
    #[derive(Debug)]
    pub struct Row {
        pub name: Text => "Name",
        pub notes: LongText => "Notes",
        pub check: Checkbox => "Check",
        pub animals: MultipleSelect => "Animals",
        pub attachments: Attachment => "Attachments",
        pub formula: FormulaResult => "Formula",
    }
}

fn info(label: &str, value: &str) {
    println!("  {}: {}", label.dimmed(), value);
}

fn error(text: &str) {
    println!("{} {}", "✖".red(), text);
}

#[tokio::main]
async fn main() -> Result<(), airtable::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let table_name = args.next().unwrap_or_else(|| "Main".into());
    let record_id = args.next();

    let client = ClientBuilder::from_env()?.build();
    let table = client.table::<Row>(table_name.as_str());

    if let Some(id) = record_id {
        println!("{}", format!(" {table_name}/{id} ").on_blue().bold());
        match table.get(&id).await {
            Ok(record) => {
                info("created", &record.created_time);
                info("name", &record.fields.name);
                info("check", &record.fields.check.to_string());
                info("animals", &record.fields.animals.join(", "));
                info("attachments", &record.fields.attachments.len().to_string());
                info("formula", &format!("{:?}", record.fields.formula));
            }
            Err(e) => {
                error(&e.to_string());
                if let Some(body) = e.body() {
                    info("response", &String::from_utf8_lossy(body));
                }
            }
        }
    }

    println!("{}", format!(" {table_name} ").on_blue().bold());
    let options = ListOptions::default()
        .fields(["Name", "Check"])
        .sort("Name", SortDirection::Asc)
        .max_records(20);
    for record in table.list(&options).await? {
        let mark = if record.fields.check { "✔".green() } else { "·".dimmed() };
        println!("{} {} {}", mark, record.id.dimmed(), record.fields.name);
    }

    Ok(())
}
