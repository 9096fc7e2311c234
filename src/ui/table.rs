use tabled::{settings::Style, Table, Tabled};

use crate::record::Record;

#[derive(Tabled)]
pub struct RecordRow {
    #[tabled(rename = "id")]
    pub id: i64,
    #[tabled(rename = "second_id")]
    pub second_id: i64,
    #[tabled(rename = "name")]
    pub name: String,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            second_id: record.second_id,
            name: record.name.clone(),
        }
    }
}

/// Rounded table of `records`, empty string when there are none
pub fn records_table(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
