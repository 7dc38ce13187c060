use std::cmp;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::models::{record_id, ListResponse, Record};
use crate::schema::{CollectionInfo, EntitySchema};

/// Print any serializable value as a single line of JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer(std::io::stdout(), value)?;
    println!();
    Ok(())
}

/// Render a list page in human-readable text form.
///
/// Each record is rendered as:
/// `[id] headline  field=value ...`
/// where the headline is the first keyword field and the trailing
/// pairs are the collection's filter fields, followed by a footer
/// with the pagination state.
pub fn print_list_text(response: &ListResponse, schema: &EntitySchema) -> Result<()> {
    for record in &response.data {
        println!("{}", summary_line(record, schema));
    }

    println!(
        "-- page {} ({} per page), {} of {} records",
        response.current,
        response.page_size,
        response.data.len(),
        response.total
    );
    Ok(())
}

/// Render a list page as a table.
///
/// Columns are the id, the keyword fields, the filter fields, and the
/// date field when the collection has one.
pub fn print_list_table(response: &ListResponse, schema: &EntitySchema) -> Result<()> {
    if response.data.is_empty() {
        return Ok(());
    }

    const MAX_COLUMN_WIDTH: usize = 30;

    let columns = table_columns(schema);
    let cells: Vec<Vec<String>> = response
        .data
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| display_value(record.get(*column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let longest = cells
                .iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0);
            cmp::min(cmp::max(column.len(), longest), MAX_COLUMN_WIDTH)
        })
        .collect();

    let header: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
    println!("{}", render_row(&header, &widths));
    for row in &cells {
        println!("{}", render_row(row, &widths));
    }

    Ok(())
}

/// Render a single record as aligned `field : value` lines.
pub fn print_record_text(record: &Record) -> Result<()> {
    let width = record.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in record {
        println!("{key:<width$} : {}", display_value(Some(value)));
    }
    Ok(())
}

pub fn print_collections_text(infos: &[CollectionInfo]) -> Result<()> {
    for info in infos {
        println!("{}", info.name);
        println!("  fields   : {}", info.fields.join(", "));
        println!("  keyword  : {}", info.keyword_fields.join(", "));
        println!("  filters  : {}", info.filter_fields.join(", "));
        if let Some(date_field) = info.date_field {
            println!("  date     : {date_field}");
        }
    }
    Ok(())
}

pub fn print_collections_table(infos: &[CollectionInfo]) -> Result<()> {
    let name_width = infos
        .iter()
        .map(|i| i.name.len())
        .max()
        .unwrap_or(0)
        .max("COLLECTION".len());

    println!("{:<name_width$} {:>6} {:<10} FILTERS", "COLLECTION", "FIELDS", "DATE");
    for info in infos {
        println!(
            "{:<name_width$} {:>6} {:<10} {}",
            info.name,
            info.fields.len(),
            info.date_field.unwrap_or("-"),
            info.filter_fields.join(",")
        );
    }
    Ok(())
}

fn summary_line(record: &Record, schema: &EntitySchema) -> String {
    let id = record_id(record).unwrap_or_else(|| "?".to_string());
    let headline = schema
        .keyword_fields
        .first()
        .map(|field| display_value(record.get(*field)))
        .unwrap_or_default();

    let mut line = format!("[{id}] {headline}");
    for field in schema.filter_fields {
        if let Some(value) = record.get(*field) {
            line.push_str(&format!("  {field}={}", display_value(Some(value))));
        }
    }
    if let Some(date_field) = schema.date_field {
        if let Some(value) = record.get(date_field) {
            line.push_str(&format!("  {date_field}={}", display_value(Some(value))));
        }
    }
    line
}

fn table_columns(schema: &EntitySchema) -> Vec<&'static str> {
    let mut columns = vec!["id"];
    columns.extend(schema.keyword_fields.iter().copied());
    columns.extend(schema.filter_fields.iter().copied());
    columns.extend(schema.date_field);
    columns
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", truncate(cell, width)))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}
