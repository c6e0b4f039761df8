use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;

use crate::display::export_timestamp;
use crate::models::SaleRecord;
use crate::validators::normalize_category;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_FILENAME: &str = "vendite.xlsx";

const SHEET_NAME: &str = "Vendite";
const COLUMNS: [(&str, &str, f64); 4] = [
    ("A", "Data/Ora", 25.0),
    ("B", "Importo (€)", 15.0),
    ("C", "Tipologia", 25.0),
    ("D", "Email utente", 30.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub timestamp: String,
    pub amount: f64,
    pub category: String,
    pub owner_label: String,
}

/// One row per record, newest first, owners resolved to their email.
pub fn build_rows(records: &[SaleRecord], emails: &HashMap<String, String>, tz: &Tz) -> Vec<ExportRow> {
    let mut ordered: Vec<&SaleRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    ordered
        .into_iter()
        .map(|record| ExportRow {
            timestamp: export_timestamp(record.created_at, tz),
            amount: record.amount.to_f64().unwrap_or_default(),
            category: normalize_category(Some(&record.category)),
            owner_label: emails.get(&record.owner_id).cloned().unwrap_or_default(),
        })
        .collect()
}

pub fn write_workbook(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| anyhow!("Failed to create sheet: {}", e))?;

    for (index, (column, header, width)) in COLUMNS.iter().enumerate() {
        sheet.get_column_dimension_mut(column).set_width(*width);
        sheet.get_cell_mut((index as u32 + 1, 1)).set_value(*header);
    }

    for (offset, row) in rows.iter().enumerate() {
        let line = offset as u32 + 2;
        sheet.get_cell_mut((1, line)).set_value(row.timestamp.clone());
        sheet.get_cell_mut((2, line)).set_value_number(row.amount);
        sheet.get_cell_mut((3, line)).set_value(row.category.clone());
        sheet.get_cell_mut((4, line)).set_value(row.owner_label.clone());
    }

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| anyhow!("Failed to serialize workbook: {}", e))?;

    Ok(out.into_inner())
}
