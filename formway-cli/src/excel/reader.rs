//! Read mappings and data rows from an Excel workbook

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx, open_workbook};
use log::{debug, info};

use crate::import::mapping::{
    self, DetailColumnMapping, FieldMapping, MappingFlags,
};
use crate::import::row::{CellValue, ImportInput, Row};

/// Column indices of the mapping sheets
mod cols {
    pub const SOURCE_COLUMN: usize = 0;
    pub const FRIENDLY_NAME: usize = 1;
    pub const DATABASE_NAME: usize = 2;
    pub const GUID: usize = 3;
    pub const TYPE_HINT: usize = 4;
    pub const FLAGS: usize = 5;
}

/// Which sheets to read and how to identify rows
#[derive(Debug, Clone)]
pub struct WorkbookOptions {
    /// Sheet holding the parent field mappings
    pub mapping_sheet: String,
    /// Sheet holding the item-list column mappings, skipped when absent
    pub detail_mapping_sheet: String,
    /// Data sheet; defaults to the first sheet that is not a mapping sheet
    pub data_sheet: Option<String>,
    /// Sheet holding child rows, read only when configured
    pub detail_sheet: Option<String>,
    /// Header of the identifier column; without it rows get 1-based
    /// positional ids, which do not survive reordering between runs
    pub id_column: Option<String>,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            mapping_sheet: "Mappings".to_string(),
            detail_mapping_sheet: "Detail Mappings".to_string(),
            data_sheet: None,
            detail_sheet: None,
            id_column: None,
        }
    }
}

/// Read everything the import driver needs from one workbook
pub fn read_workbook(path: &Path, options: &WorkbookOptions) -> Result<ImportInput> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names = workbook.sheet_names().to_vec();

    let mappings = read_field_mappings(&mut workbook, &options.mapping_sheet)?;
    info!(
        "Loaded {} field mappings from sheet '{}'",
        mappings.len(),
        options.mapping_sheet
    );

    let detail_mappings = if sheet_names.iter().any(|s| s == &options.detail_mapping_sheet) {
        let detail = read_detail_mappings(&mut workbook, &options.detail_mapping_sheet)?;
        debug!("Loaded {} detail column mappings", detail.len());
        detail
    } else {
        Vec::new()
    };

    let data_sheet = match &options.data_sheet {
        Some(name) => name.clone(),
        None => sheet_names
            .iter()
            .find(|name| {
                **name != options.mapping_sheet
                    && **name != options.detail_mapping_sheet
                    && Some(name.as_str()) != options.detail_sheet.as_deref()
            })
            .cloned()
            .context("Workbook has no data sheet besides the mapping sheets")?,
    };

    let rows = read_rows(&mut workbook, &data_sheet, options.id_column.as_deref())?;
    info!("Loaded {} data rows from sheet '{}'", rows.len(), data_sheet);

    let detail_rows = match &options.detail_sheet {
        Some(sheet) => {
            let children = read_rows(&mut workbook, sheet, options.id_column.as_deref())?;
            debug!("Loaded {} detail rows from sheet '{}'", children.len(), sheet);
            group_by_row_id(children)
        }
        None => HashMap::new(),
    };

    Ok(ImportInput {
        rows,
        mappings,
        detail_mappings,
        id_column: options.id_column.clone(),
        detail_rows,
    })
}

fn read_field_mappings<R>(workbook: &mut Xlsx<R>, sheet: &str) -> Result<Vec<FieldMapping>>
where
    R: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read mapping sheet: {}", sheet))?;

    let mut mappings = Vec::new();
    // Skip header row
    for row in range.rows().skip(1) {
        if row.iter().all(|c| c.to_string().trim().is_empty()) {
            continue;
        }
        mappings.push(FieldMapping {
            source_column: get_cell_string(row, cols::SOURCE_COLUMN),
            friendly_name: get_cell_string(row, cols::FRIENDLY_NAME),
            database_name: get_cell_string(row, cols::DATABASE_NAME),
            field_guid: get_cell_string(row, cols::GUID),
            column_type_hint: get_cell_string(row, cols::TYPE_HINT),
            flags: MappingFlags::parse(&get_cell_string(row, cols::FLAGS)),
        });
    }
    Ok(mapping::retain_complete(mappings))
}

fn read_detail_mappings<R>(
    workbook: &mut Xlsx<R>,
    sheet: &str,
) -> Result<Vec<DetailColumnMapping>>
where
    R: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read detail mapping sheet: {}", sheet))?;

    let mut mappings = Vec::new();
    for row in range.rows().skip(1) {
        if row.iter().all(|c| c.to_string().trim().is_empty()) {
            continue;
        }
        mappings.push(DetailColumnMapping {
            source_column: get_cell_string(row, cols::SOURCE_COLUMN),
            friendly_name: get_cell_string(row, cols::FRIENDLY_NAME),
            database_name: get_cell_string(row, cols::DATABASE_NAME),
            column_guid: get_cell_string(row, cols::GUID),
            column_type_hint: get_cell_string(row, cols::TYPE_HINT),
            flags: MappingFlags::parse(&get_cell_string(row, cols::FLAGS)),
        });
    }
    Ok(mapping::retain_complete_details(mappings))
}

fn read_rows<R>(
    workbook: &mut Xlsx<R>,
    sheet: &str,
    id_column: Option<&str>,
) -> Result<Vec<Row>>
where
    R: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read data sheet: {}", sheet))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let id_index = match id_column {
        Some(name) => {
            let wanted = name.trim().to_lowercase();
            let index = headers
                .iter()
                .position(|h| h.to_lowercase() == wanted);
            if index.is_none() {
                bail!(
                    "Identifier column '{}' not found in sheet '{}' (headers: {})",
                    name,
                    sheet,
                    headers.join(", ")
                );
            }
            index
        }
        None => None,
    };

    let mut rows = Vec::new();
    for (position, data_row) in row_iter.enumerate() {
        if data_row.iter().all(|c| c.to_string().trim().is_empty()) {
            continue;
        }

        // Explicit id when configured and non-blank, 1-based position
        // otherwise. Positional ids break resume if rows are reordered.
        let row_id = id_index
            .and_then(|index| data_row.get(index))
            .map(|cell| cell.to_string().trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| (position + 1).to_string());

        let mut row = Row::new(row_id);
        for (index, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = data_row.get(index).map(cell_value).unwrap_or(CellValue::Empty);
            row.fields.insert(header.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn group_by_row_id(rows: Vec<Row>) -> HashMap<String, Vec<Row>> {
    let mut grouped: HashMap<String, Vec<Row>> = HashMap::new();
    for row in rows {
        grouped.entry(row.row_id.clone()).or_default().push(row);
    }
    grouped
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive.and_utc()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // Excel error cells (#N/A etc.) carry nothing importable
        Data::Error(_) => CellValue::Empty,
    }
}

fn get_cell_string(row: &[Data], col: usize) -> String {
    row.get(col)
        .map(|c| match c {
            Data::String(s) => s.trim().to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Data::Bool(b) => b.to_string(),
            _ => String::new(),
        })
        .unwrap_or_default()
}
