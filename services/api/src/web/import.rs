//! services/api/src/web/import.rs
//!
//! Spreadsheet import endpoint. Accepts a `.csv` or `.xlsx` upload, coerces
//! each row into a `QualityData` record, and notifies connected WebSocket
//! clients of the result.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use calamine::{Reader, Xlsx};
use chrono::Utc;
use qualitybot_core::domain::QualityData;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ExcelImportResponse {
    pub success: bool,
    pub message: String,
    pub imported_rows: usize,
    /// At most the first five imported records.
    #[schema(value_type = Vec<Object>)]
    pub sample_data: Vec<QualityData>,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /import-excel - Import quality-metric rows from an uploaded file.
///
/// Rows that fail to coerce are skipped; the request fails only when the file
/// type is unsupported, the file cannot be parsed at all, or no row survives.
#[utoipa::path(
    post,
    path = "/import-excel",
    request_body(content_type = "multipart/form-data", description = "A .csv or .xlsx file."),
    responses(
        (status = 200, description = "Rows imported", body = ExcelImportResponse),
        (status = 400, description = "Unsupported file type, parse error, or no valid data")
    )
)]
pub async fn import_excel_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Pull the single file part out of the multipart body.
    let (file_name, data) = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        (name, data)
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        ));
    };

    // 2. Only the two declared formats are supported.
    if !(file_name.ends_with(".csv") || file_name.ends_with(".xlsx")) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Only .csv and .xlsx files are supported".to_string(),
        ));
    }

    // 3. Parse; a wholesale decode failure is a client error.
    let imported = if file_name.ends_with(".csv") {
        parse_csv(&data)
    } else {
        parse_xlsx(&data)
    }
    .map_err(|e| (StatusCode::BAD_REQUEST, format!("File parse error: {}", e)))?;

    if imported.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No valid data found in file".to_string(),
        ));
    }

    info!("Imported {} quality data rows from {}", imported.len(), file_name);

    let message = format!(
        "Successfully imported {} quality data records",
        imported.len()
    );
    let sample_data: Vec<QualityData> = imported.iter().take(5).cloned().collect();

    // 4. Notify WebSocket listeners before the response is built, so the
    // broadcast actually happens.
    let update = serde_json::json!({
        "type": "import_status_update",
        "success": true,
        "message": message,
        "imported_rows": imported.len(),
        "sample_data": sample_data,
    });
    state.hub.broadcast(update.to_string()).await;

    Ok(Json(ExcelImportResponse {
        success: true,
        message,
        imported_rows: imported.len(),
        sample_data,
    }))
}

//=========================================================================================
// Row Parsing and Coercion
//=========================================================================================

/// Decodes a CSV file into quality records, skipping rows that fail coercion.
fn parse_csv(data: &[u8]) -> Result<Vec<QualityData>, String> {
    let mut reader = csv::ReaderBuilder::new().from_reader(data);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let fields: HashMap<&str, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v.to_string()))
            .collect();
        if let Some(row) = coerce_row(&fields) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Decodes the first worksheet of an XLSX file, skipping rows that fail
/// coercion. The first row is treated as the header row.
fn parse_xlsx(data: &[u8]) -> Result<Vec<QualityData>, String> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(data.to_vec())).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook contains no sheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for record in row_iter {
        let fields: HashMap<&str, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, c)| (h.as_str(), c.to_string()))
            .collect();
        if let Some(row) = coerce_row(&fields) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Builds one `QualityData` record from a header-keyed row.
///
/// Missing or empty cells fall back to defaults; a numeric cell holding a
/// non-numeric value disqualifies the whole row.
fn coerce_row(fields: &HashMap<&str, String>) -> Option<QualityData> {
    let string_field = |name: &str, default: &str| -> String {
        match fields.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => default.to_string(),
        }
    };
    let numeric_field = |name: &str| -> Option<f64> {
        match fields.get(name) {
            Some(v) if !v.trim().is_empty() => v.trim().parse::<f64>().ok(),
            _ => Some(0.0),
        }
    };

    Some(QualityData {
        timestamp: string_field("timestamp", &Utc::now().to_rfc3339()),
        metric_name: string_field("metric_name", "Unknown"),
        value: numeric_field("value")?,
        target: numeric_field("target")?,
        unit: string_field("unit", ""),
        process: string_field("process", ""),
        operator: string_field("operator", ""),
        notes: string_field("notes", ""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CSV: &str = "\
timestamp,metric_name,value,target,unit,process,operator,notes
2024-01-01T08:00:00,defect_rate,1.2,1.0,%,stamping,alice,ok
2024-01-01T09:00:00,defect_rate,0.9,1.0,%,stamping,bob,
2024-01-01T10:00:00,cycle_time,n/a,55,s,welding,carol,bad reading
2024-01-01T11:00:00,cycle_time,54.2,55,s,welding,dave,ok
";

    #[test]
    fn rows_with_non_numeric_values_are_skipped() {
        let rows = parse_csv(FULL_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].metric_name, "defect_rate");
        assert_eq!(rows[0].value, 1.2);
        assert_eq!(rows[2].operator, "dave");
    }

    #[test]
    fn missing_columns_use_defaults() {
        let csv = "value,target\n3.5,4.0\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric_name, "Unknown");
        assert_eq!(rows[0].unit, "");
        assert_eq!(rows[0].value, 3.5);
        // The timestamp default is "now", so just check it is non-empty.
        assert!(!rows[0].timestamp.is_empty());
    }

    #[test]
    fn empty_numeric_cells_default_to_zero() {
        let csv = "metric_name,value,target\nscrap_rate,,\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 0.0);
        assert_eq!(rows[0].target, 0.0);
    }

    #[test]
    fn headerless_empty_file_yields_no_rows() {
        let rows = parse_csv(b"").unwrap();
        assert!(rows.is_empty());
    }
}
