use serde_json::Value;
use std::time::Duration;

use super::RecordSource;
use crate::config::SheetsConfig;
use crate::error::PipelineError;
use crate::models::{SiteRecord, SITE_ID_FIELD};
use crate::sheets::{SheetsClient, ValueRange};

/// Looks up site rows in the inventory spreadsheet
pub struct SheetsSource {
    client: SheetsClient,
    spreadsheet_id: String,
    range: String,
    header_row: usize,
}

impl SheetsSource {
    pub fn new(cfg: &SheetsConfig) -> Result<Self, PipelineError> {
        if cfg.spreadsheet_id.is_empty() || cfg.range.is_empty() {
            return Err(PipelineError::unavailable(
                "sheets.spreadsheet_id and sheets.range must be configured",
            ));
        }

        let key = SheetsClient::load_key(&cfg.credentials_path)
            .map_err(|e| PipelineError::unavailable(format!("{:#}", e)))?;
        let client = SheetsClient::new(
            &cfg.api_base,
            key,
            cfg.scopes.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
        .map_err(|e| PipelineError::unavailable(format!("{:#}", e)))?;

        Ok(Self {
            client,
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            range: cfg.range.clone(),
            header_row: cfg.header_row,
        })
    }
}

impl RecordSource for SheetsSource {
    fn fetch(&self, site_id: &str) -> Result<SiteRecord, PipelineError> {
        let ValueRange { range, values } = self
            .client
            .get_values(&self.spreadsheet_id, &self.range)
            .map_err(|e| PipelineError::unavailable(format!("{:#}", e)))?;

        tracing::debug!("Fetched {} rows from {}", values.len(), range);
        let record = find_site(&values, self.header_row, site_id)?;
        tracing::info!("Found site {} ({} fields)", site_id, record.len());
        Ok(record)
    }

    fn describe(&self) -> String {
        format!("spreadsheet {} range {}", self.spreadsheet_id, self.range)
    }
}

/// Locate a site in raw sheet rows.
///
/// Rows before `header_row` are title/blank rows and are skipped. Row
/// `header_row` names the fields; only rows after it are data. Cells are
/// paired with headers by position: short rows yield fewer fields, cells
/// beyond the last header are dropped. The first row whose `Site_ID` cell
/// equals `site_id` wins.
pub(crate) fn find_site(
    rows: &[Vec<Value>],
    header_row: usize,
    site_id: &str,
) -> Result<SiteRecord, PipelineError> {
    let headers: Vec<String> = match rows.get(header_row) {
        Some(row) => row.iter().map(cell_text).collect(),
        None => {
            return Err(PipelineError::not_found(
                site_id,
                format!("no data found (sheet has {} rows, header expected at row {})", rows.len(), header_row),
            ));
        }
    };

    if !headers.iter().any(|h| h == SITE_ID_FIELD) {
        return Err(PipelineError::not_found(
            site_id,
            format!("header row has no {} column", SITE_ID_FIELD),
        ));
    }

    for (idx, row) in rows.iter().enumerate().skip(header_row + 1) {
        let record: SiteRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_text(cell)))
            .collect();

        if record.site_id() == Some(site_id) {
            if row.len() > headers.len() {
                tracing::warn!(
                    "Row {} has {} cells but only {} headers; extra cells ignored",
                    idx,
                    row.len(),
                    headers.len()
                );
            }
            return Ok(record);
        }
    }

    Err(PipelineError::not_found(
        site_id,
        format!("no row with {} = {}", SITE_ID_FIELD, site_id),
    ))
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
