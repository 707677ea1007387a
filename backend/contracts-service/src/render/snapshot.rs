//! The plain record the renderer consumes.

use chrono::Local;
use intermediation::Contract;

/// Display format for issue dates.
pub const ISSUE_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Immutable point-in-time copy of the fields a contract document shows.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    /// Label printed on the document; also keys the output file name.
    pub contract_id: String,
    pub client_name: String,
    /// Pre-formatted amount. Figures get a `$` prefix when printed.
    pub amount_label: String,
    /// Pre-formatted; the render time is used when absent.
    pub issue_date: Option<String>,
    pub description: Option<String>,
    pub duration_hours: u32,
    /// Rows appended to the summary grid after the duration.
    pub extra_rows: Vec<(String, String)>,
}

impl DocumentSnapshot {
    /// Snapshot of a stored contract, including its current status.
    pub fn from_contract(contract: &Contract) -> Self {
        Self {
            contract_id: contract.id.to_string(),
            client_name: format!("Inversionista #{}", contract.investor_ref),
            amount_label: "Por definir".to_string(),
            issue_date: Some(contract.created_at.format(ISSUE_DATE_FORMAT).to_string()),
            description: contract.notes.clone(),
            duration_hours: contract.duration_hours,
            extra_rows: vec![
                (
                    "Comisionista:".to_string(),
                    format!("Comisionista #{}", contract.broker_ref),
                ),
                (
                    "Comisión:".to_string(),
                    format!("{:.2} %", contract.commission_rate),
                ),
                (
                    "Estado:".to_string(),
                    contract.status.display_label().to_string(),
                ),
            ],
        }
    }

    /// Sample document for previewing the layout.
    pub fn demo() -> Self {
        Self {
            contract_id: "C-2025-001".to_string(),
            client_name: "Juan Pérez".to_string(),
            amount_label: "5.000.000".to_string(),
            issue_date: Some(Local::now().format(ISSUE_DATE_FORMAT).to_string()),
            description: Some(
                "Ejecución de órdenes bursátiles en la BVC conforme a autorización del cliente."
                    .to_string(),
            ),
            duration_hours: 24,
            extra_rows: Vec::new(),
        }
    }

    /// The issue date to print, falling back to the current local time.
    pub fn issue_date_or_now(&self) -> String {
        match &self.issue_date {
            Some(date) if !date.trim().is_empty() => date.clone(),
            _ => Local::now().format(ISSUE_DATE_FORMAT).to_string(),
        }
    }

    /// The description, if it has any visible content.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}
