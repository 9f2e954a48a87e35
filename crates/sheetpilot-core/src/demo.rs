//! Canned data served when no spreadsheet is configured.

use crate::TabData;

/// Tab names returned by `list_tabs` in demo mode.
pub const DEMO_TABS: [&str; 3] = ["Pipeline", "Approved", "Rejected"];

fn table(headers: &[&str], rows: &[&[&str]]) -> TabData {
    TabData {
        headers: headers.iter().map(ToString::to_string).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect(),
    }
}

/// Returns the demo table for `tab`, or a `No data` placeholder.
#[must_use]
pub fn demo_tab_data(tab: &str) -> TabData {
    match tab {
        "Pipeline" => table(
            &["Company", "Stage", "Amount", "Owner", "Next Step"],
            &[
                &["Acme Corp", "Proposal", "$45,000", "Sarah", "Send revised quote"],
                &["Globex", "Discovery", "$120,000", "Mike", "Schedule demo"],
                &["Initech", "Negotiation", "$78,500", "Sarah", "Legal review"],
            ],
        ),
        "Approved" => table(
            &["Company", "Amount", "Close Date", "Owner"],
            &[
                &["Umbrella Inc", "$250,000", "2024-01-15", "Mike"],
                &["Stark Industries", "$180,000", "2024-02-01", "Sarah"],
            ],
        ),
        "Rejected" => table(
            &["Company", "Amount", "Reason", "Date"],
            &[&["Wayne Enterprises", "$95,000", "Budget constraints", "2024-01-20"]],
        ),
        _ => TabData {
            headers: vec!["No data".to_string()],
            rows: Vec::new(),
        },
    }
}
