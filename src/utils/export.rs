// src/utils/export.rs

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Txt,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub format: ExportFormat,
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Renders a header row plus data rows.
///
/// CSV quotes fields as needed; TXT joins fields with ", " and flattens
/// line breaks so every record stays on one line.
pub fn render_table(format: ExportFormat, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();

    match format {
        ExportFormat::Csv => {
            out.push_str(&headers.join(","));
            out.push('\n');
            for row in rows {
                let fields: Vec<String> = row.iter().map(|f| csv_quote(f)).collect();
                out.push_str(&fields.join(","));
                out.push('\n');
            }
        }
        ExportFormat::Txt => {
            out.push_str(&headers.join(", "));
            out.push('\n');
            for row in rows {
                let fields: Vec<String> = row
                    .iter()
                    .map(|f| f.replace(['\r', '\n'], " "))
                    .collect();
                out.push_str(&fields.join(", "));
                out.push('\n');
            }
        }
    }

    out
}

/// Wraps rendered output as a file download named `<stem>.<ext>`.
pub fn attachment(format: ExportFormat, stem: &str, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{}.{}\"", stem, format.extension());
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
