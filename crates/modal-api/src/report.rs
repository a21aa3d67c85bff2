//! Calculation report: HTML rendering and PDF printing through a headless
//! Chromium process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use modal_types::api::ExportCalculation;

pub const DEFAULT_TITLE: &str = "Calculation Report";
pub const SINGLE_TITLE: &str = "Single Calculation Report";
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to launch {browser}: {source}")]
    Launch {
        browser: String,
        #[source]
        source: std::io::Error,
    },
    #[error("browser exited with {status}: {stderr}")]
    Browser { status: String, stderr: String },
    #[error("PDF rendering timed out after {0:?}")]
    Timeout(Duration),
    #[error("PDF scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Prints HTML to PDF by launching one browser process per call.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    browser: PathBuf,
    timeout: Duration,
}

impl PdfRenderer {
    pub fn new(browser: impl Into<PathBuf>) -> Self {
        Self {
            browser: browser.into(),
            timeout: RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        let dir = std::env::temp_dir().join(format!("modal-export-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;

        let result = self.render_in(&dir, html).await;

        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!("failed to remove {}: {}", dir.display(), e);
        }
        result
    }

    async fn render_in(&self, dir: &Path, html: &str) -> Result<Vec<u8>, ExportError> {
        let input = dir.join("report.html");
        let output = dir.join("report.pdf");
        tokio::fs::write(&input, html).await?;

        let mut cmd = Command::new(&self.browser);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(browser = %self.browser.display(), "rendering PDF");

        let finished = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(ExportError::Timeout(self.timeout)),
            Ok(Err(source)) => {
                return Err(ExportError::Launch {
                    browser: self.browser.display().to_string(),
                    source,
                });
            }
            Ok(Ok(out)) => out,
        };

        if !finished.status.success() {
            return Err(ExportError::Browser {
                status: finished.status.to_string(),
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }

        Ok(tokio::fs::read(&output).await?)
    }
}

/// `Content-Disposition` filename for a report title.
pub fn attachment_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.pdf", stem)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

fn record_date(created_at: Option<&str>) -> String {
    match created_at {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => short_date(ts.date_naive()),
            Err(_) => escape_html(raw),
        },
        None => String::new(),
    }
}

const STYLE: &str = r#"
        @page { size: A4; margin: 20mm; }
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 0;
            padding: 20px;
            background: white;
            color: #333;
            -webkit-print-color-adjust: exact;
            print-color-adjust: exact;
        }
        .header { text-align: center; border-bottom: 2px solid #667eea; padding-bottom: 20px; margin-bottom: 30px; }
        .header h1 { color: #2c3e50; margin: 0; font-size: 28px; }
        .header p { color: #6c757d; margin: 10px 0 0 0; }
        .calculation-item {
            background: #f8f9fa;
            border: 1px solid #e9ecef;
            border-left: 4px solid #667eea;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 20px;
        }
        .calculation-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 15px; }
        .calculation-type { font-weight: bold; color: #2c3e50; font-size: 18px; }
        .calculation-date { color: #6c757d; font-size: 14px; }
        .calculation-input {
            background: white; padding: 10px; border-radius: 4px; margin: 10px 0;
            font-family: monospace; border: 1px solid #dee2e6;
        }
        .calculation-result {
            background: #e3f2fd; padding: 15px; border-radius: 4px; margin: 10px 0;
            font-family: monospace; font-weight: bold; color: #1976d2; border: 1px solid #bbdefb;
        }
        .calculation-description { color: #6c757d; font-style: italic; margin: 10px 0; }
        .footer {
            text-align: center; margin-top: 40px; padding-top: 20px;
            border-top: 1px solid #e9ecef; color: #6c757d; font-size: 12px;
        }
"#;

/// Full HTML document for `calculations`, dated `generated`.
pub fn render_report(title: &str, calculations: &[ExportCalculation], generated: NaiveDate) -> String {
    let title = escape_html(title);
    let mut items = String::new();

    for calc in calculations {
        items.push_str("\n    <div class=\"calculation-item\">\n");
        items.push_str(&format!(
            "        <div class=\"calculation-header\">\n            <span class=\"calculation-type\">{}</span>\n            <span class=\"calculation-date\">{}</span>\n        </div>\n",
            escape_html(&calc.kind),
            record_date(calc.created_at.as_deref()),
        ));
        if let Some(description) = calc.description.as_deref().filter(|d| !d.is_empty()) {
            items.push_str(&format!(
                "        <div class=\"calculation-description\">{}</div>\n",
                escape_html(description)
            ));
        }
        items.push_str(&format!(
            "        <div class=\"calculation-input\"><strong>Input:</strong> {}</div>\n",
            escape_html(&calc.input)
        ));
        items.push_str(&format!(
            "        <div class=\"calculation-result\"><strong>Result:</strong> {}</div>\n",
            escape_html(&calc.result)
        ));
        items.push_str("    </div>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <p>Generated on {date}</p>
    </div>
{items}
    <div class="footer">
        <p>Modal Realism Calculator Suite - Generated Report</p>
    </div>
</body>
</html>
"#,
        title = title,
        style = STYLE,
        date = short_date(generated),
        items = items,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(description: Option<&str>) -> ExportCalculation {
        ExportCalculation {
            kind: "world-size".into(),
            input: "n = 3".into(),
            result: "1/3 < 1/2".into(),
            description: description.map(String::from),
            created_at: Some("2026-03-04T10:00:00.000Z".into()),
        }
    }

    #[test]
    fn filenames_replace_non_alphanumerics() {
        assert_eq!(attachment_name("Calculation Report"), "Calculation_Report.pdf");
        assert_eq!(attachment_name("World #7 (draft)"), "World__7__draft_.pdf");
    }

    #[test]
    fn report_escapes_and_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let html = render_report("<Mine>", &[calc(Some("a & b")), calc(None)], date);

        assert!(html.contains("<h1>&lt;Mine&gt;</h1>"));
        assert!(html.contains("Generated on 10/16/2026"));
        assert!(html.contains("<span class=\"calculation-date\">3/4/2026</span>"));
        assert!(html.contains("1/3 &lt; 1/2"));
        assert_eq!(html.matches("class=\"calculation-item\"").count(), 2);
        assert_eq!(html.matches("class=\"calculation-description\"").count(), 1);
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("@page { size: A4; margin: 20mm; }"));
    }

    #[tokio::test]
    async fn missing_browser_is_a_launch_error() {
        let renderer = PdfRenderer::new("/nonexistent/modal-test-browser");
        let err = renderer.render("<html></html>").await.unwrap_err();
        assert!(matches!(err, ExportError::Launch { .. }));
    }
}
