// Discovery report generation

use crate::error::Result;
use docmirror_scanner::DiscoveryResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn generate_report(result: &DiscoveryResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Json => generate_json_report(result),
    }
}

/// Sorted listing of every discovered URL followed by a summary block.
pub fn generate_text_report(result: &DiscoveryResult) -> String {
    let mut report = String::new();

    if !result.discovered.is_empty() {
        report.push_str(&format!(
            "--- Listing {} unique internal links discovered up to depth {} for {} ---\n",
            result.discovered.len(),
            result.max_depth,
            result.start_url
        ));
        for url in &result.discovered {
            report.push_str(url);
            report.push('\n');
        }
        report.push('\n');
    }

    report.push_str("--- Summary of Link Discovery ---\n");
    report.push_str(&format!("Starting URL: {}\n", result.start_url));
    if result.root_prefix != result.start_url {
        report.push_str(&format!("Scope Root: {}\n", result.root_prefix));
    }
    report.push_str(&format!("Requested Crawl Depth: {}\n", result.max_depth));

    if result.discovered.is_empty() {
        report.push_str("No internal links found.\n");
    } else {
        report.push_str(&format!(
            "Total Unique Internal Links Discovered: {}\n",
            result.discovered.len()
        ));
    }

    if !result.failures.is_empty() {
        report.push_str(&format!("Pages That Could Not Be Fetched: {}\n", result.failures.len()));
        for failure in &result.failures {
            report.push_str(&format!("  {} ({})\n", failure.url, failure.error));
        }
    }

    report.push_str("--- End of Link Discovery Report ---\n");
    report
}

pub fn generate_json_report(result: &DiscoveryResult) -> Result<String> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "docmirror",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "crawl": {
                "start_url": result.start_url,
                "root_prefix": result.root_prefix,
                "max_depth": result.max_depth,
                "pages_fetched": result.fetched.len()
            },
            "summary": {
                "total_links": result.discovered.len(),
                "failed_fetches": result.failures.len()
            },
            "links": result.discovered,
            "failures": result.failures
        }
    });

    Ok(serde_json::to_string_pretty(&json_report)?)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
