//! Human-readable renderings of a stored results record.
//!
//! Everything here only reads the record's fields; nothing is recomputed.

use crate::results::ResultsRecord;
use serde::{Deserialize, Serialize};

/// JSON envelope for command output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Plain-text performance summary.
pub fn summary(results: &ResultsRecord) -> String {
    let mut lines = vec![
        "Portfolio Performance Summary".to_string(),
        "=============================".to_string(),
        String::new(),
        format!("Final Value: {:.2}", results.final_value()),
        String::new(),
        "Returns:".to_string(),
        format!("- Total Return: {}", pct(results.total_return())),
        format!("- Annualized Return: {}", pct(results.annualized_return())),
        String::new(),
        "Risk Metrics:".to_string(),
        format!("- Volatility: {}", pct(results.volatility())),
        format!("- Maximum Drawdown: {}", pct(results.max_drawdown())),
        format!("- Value at Risk (95%): {}", pct(results.var_95())),
        String::new(),
        "Risk-Adjusted Metrics:".to_string(),
        format!("- Sharpe Ratio: {:.2}", results.sharpe_ratio()),
        format!("- Sortino Ratio: {:.2}", results.sortino_ratio()),
        format!("- Calmar Ratio: {:.2}", results.calmar_ratio()),
        String::new(),
        "Portfolio Composition:".to_string(),
    ];
    lines.extend(
        results
            .weights()
            .iter()
            .map(|(symbol, weight)| format!("- {}: {}", symbol, pct(*weight))),
    );

    lines.join("\n") + "\n"
}

/// Standalone HTML report.
pub fn html(results: &ResultsRecord) -> String {
    let metrics = [
        ("Final Value", format!("{:.2}", results.final_value())),
        ("Total Return", pct(results.total_return())),
        ("Annualized Return", pct(results.annualized_return())),
        ("Volatility", pct(results.volatility())),
        ("Maximum Drawdown", pct(results.max_drawdown())),
        ("Value at Risk (95%)", pct(results.var_95())),
        ("Sharpe Ratio", format!("{:.2}", results.sharpe_ratio())),
        ("Sortino Ratio", format!("{:.2}", results.sortino_ratio())),
        ("Calmar Ratio", format!("{:.2}", results.calmar_ratio())),
    ];

    let mut lines = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head><title>Portfolio Backtest Report</title></head>".to_string(),
        "<body>".to_string(),
        "<h1>Portfolio Backtest Report</h1>".to_string(),
        "<h2>Results Summary</h2>".to_string(),
        "<table>".to_string(),
    ];
    lines.extend(metrics.iter().map(|(label, value)| table_row(label, value)));
    lines.push("</table>".to_string());
    lines.push("<h2>Portfolio Composition</h2>".to_string());
    lines.push("<table>".to_string());
    lines.extend(
        results
            .weights()
            .iter()
            .map(|(symbol, weight)| table_row(&escape(symbol), &pct(*weight))),
    );
    lines.push("</table>".to_string());
    lines.push("</body>".to_string());
    lines.push("</html>".to_string());

    lines.join("\n") + "\n"
}

fn table_row(label: &str, value: &str) -> String {
    format!("<tr><th>{}</th><td>{}</td></tr>", label, value)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::sample_record;

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let json = serde_json::to_string(&ApiResponse::<()>::err("boom")).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"boom"}"#);
    }

    #[test]
    fn test_summary_sections() {
        let text = summary(&sample_record());

        assert!(text.contains("Returns:"));
        assert!(text.contains("Risk Metrics:"));
        assert!(text.contains("Risk-Adjusted Metrics:"));
        assert!(text.contains("Portfolio Composition:"));
        assert!(text.contains("- Total Return: 12.50%"));
        assert!(text.contains("- Sharpe Ratio: 1.10"));
        assert!(text.contains("- AAPL: 50.00%"));
    }

    #[test]
    fn test_html_lists_metrics_and_weights() {
        let page = html(&sample_record());

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<tr><th>Maximum Drawdown</th><td>12.50%</td></tr>"));
        assert!(page.contains("<tr><th>MSFT</th><td>50.00%</td></tr>"));
        assert!(page.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_summary_line_layout() {
        let text = summary(&sample_record());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Portfolio Performance Summary");
        assert_eq!(lines[3], "Final Value: 112500.00");
        assert_eq!(lines.last(), Some(&"- MSFT: 50.00%"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("A<B>&C"), "A&lt;B&gt;&amp;C");
    }
}
