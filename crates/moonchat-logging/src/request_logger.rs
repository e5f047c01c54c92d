use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::safe_truncate;

const MAX_CONSOLE_BODY: usize = 5000;

/// Show only the first characters of an API key
fn redact_key(api_key: &str) -> String {
    format!("{}***", api_key.chars().take(10).collect::<String>())
}

/// URL, host, port and scheme lines for a request dump
fn describe_url(url: &str) -> Vec<(&'static str, String)> {
    match reqwest::Url::parse(url) {
        Ok(parsed_url) => vec![
            ("URL", url.to_string()),
            ("Host", parsed_url.host_str().unwrap_or("unknown").to_string()),
            ("Port", parsed_url.port().map(|p| p.to_string()).unwrap_or_else(||
                if parsed_url.scheme() == "https" { "443 (default)".to_string() } else { "80 (default)".to_string() }
            )),
            ("Scheme", parsed_url.scheme().to_string()),
        ],
        Err(_) => vec![("URL", url.to_string())],
    }
}

fn print_body(body: &str) {
    if body.chars().count() > MAX_CONSOLE_BODY {
        println!("{}", safe_truncate(body, MAX_CONSOLE_BODY));
        println!("\n{}", format!("... (truncated, total {} bytes)", body.len()).bright_black());
    } else {
        println!("{}", body);
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request<T: Serialize>(url: &str, request: &T, api_key: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());

    for (label, value) in describe_url(url) {
        println!("{}: {}", label.bright_yellow(), value);
    }

    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    println!("  Authorization: Bearer {}", redact_key(api_key));

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(request) {
        Ok(json) => print_body(&json),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Write an HTTP request dump into `logs_dir` for persistent debugging.
/// Returns the path of the written file.
pub fn log_request_to_file<T: Serialize>(
    logs_dir: &Path,
    url: &str,
    request: &T,
    model: &str,
    api_key: &str,
) -> Result<PathBuf> {
    let now = Local::now();
    let model_name = model.replace('/', "-");
    let filename = format!("req-{}-{}.txt", now.format("%Y%m%d-%H%M%S%3f"), model_name);
    let file_path = logs_dir.join(&filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", now.to_rfc3339()));
    log_content.push_str(&format!("Model: {}\n\n", model));

    for (label, value) in describe_url(url) {
        log_content.push_str(&format!("{}: {}\n", label, value));
    }

    log_content.push_str("\nHeaders:\n");
    log_content.push_str("  Content-Type: application/json\n");
    log_content.push_str(&format!("  Authorization: Bearer {}\n\n", redact_key(api_key)));

    log_content.push_str("Request Body:\n");
    match serde_json::to_string_pretty(request) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => {
            log_content.push_str(&format!("Error serializing request: {}\n", e));
        }
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    Ok(file_path)
}

/// Log HTTP response details for debugging (console output)
pub fn log_response(status: &reqwest::StatusCode, headers: &reqwest::header::HeaderMap, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_green());
    println!("{}", "📥 HTTP RESPONSE DEBUG".bright_green().bold());
    println!("{}", "═".repeat(80).bright_green());

    println!("{}: {} {}",
        "Status".bright_yellow(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    println!("\n{}", "Headers:".bright_yellow());
    for (name, value) in headers.iter() {
        if let Ok(val_str) = value.to_str() {
            println!("  {}: {}", name.as_str().bright_white(), val_str);
        }
    }

    println!("\n{}", "Response Body:".bright_yellow());
    // Try to pretty-print JSON, fall back to raw text
    match serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
    {
        Some(pretty) => print_body(&pretty),
        None => print_body(body),
    }

    println!("{}", "═".repeat(80).bright_green());
    println!();
}

/// Log streaming chunk for debugging (console output)
pub fn log_stream_chunk(chunk_num: usize, data: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", format!("📦 Stream Chunk #{}: {}", chunk_num,
        if data.chars().count() > 200 {
            format!("{}... ({} bytes)", safe_truncate(data, 200), data.len())
        } else {
            data.to_string()
        }
    ).bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redact_key_keeps_prefix_only() {
        assert_eq!(redact_key("sk-abcdefghijklmnop"), "sk-abcdefg***");
    }

    #[test]
    fn test_describe_url_default_https_port() {
        let lines = describe_url("https://api.moonshot.cn/v1/chat/completions");
        assert!(lines.contains(&("Host", "api.moonshot.cn".to_string())));
        assert!(lines.contains(&("Port", "443 (default)".to_string())));
    }

    #[test]
    fn test_request_log_file_redacts_key() {
        let temp_dir = TempDir::new().unwrap();
        let request = serde_json::json!({"model": "kimi-latest", "messages": []});

        let path = log_request_to_file(
            temp_dir.path(),
            "https://api.moonshot.cn/v1/chat/completions",
            &request,
            "kimi-latest",
            "sk-secretsecretsecret",
        )
        .unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Model: kimi-latest"));
        assert!(content.contains("Bearer sk-secrets***"));
        assert!(!content.contains("sk-secretsecretsecret"));
    }
}
