/// Default Moonshot API base URL
pub const MOONSHOT_API_URL: &str = "https://api.moonshot.cn/v1";

/// Models offered by default; the first one is active at startup
pub const DEFAULT_MODELS: &[&str] = &[
    "kimi-latest",
    "moonshot-v1-auto",
    "moonshot-v1-8k",
    "moonshot-v1-32k",
    "moonshot-v1-128k",
];

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Normalize an API base URL: no trailing slash and no endpoint path
pub fn normalize_api_base(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/chat/completions")
        .unwrap_or(trimmed)
        .to_string()
}

/// Chat completions endpoint for a base URL
pub fn chat_completions_url(base: &str) -> String {
    format!("{}/chat/completions", normalize_api_base(base))
}

/// File upload endpoint for a base URL
pub fn files_url(base: &str) -> String {
    format!("{}/files", normalize_api_base(base))
}

/// Endpoint addressing one uploaded file
pub fn file_url(base: &str, file_id: &str) -> String {
    format!("{}/{}", files_url(base), file_id)
}

/// Endpoint returning the extracted content of one uploaded file
pub fn file_content_url(base: &str, file_id: &str) -> String {
    format!("{}/content", file_url(base, file_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(normalize_api_base("https://api.moonshot.cn/v1/"), "https://api.moonshot.cn/v1");
    }

    #[test]
    fn test_normalize_strips_endpoint_path() {
        assert_eq!(
            normalize_api_base("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1"
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let base = MOONSHOT_API_URL;
        assert_eq!(chat_completions_url(base), "https://api.moonshot.cn/v1/chat/completions");
        assert_eq!(files_url(base), "https://api.moonshot.cn/v1/files");
        assert_eq!(file_url(base, "f-1"), "https://api.moonshot.cn/v1/files/f-1");
        assert_eq!(file_content_url(base, "f-1"), "https://api.moonshot.cn/v1/files/f-1/content");
    }

    #[test]
    fn test_default_models_not_empty() {
        assert_eq!(DEFAULT_MODELS[0], "kimi-latest");
        assert!(DEFAULT_MODELS.len() >= 2);
    }
}
