use crate::api::TagsResponse;
use crate::utils::url::construct_api_url;

/// Model used when the endpoint cannot list its models.
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

/// List model names from `GET {base_url}/tags`, in the order served.
pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
    let tags_url = construct_api_url(base_url, "tags");
    let response = client.get(tags_url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("API request failed with status {status}: {error_text}").into());
    }

    let tags = response.json::<TagsResponse>().await?;
    Ok(tags.models.into_iter().map(|tag| tag.name).collect())
}

/// Keep `current` when the endpoint still serves it, otherwise take the
/// first listed model.
pub fn pick_model(models: &[String], current: &str) -> String {
    if models.iter().any(|model| model == current) {
        return current.to_string();
    }
    models
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{spawn_http_server, MockResponse};

    #[tokio::test]
    async fn lists_tag_names_in_order() {
        let server = spawn_http_server(vec![MockResponse::json(
            200,
            r#"{"models":[{"name":"llama3.2:1b","size":1},{"name":"qwen2.5:7b"}]}"#,
        )])
        .await;

        let models = fetch_models(&reqwest::Client::new(), &server.base_url())
            .await
            .unwrap();
        assert_eq!(models, vec!["llama3.2:1b", "qwen2.5:7b"]);
        let requests = server.requests().await;
        assert!(requests[0].request_line.starts_with("GET /api/tags "));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = spawn_http_server(vec![MockResponse::json(502, "bad gateway")]).await;
        let err = fetch_models(&reqwest::Client::new(), &server.base_url())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn pick_model_prefers_current_then_first() {
        let models = vec!["a".to_string(), "b".to_string()];
        assert_eq!(pick_model(&models, "b"), "b");
        assert_eq!(pick_model(&models, "zzz"), "a");
        assert_eq!(pick_model(&[], "zzz"), DEFAULT_MODEL);
    }
}
