//! Code generation
//!
//! [`ModelCodeGenerator`] asks a messages-style model API for the application
//! as a JSON object of filename to content. Each call is stateless; revision
//! context comes only from the existing repository name in the prompt.

use crate::templates::{template_file, template_files, REQUIRED_FILES};
use crate::types::{ModelMessage, ModelRequest, ModelResponse};
use appforge_core::config::GeneratorConfig;
use appforge_core::{AppforgeError, GeneratedFiles, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

const API_VERSION: &str = "2023-06-01";

/// Inputs to one generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub brief: String,
    pub checks: Vec<String>,
    /// Staged attachment files
    pub attachments: Vec<PathBuf>,
    /// Repository being revised, `None` for a new application
    pub existing_repo: Option<String>,
}

/// Produces application source files
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedFiles>;
}

/// Deterministic generator used when no model key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl CodeGenerator for TemplateGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedFiles> {
        tracing::info!("Generating template application");
        Ok(template_files(&request.brief))
    }
}

/// Generator backed by a messages-style model API
#[derive(Debug, Clone)]
pub struct ModelCodeGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
}

impl ModelCodeGenerator {
    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl CodeGenerator for ModelCodeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedFiles> {
        tracing::info!(
            "Requesting application code from {} ({} checks, {} attachments)",
            self.model,
            request.checks.len(),
            request.attachments.len()
        );

        let body = ModelRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ModelMessage {
                role: "user".to_string(),
                content: build_prompt(request),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppforgeError::Generation(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(AppforgeError::Generation(format!(
                "Model API error {}: {}",
                status, error_text
            )));
        }

        let parsed: ModelResponse = response
            .json()
            .await
            .map_err(|e| AppforgeError::Generation(format!("Failed to parse response: {}", e)))?;

        let output = parsed
            .content
            .first()
            .map(|block| block.text.as_str())
            .ok_or_else(|| AppforgeError::Generation("No content in response".to_string()))?;

        if let Some(usage) = &parsed.usage {
            tracing::info!(
                "Generation complete ({} chars, {} input tokens, {} output tokens)",
                output.len(),
                usage.input_tokens,
                usage.output_tokens
            );
        }

        Ok(parse_generated_files(output, &request.brief))
    }
}

/// Build the generation prompt
pub fn build_prompt(request: &GenerationRequest) -> String {
    let checks = request
        .checks
        .iter()
        .map(|check| format!("- {}", check))
        .collect::<Vec<_>>()
        .join("\n");

    let context = match &request.existing_repo {
        Some(repo) => format!("EXISTING REPOSITORY: {}", repo),
        None => "NEW APPLICATION".to_string(),
    };

    let mut prompt = format!(
        "Create a complete web application based on this brief:\n\n\
         BRIEF: {}\n\n\
         REQUIREMENTS:\n{}\n\n\
         {}\n",
        request.brief, checks, context
    );

    if !request.attachments.is_empty() {
        prompt.push_str("\nATTACHMENTS:\n");
        for path in &request.attachments {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            prompt.push_str(&format!("- {}\n", name));
        }
    }

    prompt.push_str(
        "\nGenerate the following files as a single JSON object:\n\
         {\n\
         \x20 \"README.md\": \"Complete README with setup instructions\",\n\
         \x20 \"index.html\": \"Main HTML file\",\n\
         \x20 \"style.css\": \"CSS styles\",\n\
         \x20 \"script.js\": \"JavaScript functionality\",\n\
         \x20 \"LICENSE\": \"MIT License content\"\n\
         }\n\n\
         The code must be complete, runnable, and meet every requirement.\n\
         Return only valid JSON.\n",
    );

    prompt
}

/// Extract the file map from a model reply
///
/// Takes the text between the first `{` and the last `}`. If that is not a
/// JSON object the template application is used instead. Non-string values
/// are dropped, and every required file the reply lacks comes from the
/// templates.
pub fn parse_generated_files(output: &str, brief: &str) -> GeneratedFiles {
    let mut files = match extract_json_object(output) {
        Some(map) => map,
        None => {
            tracing::warn!("Model reply was not a JSON object, using template application");
            template_files(brief)
        }
    };

    for name in REQUIRED_FILES {
        if !files.contains_key(name) {
            tracing::debug!("Filling missing {} from template", name);
            files.insert(name.to_string(), template_file(name, brief));
        }
    }

    files
}

fn extract_json_object(output: &str) -> Option<GeneratedFiles> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }

    let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(&output[start..=end]).ok()?;
    Some(
        map.into_iter()
            .filter_map(|(name, value)| match value {
                serde_json::Value::String(content) => Some((name, content)),
                _ => None,
            })
            .collect(),
    )
}
