//! OpenAI vision classifier
//!
//! Sends the annotated tile as a base64 data URL and forces a single function
//! call whose arguments carry the reasoning and likelihood.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Classifier, failed_analysis};
use crate::domain::{Analysis, Likelihood};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const TOOL_NAME: &str = "analyze_garden";

const PROMPT: &str = "\
Analyze this satellite image of a suburban property and estimate how likely it is \
that a vegetable garden is present. Only one property is being assessed.

The property is outlined with a RED BOUNDARY LINE. Focus on the area inside it. \
If there is no red outline, a yellow dot marks the address point instead; assess \
the property around the dot.

Look for:
- Organized rows of plants
- Raised garden beds
- Rectangular or otherwise organized garden patches
- Dark soil with regular patterns
- Cultivated areas that differ from lawn

Describe what you observe first, then choose a likelihood:
- low: no clear evidence, mostly lawn, pavement or natural vegetation
- medium: some signs such as organized plantings or possible raised beds, not definitive
- high: clear evidence such as visible rows, raised beds or organized cultivation";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct GardenArguments {
    reasoning: Option<String>,
    likelihood: Option<String>,
}

/// Classifier backed by the chat completions API
pub struct OpenAiClassifier {
    url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for OpenAiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClassifier")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClassifier {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn request_body(&self, image: &[u8]) -> Value {
        let data_url = format!("data:{};base64,{}", mime_type(image), STANDARD.encode(image));
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Report the likelihood of a vegetable garden in a satellite image",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "reasoning": {
                                "type": "string",
                                "description": "What is visible on the property: vegetation patterns, structures, signs of cultivation"
                            },
                            "likelihood": {
                                "type": "string",
                                "enum": ["low", "medium", "high"],
                                "description": "low: no clear evidence; medium: some signs, not definitive; high: clear evidence"
                            }
                        },
                        "required": ["reasoning", "likelihood"]
                    }
                }
            }],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } }
        })
    }

    fn try_classify(&self, image: &[u8]) -> Result<Analysis> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image))
            .send()
            .context("Failed to reach classifier")?;

        if !response.status().is_success() {
            anyhow::bail!("Classifier request failed: {}", response.status());
        }

        let body: ChatResponse = response
            .json()
            .context("Failed to parse classifier response")?;
        parse_response(body)
    }
}

/// Media type of an encoded tile, JPEG unless the bytes say otherwise
fn mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        _ => "image/jpeg",
    }
}

/// Pull the forced tool call's arguments out of a completion
fn parse_response(body: ChatResponse) -> Result<Analysis> {
    let call = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.tool_calls.into_iter().next())
        .context("Classifier response has no tool call")?;

    let args: GardenArguments = serde_json::from_str(&call.function.arguments)
        .context("Tool call arguments are not valid JSON")?;

    Ok(Analysis {
        reasoning: args
            .reasoning
            .unwrap_or_else(|| "No reasoning provided".to_string()),
        likelihood: args
            .likelihood
            .as_deref()
            .map_or(Likelihood::Low, Likelihood::parse_or_low),
    })
}

impl Classifier for OpenAiClassifier {
    fn classify(&self, image: &[u8], address: &str) -> Analysis {
        match self.try_classify(image) {
            Ok(analysis) => analysis,
            Err(err) => {
                log::error!("Error analyzing image for {address}: {err:#}");
                failed_analysis()
            }
        }
    }
}
