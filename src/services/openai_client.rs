use anyhow::Context;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use serde::{Deserialize, Serialize};

use crate::domain::Patent;

const SYSTEM_PROMPT: &str = "\
You are a senior IP & deep-tech analyst at an investment bank with a knack \
for identifying patents that are likely to be successful in the market and \
APPEALING TO INVESTORS. Audience: investors, banks and business operators. \
Assess the patent below for breadth, market gravity, feasibility, moat, \
platform scope, and scalability. Return ONLY a JSON object with the keys \
wow_score (number between 0 and 1), headline (string), verdict (string, \
Go / No-Go in at most 50 words), key_use_cases (array of 3-5 strings) and \
rationale (string).";

/// Commercial-potential snapshot for one record. Opaque collaborator
/// output; the extraction core never interprets it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PatentReportCard {
    pub wow_score: f32,
    pub headline: String,
    pub verdict: String,
    pub key_use_cases: Vec<String>,
    pub rationale: String,
}

pub struct OpenaiClient {
    client: Client<OpenAIConfig>,
}

impl Default for OpenaiClient {
    fn default() -> Self {
        OpenaiClient {
            client: Client::new(),
        }
    }
}

impl OpenaiClient {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        OpenaiClient {
            client: Client::with_config(config),
        }
    }

    pub async fn generate_report_card(&self, patent: &Patent) -> anyhow::Result<PatentReportCard> {
        let patent_json = serde_json::to_string(patent)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model("gpt-4o-mini")
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(format!("PATENT_INFO_JSON:\n{patent_json}"))
                    .build()?
                    .into(),
            ])
            .max_tokens(1000_u32)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .context("No choices in Openai response")?
            .message
            .content
            .clone()
            .context("No content in Openai response")?;

        let report_card = serde_json::from_str(&content)
            .with_context(|| format!("Openai response is not a report card: {content}"))?;

        Ok(report_card)
    }
}
