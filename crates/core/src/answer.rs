use crate::corpus::Corpus;
use crate::embeddings::Embedder;
use crate::error::ChatError;
use crate::models::{Answer, RetrievedChunk};
use crate::retrieval::{retrieve_relevant_chunks, DEFAULT_TOP_K};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const NO_DOCUMENTS_MESSAGE: &str = "No documents loaded. Please upload a PDF first.";

/// The fixed reply the model is instructed to give for questions
/// unrelated to the loaded material.
pub fn refusal_message(sources: &[String]) -> String {
    format!(
        "I can only answer questions about the uploaded course material. \
         Available documents: {}.",
        sources.join(", ")
    )
}

/// Assemble the grounded prompt: each retrieved chunk tagged with its
/// source file, the question verbatim, and the instruction block that
/// pins the model to the supplied context.
pub fn build_prompt(
    question: &str,
    chunks: &[RetrievedChunk],
    available_sources: &[String],
) -> String {
    let mut context = String::new();
    for chunk in chunks {
        context.push_str(&format!("[Source: {}]\n{}\n\n", chunk.source, chunk.text));
    }

    format!(
        "Answer the question using only the context below, extracted from the \
         uploaded course documents.\n\n\
         Context:\n{context}\
         Question: {question}\n\n\
         Instructions:\n\
         - Answer only from the provided context, and name the source file(s) \
         your answer draws on.\n\
         - If the question is related to the material but the context does not \
         literally cover it, begin your reply with \"General explanation:\" and \
         make clear the answer does not come from the documents.\n\
         - If the question is unrelated to the material, reply exactly: \
         \"{refusal}\"\n",
        refusal = refusal_message(available_sources)
    )
}

/// A generative language model: prompt in, text out. May fail; callers
/// decide whether to surface or rephrase the failure.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&GenerateRequest {
                contents: vec![RequestContent {
                    parts: vec![RequestPart { text: prompt }],
                }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let details = response.text().await.unwrap_or_default();
            return Err(ChatError::BackendResponse { status, details });
        }

        let payload: Value = response.json().await?;
        candidate_text(&payload)
    }
}

fn candidate_text(payload: &Value) -> Result<String, ChatError> {
    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or(ChatError::EmptyResponse)?;

    let text = parts
        .iter()
        .filter_map(|part| part.pointer("/text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(ChatError::EmptyResponse);
    }
    Ok(text)
}

/// Ties the pipeline together for one question: embed the query,
/// retrieve the top-k chunks, assemble the prompt, call the model.
pub struct Answerer {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn GenerativeModel>,
    top_k: usize,
}

impl Answerer {
    pub fn new(embedder: Arc<dyn Embedder>, model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            embedder,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub async fn answer(&self, question: &str, corpus: &Corpus) -> Result<Answer, ChatError> {
        if corpus.is_empty() {
            return Ok(Answer {
                text: NO_DOCUMENTS_MESSAGE.to_string(),
                sources: Vec::new(),
            });
        }

        let query_embedding = self.embedder.embed_one(question).await?;
        let chunks = retrieve_relevant_chunks(&query_embedding, corpus, self.top_k);
        let prompt = build_prompt(question, &chunks, &corpus.sources());
        let text = self.model.generate(&prompt).await?;

        let mut sources = Vec::new();
        for chunk in &chunks {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }

        Ok(Answer { text, sources })
    }
}
