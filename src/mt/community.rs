//! Free community translation providers
//!
//! Each provider is described by a [`ProviderDescriptor`]: where to send the
//! request, how to shape it, and where the translation lives in the answer.
//! A single [`CommunityProvider`] type executes any descriptor, so adding a
//! provider means adding a descriptor, not another branch in the orchestrator.

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{
    AUTO_LOCALE, MachineTranslator, ensure_translated, normalize_locale, validate_locale,
};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request payload produced by a descriptor's builder
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    /// JSON body, sent with POST
    Json(Value),
    /// Query-string parameters, sent with GET
    Query(Vec<(&'static str, String)>),
    /// Path segments appended to the endpoint, sent with GET
    Path(Vec<String>),
}

/// `(text, source_locale, target_locale) -> request`
pub type RequestBuilder = fn(&str, &str, &str) -> ProviderRequest;

/// Pulls the translated text out of a provider response
pub type ResponseExtractor = fn(&Value) -> Option<String>;

/// Static description of a free provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub http_method: HttpMethod,
    /// Ascending: lower is tried first
    pub priority: u32,
    pub build_request: RequestBuilder,
    pub extract_response: ResponseExtractor,
}

pub const LIBRE_TRANSLATE: ProviderDescriptor = ProviderDescriptor {
    name: "LibreTranslate",
    endpoint: "https://libretranslate.com/translate",
    http_method: HttpMethod::Post,
    priority: 2,
    build_request: libre_translate_request,
    extract_response: flat_translated_text,
};

pub const MY_MEMORY: ProviderDescriptor = ProviderDescriptor {
    name: "MyMemory",
    endpoint: "https://api.mymemory.translated.net/get",
    http_method: HttpMethod::Get,
    priority: 3,
    build_request: my_memory_request,
    extract_response: my_memory_response,
};

pub const LINGVA_TRANSLATE: ProviderDescriptor = ProviderDescriptor {
    name: "LingvaTranslate",
    endpoint: "https://lingva.ml/api/v1",
    http_method: HttpMethod::Get,
    priority: 4,
    build_request: lingva_request,
    extract_response: lingva_response,
};

pub const ARGOS_TRANSLATE: ProviderDescriptor = ProviderDescriptor {
    name: "TranslateAPI",
    endpoint: "https://translate.argosopentech.com/translate",
    http_method: HttpMethod::Post,
    priority: 5,
    build_request: argos_request,
    extract_response: flat_translated_text,
};

/// The free providers in fallback order
pub const DEFAULT_DESCRIPTORS: [ProviderDescriptor; 4] =
    [LIBRE_TRANSLATE, MY_MEMORY, LINGVA_TRANSLATE, ARGOS_TRANSLATE];

fn libre_translate_request(text: &str, source: &str, target: &str) -> ProviderRequest {
    ProviderRequest::Json(json!({
        "q": text,
        "source": normalize_locale(source),
        "target": normalize_locale(target),
        "format": "html"
    }))
}

fn argos_request(text: &str, source: &str, target: &str) -> ProviderRequest {
    ProviderRequest::Json(json!({
        "q": text,
        "source": normalize_locale(source),
        "target": normalize_locale(target)
    }))
}

fn my_memory_request(text: &str, source: &str, target: &str) -> ProviderRequest {
    // MyMemory has no auto-detection in langpair; site content is authored in English.
    let source = if source == AUTO_LOCALE {
        "en".to_string()
    } else {
        normalize_locale(source)
    };
    ProviderRequest::Query(vec![
        ("q", text.to_string()),
        ("langpair", format!("{}|{}", source, normalize_locale(target))),
    ])
}

fn lingva_request(text: &str, source: &str, target: &str) -> ProviderRequest {
    let source = if source == AUTO_LOCALE {
        AUTO_LOCALE.to_string()
    } else {
        normalize_locale(source)
    };
    ProviderRequest::Path(vec![source, normalize_locale(target), text.to_string()])
}

fn flat_translated_text(json: &Value) -> Option<String> {
    json["translatedText"].as_str().map(str::to_string)
}

fn my_memory_response(json: &Value) -> Option<String> {
    // Quota and validation errors come back as HTTP 200 with a non-200 responseStatus.
    if let Some(status) = json.get("responseStatus") {
        let code = status
            .as_u64()
            .or_else(|| status.as_str().and_then(|s| s.parse().ok()));
        if code != Some(200) {
            return None;
        }
    }
    json["responseData"]["translatedText"]
        .as_str()
        .map(str::to_string)
}

fn lingva_response(json: &Value) -> Option<String> {
    json["translation"].as_str().map(str::to_string)
}

/// A free provider driven by a [`ProviderDescriptor`]
#[derive(Debug, Clone)]
pub struct CommunityProvider {
    descriptor: ProviderDescriptor,
    client: reqwest::Client,
}

impl CommunityProvider {
    pub fn new(descriptor: ProviderDescriptor, timeout: Duration) -> MtResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { descriptor, client })
    }

    /// All built-in free providers, in fallback order
    pub fn defaults(timeout: Duration) -> MtResult<Vec<Self>> {
        DEFAULT_DESCRIPTORS
            .iter()
            .map(|descriptor| Self::new(*descriptor, timeout))
            .collect()
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn build_http_request(&self, request: ProviderRequest) -> MtResult<reqwest::RequestBuilder> {
        let endpoint = self.descriptor.endpoint;
        match (self.descriptor.http_method, request) {
            (HttpMethod::Post, ProviderRequest::Json(body)) => {
                Ok(self.client.post(endpoint).json(&body))
            }
            (HttpMethod::Get, ProviderRequest::Query(params)) => {
                let url = Url::parse_with_params(endpoint, &params)
                    .map_err(|e| MtError::ConfigError(format!("Bad endpoint {}: {}", endpoint, e)))?;
                Ok(self.client.get(url))
            }
            (HttpMethod::Get, ProviderRequest::Path(segments)) => {
                let mut url = Url::parse(endpoint)
                    .map_err(|e| MtError::ConfigError(format!("Bad endpoint {}: {}", endpoint, e)))?;
                url.path_segments_mut()
                    .map_err(|_| {
                        MtError::ConfigError(format!("Endpoint cannot take a path: {}", endpoint))
                    })?
                    .pop_if_empty()
                    .extend(segments.iter());
                Ok(self.client.get(url))
            }
            (method, request) => Err(MtError::ConfigError(format!(
                "{}: {:?} request cannot carry {:?}",
                self.descriptor.name, method, request
            ))),
        }
    }
}

#[async_trait]
impl MachineTranslator for CommunityProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if text.trim().is_empty() {
            return Err(MtError::UnchangedText);
        }

        let request = (self.descriptor.build_request)(text, source_locale, target_locale);
        let response = self.build_http_request(request)?.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MtError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await.map_err(|e| {
            MtError::MalformedResponse(format!("{}: {}", self.descriptor.name, e))
        })?;

        let translated = (self.descriptor.extract_response)(&json).ok_or_else(|| {
            MtError::MalformedResponse(format!(
                "{}: translation missing from response",
                self.descriptor.name
            ))
        })?;

        ensure_translated(text, translated)
    }

    fn provider_name(&self) -> &str {
        self.descriptor.name
    }

    fn priority(&self) -> u32 {
        self.descriptor.priority
    }
}
