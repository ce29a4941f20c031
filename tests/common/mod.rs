//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, Response},
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use labscan::{
    config::Config,
    handlers::{create_router, AppState},
    services::{AnalysisModel, PromptPayload},
    AppError, AppResult,
};

pub const BOUNDARY: &str = "labscan-test-boundary";

/// Builds a PDF where each entry becomes one page. An empty entry produces a
/// page with an empty content stream.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize test pdf");
    buffer
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut builder = config::Config::builder()
        .set_override("api_key", "test-key")
        .expect("api_key override");
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).expect("config override");
    }
    let source = builder.build().expect("config source");
    Config::from_source(&source).expect("valid test config")
}

#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Replies with a fixed prefix followed by the prompt body.
    Echo,
    Fail(String),
    Empty,
    Panic,
}

/// In-memory stand-in for a provider, recording every prompt it receives.
pub struct FakeModel {
    behavior: FakeBehavior,
    pub prompts: Mutex<Vec<PromptPayload>>,
}

impl FakeModel {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded(&self) -> Vec<PromptPayload> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl AnalysisModel for FakeModel {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn generate(&self, prompt: &PromptPayload) -> AppResult<String> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.clone());
        match &self.behavior {
            FakeBehavior::Echo => Ok(format!("Заключение: {}", prompt.text)),
            FakeBehavior::Fail(message) => Err(AppError::provider(message.clone())),
            FakeBehavior::Empty => Err(AppError::provider("fake returned an empty response")),
            FakeBehavior::Panic => panic!("fake model exploded"),
        }
    }
}

pub fn app_with(model: Arc<FakeModel>, overrides: &[(&str, &str)]) -> axum::Router {
    let state = AppState::new(test_config(overrides), model);
    create_router(state)
}

pub fn multipart_request(file_name: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"file\"; filename=\"{}\"", name),
        None => "form-data; name=\"file\"".to_string(),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("multipart request")
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
