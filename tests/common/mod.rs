//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use vton_swap_gateway::backend::{ModelHost, ModelOutput, Prediction, TryOnInput};
use vton_swap_gateway::config::{AppEnvironment, Settings};
use vton_swap_gateway::error::{AppError, Result};

pub const BOUNDARY: &str = "----vton-test-boundary";

/// What the fake host does when asked to run a model
pub enum Behavior {
    Output(Value),
    Fail(String),
    Hang(Duration),
}

/// In-memory model host that records every call
pub struct FakeHost {
    behavior: Behavior,
    calls: AtomicUsize,
    last_call: Mutex<Option<(String, TryOnInput)>>,
}

impl FakeHost {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, TryOnInput)> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelHost for FakeHost {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, model_ref: &str, input: &TryOnInput) -> Result<ModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((model_ref.to_string(), input.clone()));

        match &self.behavior {
            Behavior::Output(value) => Ok(ModelOutput(value.clone())),
            Behavior::Fail(message) => Err(AppError::Backend(message.clone())),
            Behavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(ModelOutput(Value::String("too late".to_string())))
            }
        }
    }

    async fn get_prediction(&self, id: &str) -> Result<Prediction> {
        Err(AppError::Backend(format!("unknown prediction {}", id)))
    }

    async fn cancel_prediction(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

/// Settings with the simulated delay disabled
pub fn test_settings(environment: AppEnvironment) -> Settings {
    let mut settings = Settings::default();
    settings.environment = environment;
    settings.simulation.delay_ms = 0;
    settings
}

/// One part of a multipart body
pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, data: Vec<u8>) -> Self {
        Self {
            name,
            file: Some((filename, content_type)),
            data,
        }
    }

    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            file: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

/// Encode parts as a multipart/form-data body using [`BOUNDARY`]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, filename, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Fake JPEG bytes of the given length
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len, 0x42);
    bytes
}

/// Fake PNG bytes of the given length
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G'];
    bytes.resize(len, 0x17);
    bytes
}
