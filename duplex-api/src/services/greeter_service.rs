//! Greeter Service
//!
//! Greeting lookup by name, backed by the store.

use std::sync::Arc;

use duplex_core::{validate_name, DuplexResult, GreeterRepo, Greeting, ValidationError};

pub struct GreeterService {
    repo: Arc<dyn GreeterRepo>,
}

impl GreeterService {
    pub fn new(repo: Arc<dyn GreeterRepo>) -> Self {
        Self { repo }
    }

    /// The stored greeting for `name`, or `Hello <name>` when none is stored.
    pub async fn say_hello(&self, name: &str) -> DuplexResult<String> {
        let name = validate_name(name)?;
        let message = match self.repo.find_greeting(&name).await? {
            Some(greeting) => greeting.message,
            None => format!("Hello {}", name),
        };
        tracing::debug!(name = %name, "greeting resolved");
        Ok(message)
    }

    /// Store (or replace) the greeting for `name`.
    pub async fn set_greeting(&self, name: &str, message: &str) -> DuplexResult<Greeting> {
        let name = validate_name(name)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "message".to_string(),
            }
            .into());
        }
        self.repo.save_greeting(&name, message).await
    }
}
