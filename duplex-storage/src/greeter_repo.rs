use async_trait::async_trait;
use duplex_core::{DuplexResult, GreeterRepo, Greeting};

use crate::data::Data;

/// Greetings stored by name in the persistent store.
pub struct GreeterRepository {
    data: Data,
}

impl GreeterRepository {
    pub fn new(data: Data) -> Self {
        Self { data }
    }
}

#[async_trait]
impl GreeterRepo for GreeterRepository {
    async fn find_greeting(&self, name: &str) -> DuplexResult<Option<Greeting>> {
        Ok(self.data.store().greeting_get(name).await?)
    }

    async fn save_greeting(&self, name: &str, message: &str) -> DuplexResult<Greeting> {
        Ok(self.data.store().greeting_put(name, message).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_find() -> DuplexResult<()> {
        let repo = GreeterRepository::new(Data::in_memory());
        assert_eq!(repo.find_greeting("kratos").await?, None);
        let saved = repo.save_greeting("kratos", "Welcome back").await?;
        assert_eq!(repo.find_greeting("kratos").await?, Some(saved));
        Ok(())
    }
}
