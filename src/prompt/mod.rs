
use crate::config::AssistantConfig;

/// Composes the single text prompt sent to the model.
///
/// Query, context and language are inserted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    assistant_name: String,
    product_name: String,
}

impl PromptBuilder {
    #[inline]
    pub fn new(assistant_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            product_name: product_name.into(),
        }
    }

    #[inline]
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(&config.assistant_name, &config.product_name)
    }

    #[inline]
    pub fn build(&self, query: &str, context: &str, preferred_language: &str) -> String {
        format!(
            "\nYou are {name}, a developer assistant bot for {product}. \
             Your job is to help software engineers integrate {product}'s REST APIs.\n\
             Answer using the documentation context below. \
             If the context does not cover the question, say so instead of guessing.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             When code examples are available, prefer examples written in {language}.\n\
             \n\
             USER QUERY: {query}\n",
            name = self.assistant_name,
            product = self.product_name,
            context = context,
            language = preferred_language,
            query = query,
        )
    }

    /// Greeting appended to an empty conversation once documentation is available
    #[inline]
    pub fn welcome_message(&self) -> String {
        format!(
            "Hi! I'm {}. Ask me anything about integrating {}'s REST APIs.",
            self.assistant_name, self.product_name
        )
    }
}

impl Default for PromptBuilder {
    #[inline]
    fn default() -> Self {
        Self::from_config(&AssistantConfig::default())
    }
}
