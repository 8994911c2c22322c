//! Prompt template filled with retrieved context and the user's question.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Placeholder replaced by the assembled context.
pub const CONTEXT_SLOT: &str = "{context}";
/// Placeholder replaced by the user's question.
pub const INPUT_SLOT: &str = "{input}";

/// Column labels of the transaction tables extracted from statements.
pub const TRANSACTION_COLUMNS: &str =
    "Date,Transaction Description,Debit,Credit,Balance,Category 1,Category 2,Category 3,DR/CR";

const DEFAULT_TEMPLATE: &str = "\
You are a helpful financial well-being and open banking website application assistant. \
Use the provided context to answer the user's question.
Read the given context carefully and think step by step before answering. If you cannot \
answer the question from the provided context, tell the user so. Do not use any other \
information to answer. Provide a detailed answer, and never reveal or quote the source \
document you are using, because you are the assistant for Dolfin's website.
To help guide you in the dataset, the column labels are:
Date,Transaction Description,Debit,Credit,Balance,Category 1,Category 2,Category 3,DR/CR
<context>
{context}
</context>

Question: {input}
";

/// A prompt with `{context}` and `{input}` slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Use a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless both `{context}` and `{input}` appear.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, INPUT_SLOT] {
            if !template.contains(slot) {
                return Err(RagError::ConfigError(format!("prompt template is missing {slot}")));
            }
        }
        Ok(Self { template })
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill both slots. Slot markers inside `context` are not re-expanded.
    pub fn render(&self, context: &str, question: &str) -> String {
        match self.template.split_once(CONTEXT_SLOT) {
            Some((before, after)) => format!(
                "{}{context}{}",
                before.replace(INPUT_SLOT, question),
                after.replace(INPUT_SLOT, question)
            ),
            None => self.template.replace(INPUT_SLOT, question),
        }
    }
}
