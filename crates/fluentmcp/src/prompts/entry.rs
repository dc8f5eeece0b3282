//! A registered prompt: name, ordered arguments, and async handler.

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, HandlerResult, PromptArguments};
use crate::types::{PromptArgument, PromptDefinition};

use super::output::PromptOutput;

type PromptFn = Arc<dyn Fn(PromptArguments) -> BoxFuture<HandlerResult<PromptOutput>> + Send + Sync>;

#[derive(Clone)]
pub struct PromptEntry {
    name: String,
    description: Option<String>,
    arguments: Vec<PromptArgument>,
    handler: PromptFn,
}

impl PromptEntry {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(PromptArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<PromptOutput>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            handler: Arc::new(
                move |args: PromptArguments| -> BoxFuture<HandlerResult<PromptOutput>> {
                    Box::pin(handler(args))
                },
            ),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an argument. Arguments are listed in the order added.
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn arguments(&self) -> &[PromptArgument] {
        &self.arguments
    }

    /// Names of required arguments absent from `args`.
    pub fn missing_arguments(&self, args: &PromptArguments) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|a| a.required && !args.contains_key(&a.name))
            .map(|a| a.name.clone())
            .collect()
    }

    /// Metadata exposed by `prompts/list`.
    pub fn definition(&self) -> PromptDefinition {
        PromptDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: (!self.arguments.is_empty()).then(|| self.arguments.clone()),
        }
    }

    pub fn invoke(&self, args: PromptArguments) -> BoxFuture<HandlerResult<PromptOutput>> {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for PromptEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
