//! A registered resource: URI, metadata, and async reader.

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, HandlerResult};
use crate::types::ResourceDefinition;

use super::output::ResourceOutput;

type ResourceFn = Arc<dyn Fn() -> BoxFuture<HandlerResult<ResourceOutput>> + Send + Sync>;

#[derive(Clone)]
pub struct ResourceEntry {
    uri: String,
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
    handler: ResourceFn,
}

impl ResourceEntry {
    pub fn new<F, Fut>(uri: impl Into<String>, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ResourceOutput>> + Send + 'static,
    {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: None,
            handler: Arc::new(move || -> BoxFuture<HandlerResult<ResourceOutput>> {
                Box::pin(handler())
            }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Metadata exposed by `resources/list`.
    pub fn definition(&self) -> ResourceDefinition {
        ResourceDefinition {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    pub fn invoke(&self) -> BoxFuture<HandlerResult<ResourceOutput>> {
        (self.handler)()
    }
}

impl std::fmt::Debug for ResourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceEntry")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}
