//! Lifecycle executor.
//!
//! Dispatches create/read/update/delete to the [`ResourceHandler`]
//! registered for a type token, races each call against the context's
//! cancellation token and maps backend failures to [`ProviderError`].
//! Nothing is retried here: every call mutates the backend at most once and
//! retry decisions belong to the orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tc_proto::{PropertyBag, PropertyValue, ResourceId, Urn};
use tracing::{debug, info, warn};

use crate::backend::BackendError;
use crate::context::ProviderContext;
use crate::error::{ProviderError, ProviderResult};
use crate::schema::ResourceSchema;

/// Inputs to a create.
#[derive(Debug, Clone, Copy)]
pub struct CreateRequest<'a> {
    /// Resource being created.
    pub urn: &'a Urn,
    /// Checked inputs.
    pub inputs: &'a PropertyBag,
    /// Plan only: compute what can be known without touching the backend.
    pub preview: bool,
}

/// Inputs to an update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest<'a> {
    /// Resource being updated.
    pub urn: &'a Urn,
    /// Backend id.
    pub id: &'a ResourceId,
    /// Last-known outputs.
    pub olds: &'a PropertyBag,
    /// Checked new inputs.
    pub news: &'a PropertyBag,
    /// Plan only.
    pub preview: bool,
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    /// Backend id.
    pub id: ResourceId,
    /// Outputs, with every declared output present.
    pub outputs: PropertyBag,
}

/// Behaviour of one resource type.
///
/// Implementations talk to the backend through the context only and must not
/// keep resource state of their own.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Schema of the resource type.
    fn schema(&self) -> ResourceSchema;

    /// Creates the resource.
    async fn create(
        &self,
        ctx: &ProviderContext,
        request: CreateRequest<'_>,
    ) -> Result<(ResourceId, PropertyBag), BackendError>;

    /// Reads current outputs, `None` if the resource is gone.
    async fn read(
        &self,
        ctx: &ProviderContext,
        id: &ResourceId,
    ) -> Result<Option<PropertyBag>, BackendError>;

    /// Applies an in-place update.
    async fn update(
        &self,
        ctx: &ProviderContext,
        request: UpdateRequest<'_>,
    ) -> Result<PropertyBag, BackendError>;

    /// Deletes the resource.
    async fn delete(&self, ctx: &ProviderContext, id: &ResourceId) -> Result<(), BackendError>;
}

/// Dispatches lifecycle calls to registered handlers.
#[derive(Default, Clone)]
pub struct LifecycleExecutor {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl std::fmt::Debug for LifecycleExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tokens: Vec<&String> = self.handlers.keys().collect();
        tokens.sort();
        f.debug_struct("LifecycleExecutor")
            .field("handlers", &tokens)
            .finish()
    }
}

impl LifecycleExecutor {
    /// Creates an executor with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its schema's token.
    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) {
        let token = handler.schema().token;
        self.handlers.insert(token, handler);
    }

    fn handler(&self, urn: &Urn) -> ProviderResult<(&Arc<dyn ResourceHandler>, ResourceSchema)> {
        let handler = self
            .handlers
            .get(urn.type_token())
            .ok_or_else(|| ProviderError::SchemaNotFound {
                type_token: urn.type_token().to_string(),
            })?;
        Ok((handler, handler.schema()))
    }

    fn validate(schema: &ResourceSchema, inputs: &PropertyBag) -> ProviderResult<PropertyBag> {
        let (checked, failures) = schema.check(inputs);
        if failures.is_valid() {
            Ok(checked)
        } else {
            Err(ProviderError::Validation(failures))
        }
    }

    /// Creates a resource.
    ///
    /// In preview the backend is not touched and computed outputs are
    /// unknown.
    pub async fn create(
        &self,
        ctx: &ProviderContext,
        urn: &Urn,
        inputs: &PropertyBag,
        preview: bool,
    ) -> ProviderResult<Created> {
        let (handler, schema) = self.handler(urn)?;
        let inputs = Self::validate(&schema, inputs)?;
        debug!(urn = %urn, inputs = %inputs, preview, "creating resource");

        let request = CreateRequest {
            urn,
            inputs: &inputs,
            preview,
        };
        let (id, mut outputs) = ctx
            .guard("create", handler.create(ctx, request))
            .await?
            .map_err(|e| {
                warn!(urn = %urn, error = %e, "create failed");
                ProviderError::CreateFailed {
                    urn: urn.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let fill = if preview { PropertyValue::Unknown } else { PropertyValue::Null };
        schema.complete_outputs(&mut outputs, &fill);

        if !preview {
            info!(urn = %urn, id = %id, backend = ctx.backend().name(), "resource created");
        }
        Ok(Created { id, outputs })
    }

    /// Reads a resource's current outputs.
    pub async fn read(
        &self,
        ctx: &ProviderContext,
        urn: &Urn,
        id: &ResourceId,
    ) -> ProviderResult<PropertyBag> {
        let (handler, schema) = self.handler(urn)?;
        let mut outputs = ctx
            .guard("read", handler.read(ctx, id))
            .await?
            .map_err(|e| match e {
                BackendError::NotFound(id) => ProviderError::NotFound { id },
                other => ProviderError::ReadFailed {
                    id: id.clone(),
                    reason: other.to_string(),
                },
            })?
            .ok_or_else(|| ProviderError::NotFound { id: id.clone() })?;

        schema.complete_outputs(&mut outputs, &PropertyValue::Null);
        debug!(urn = %urn, id = %id, "resource read");
        Ok(outputs)
    }

    /// Updates a resource in place.
    pub async fn update(
        &self,
        ctx: &ProviderContext,
        urn: &Urn,
        id: &ResourceId,
        olds: &PropertyBag,
        news: &PropertyBag,
        preview: bool,
    ) -> ProviderResult<PropertyBag> {
        let (handler, schema) = self.handler(urn)?;
        let news = Self::validate(&schema, news)?;
        debug!(urn = %urn, id = %id, news = %news, preview, "updating resource");

        let request = UpdateRequest {
            urn,
            id,
            olds,
            news: &news,
            preview,
        };
        let mut outputs = ctx
            .guard("update", handler.update(ctx, request))
            .await?
            .map_err(|e| match e {
                BackendError::NotFound(id) => ProviderError::NotFound { id },
                other => {
                    warn!(urn = %urn, id = %id, error = %other, "update failed");
                    ProviderError::UpdateFailed {
                        id: id.clone(),
                        reason: other.to_string(),
                    }
                }
            })?;

        let fill = if preview { PropertyValue::Unknown } else { PropertyValue::Null };
        schema.complete_outputs(&mut outputs, &fill);

        if !preview {
            info!(urn = %urn, id = %id, "resource updated");
        }
        Ok(outputs)
    }

    /// Deletes a resource.
    pub async fn delete(
        &self,
        ctx: &ProviderContext,
        urn: &Urn,
        id: &ResourceId,
    ) -> ProviderResult<()> {
        let (handler, _) = self.handler(urn)?;
        ctx.guard("delete", handler.delete(ctx, id))
            .await?
            .map_err(|e| match e {
                BackendError::NotFound(id) => ProviderError::NotFound { id },
                other => {
                    warn!(urn = %urn, id = %id, error = %other, "delete failed");
                    ProviderError::DeleteFailed {
                        id: id.clone(),
                        reason: other.to_string(),
                    }
                }
            })?;

        info!(urn = %urn, id = %id, "resource deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertySpec, PropertyType};
    use std::time::Duration;

    const SLOW: &str = "test:index:Slow";
    const BROKEN: &str = "test:index:Broken";

    #[derive(Debug)]
    struct Slow;

    #[async_trait]
    impl ResourceHandler for Slow {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new(SLOW).output(PropertySpec::required("done", PropertyType::Boolean))
        }

        async fn create(
            &self,
            _ctx: &ProviderContext,
            request: CreateRequest<'_>,
        ) -> Result<(ResourceId, PropertyBag), BackendError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok((ResourceId::generate(request.urn.name()), PropertyBag::new()))
        }

        async fn read(
            &self,
            _ctx: &ProviderContext,
            _id: &ResourceId,
        ) -> Result<Option<PropertyBag>, BackendError> {
            Ok(Some(PropertyBag::new()))
        }

        async fn update(
            &self,
            _ctx: &ProviderContext,
            request: UpdateRequest<'_>,
        ) -> Result<PropertyBag, BackendError> {
            Ok(request.news.clone())
        }

        async fn delete(
            &self,
            _ctx: &ProviderContext,
            _id: &ResourceId,
        ) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[async_trait]
    impl ResourceHandler for Broken {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new(BROKEN)
        }

        async fn create(
            &self,
            _ctx: &ProviderContext,
            _request: CreateRequest<'_>,
        ) -> Result<(ResourceId, PropertyBag), BackendError> {
            Err(BackendError::Rejected("quota exceeded for project demo".to_string()))
        }

        async fn read(
            &self,
            _ctx: &ProviderContext,
            _id: &ResourceId,
        ) -> Result<Option<PropertyBag>, BackendError> {
            Err(BackendError::Rejected("backend offline".to_string()))
        }

        async fn update(
            &self,
            _ctx: &ProviderContext,
            _request: UpdateRequest<'_>,
        ) -> Result<PropertyBag, BackendError> {
            Err(BackendError::Rejected("read only".to_string()))
        }

        async fn delete(
            &self,
            _ctx: &ProviderContext,
            _id: &ResourceId,
        ) -> Result<(), BackendError> {
            Err(BackendError::Rejected("locked".to_string()))
        }
    }

    fn executor() -> LifecycleExecutor {
        let mut executor = LifecycleExecutor::new();
        executor.register(Arc::new(Slow));
        executor.register(Arc::new(Broken));
        executor
    }

    fn urn(token: &str) -> Urn {
        Urn::new("dev", "demo", token, "thing").expect("valid urn")
    }

    fn id() -> ResourceId {
        ResourceId::new("thing-0000abcd").expect("valid id")
    }

    #[tokio::test]
    async fn cancelled_create_returns_cancelled() {
        let ctx = ProviderContext::in_memory();
        let token = ctx.cancel_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = executor()
            .create(&ctx, &urn(SLOW), &PropertyBag::new(), false)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, ProviderError::Cancelled { operation: "create" }));
    }

    #[tokio::test]
    async fn backend_reasons_are_verbatim() {
        let ctx = ProviderContext::in_memory();
        let exec = executor();

        let err = exec
            .create(&ctx, &urn(BROKEN), &PropertyBag::new(), false)
            .await
            .expect_err("fails");
        match err {
            ProviderError::CreateFailed { reason, .. } => {
                assert_eq!(reason, "quota exceeded for project demo");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = exec.read(&ctx, &urn(BROKEN), &id()).await.expect_err("fails");
        assert_eq!(err.kind(), "read_failed");

        let err = exec
            .update(&ctx, &urn(BROKEN), &id(), &PropertyBag::new(), &PropertyBag::new(), false)
            .await
            .expect_err("fails");
        assert_eq!(err.kind(), "update_failed");

        let err = exec.delete(&ctx, &urn(BROKEN), &id()).await.expect_err("fails");
        match err {
            ProviderError::DeleteFailed { reason, .. } => assert_eq!(reason, "locked"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn read_completes_declared_outputs_with_null() {
        let ctx = ProviderContext::in_memory();
        let outputs = executor().read(&ctx, &urn(SLOW), &id()).await.expect("read");
        assert_eq!(outputs.get("done"), Some(&PropertyValue::Null));
    }

    #[tokio::test]
    async fn preview_update_completes_outputs_with_unknown() {
        let ctx = ProviderContext::in_memory();
        let outputs = executor()
            .update(&ctx, &urn(SLOW), &id(), &PropertyBag::new(), &PropertyBag::new(), true)
            .await
            .expect("update");
        assert_eq!(outputs.get("done"), Some(&PropertyValue::Unknown));
    }

    #[tokio::test]
    async fn unregistered_type_is_schema_not_found() {
        let ctx = ProviderContext::in_memory();
        let err = executor()
            .delete(&ctx, &urn("test:index:Missing"), &id())
            .await
            .expect_err("unknown");
        assert_eq!(err.kind(), "schema_not_found");
    }

    #[test]
    fn debug_lists_registered_tokens() {
        let rendered = format!("{:?}", executor());
        assert!(rendered.contains(SLOW));
        assert!(rendered.contains(BROKEN));
    }
}
