//! `teamcity:index:Random`: a generated alphanumeric string.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tc_proto::{PropertyBag, PropertyValue, ResourceId};
use tracing::debug;

use crate::backend::{BackendError, ResourceRecord};
use crate::context::ProviderContext;
use crate::lifecycle::{CreateRequest, ResourceHandler, UpdateRequest};
use crate::schema::{PropertySpec, PropertyType, ResourceSchema};

/// Type token of the resource.
pub const RANDOM_TOKEN: &str = "teamcity:index:Random";

/// Upper bound on `length`.
pub const MAX_RANDOM_LENGTH: u32 = 65_536;

const LENGTH: &str = "length";
const RESULT: &str = "result";

/// Handler for [`RANDOM_TOKEN`].
///
/// Create is not idempotent: every call draws a fresh value and stores a new
/// backend record. `length` forces replacement, so updates only ever carry
/// unchanged inputs and keep the existing `result`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Random;

impl Random {
    fn generate(length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    fn requested_length(inputs: &PropertyBag) -> Result<usize, BackendError> {
        inputs
            .get(LENGTH)
            .and_then(PropertyValue::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                BackendError::Rejected("length must be a known non-negative integer".to_string())
            })
    }
}

#[async_trait]
impl ResourceHandler for Random {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(RANDOM_TOKEN)
            .describe(
                "A random alphanumeric string. Creating it is not idempotent: \
                 every create draws a new value.",
            )
            .idempotent(false)
            .input(
                PropertySpec::required(LENGTH, PropertyType::Integer)
                    .forces_replace()
                    .with_range(0.0, f64::from(MAX_RANDOM_LENGTH))
                    .describe("The number of characters to generate."),
            )
            .output(
                PropertySpec::required(LENGTH, PropertyType::Integer)
                    .describe("The requested length."),
            )
            .output(
                PropertySpec::required(RESULT, PropertyType::String)
                    .describe("The generated string."),
            )
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        request: CreateRequest<'_>,
    ) -> Result<(ResourceId, PropertyBag), BackendError> {
        let id = ResourceId::generate(request.urn.name());
        let mut outputs = request.inputs.clone();

        if request.preview {
            outputs.insert(RESULT, PropertyValue::Unknown);
            return Ok((id, outputs));
        }

        let length = Self::requested_length(request.inputs)?;
        outputs.insert(RESULT, Self::generate(length));

        let record =
            ResourceRecord::new(id.clone(), RANDOM_TOKEN, request.inputs.clone(), outputs.clone());
        ctx.backend().insert(record).await?;
        debug!(id = %id, length, "random value generated");

        Ok((id, outputs))
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        id: &ResourceId,
    ) -> Result<Option<PropertyBag>, BackendError> {
        Ok(ctx.backend().get(id).await?.map(|record| record.outputs))
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        request: UpdateRequest<'_>,
    ) -> Result<PropertyBag, BackendError> {
        if request.preview {
            let mut outputs = request.news.clone();
            let result = request.olds.get(RESULT).cloned().unwrap_or(PropertyValue::Unknown);
            outputs.insert(RESULT, result);
            return Ok(outputs);
        }

        let mut record = ctx
            .backend()
            .get(request.id)
            .await?
            .ok_or_else(|| BackendError::NotFound(request.id.clone()))?;

        if record.inputs.get(LENGTH) != request.news.get(LENGTH) {
            return Err(BackendError::Rejected(
                "changing length requires replacing the resource".to_string(),
            ));
        }

        let mut outputs = request.news.clone();
        let result = record.outputs.get(RESULT).cloned().unwrap_or(PropertyValue::Null);
        outputs.insert(RESULT, result);

        record.touch(request.news.clone(), outputs.clone());
        ctx.backend().replace(record).await?;
        Ok(outputs)
    }

    async fn delete(&self, ctx: &ProviderContext, id: &ResourceId) -> Result<(), BackendError> {
        ctx.backend().remove(id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::lifecycle::LifecycleExecutor;
    use std::sync::Arc;
    use tc_proto::Urn;

    fn executor() -> LifecycleExecutor {
        let mut executor = LifecycleExecutor::new();
        executor.register(Arc::new(Random));
        executor
    }

    fn urn() -> Urn {
        Urn::new("dev", "demo", RANDOM_TOKEN, "myRandomResource").expect("valid urn")
    }

    fn inputs(length: u32) -> PropertyBag {
        PropertyBag::new().with(LENGTH, length)
    }

    #[test]
    fn generated_values_use_alphanumeric_charset() {
        let value = Random::generate(256);
        assert_eq!(value.len(), 256);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn create_then_read_returns_same_outputs() {
        let ctx = ProviderContext::in_memory();
        let created = executor().create(&ctx, &urn(), &inputs(24), false).await.expect("create");

        let result = created.outputs.get(RESULT).and_then(PropertyValue::as_str).expect("result");
        assert_eq!(result.len(), 24);

        let read = executor().read(&ctx, &urn(), &created.id).await.expect("read");
        assert_eq!(read, created.outputs);
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let ctx = ProviderContext::in_memory();
        let exec = executor();
        let created = exec.create(&ctx, &urn(), &inputs(8), false).await.expect("create");
        exec.delete(&ctx, &urn(), &created.id).await.expect("delete");

        let err = exec.read(&ctx, &urn(), &created.id).await.expect_err("gone");
        assert!(matches!(err, ProviderError::NotFound { .. }));

        let err = exec.delete(&ctx, &urn(), &created.id).await.expect_err("gone");
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn preview_does_not_touch_backend() {
        let backend = Arc::new(crate::backend::MemoryBackend::new());
        let ctx = ProviderContext::new(backend.clone());
        let created = executor().create(&ctx, &urn(), &inputs(8), true).await.expect("preview");

        assert_eq!(created.outputs.get(RESULT), Some(&PropertyValue::Unknown));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn preview_with_unknown_length() {
        let ctx = ProviderContext::in_memory();
        let news = PropertyBag::new().with(LENGTH, PropertyValue::Unknown);
        let created = executor().create(&ctx, &urn(), &news, true).await.expect("preview");
        assert!(created.outputs.get(LENGTH).is_some_and(PropertyValue::is_unknown));
        assert!(created.outputs.get(RESULT).is_some_and(PropertyValue::is_unknown));
    }

    #[tokio::test]
    async fn create_rejects_invalid_length() {
        let ctx = ProviderContext::in_memory();
        let err = executor()
            .create(&ctx, &urn(), &inputs(MAX_RANDOM_LENGTH + 1), false)
            .await
            .expect_err("too long");
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn two_creates_produce_distinct_resources() {
        let ctx = ProviderContext::in_memory();
        let exec = executor();
        let a = exec.create(&ctx, &urn(), &inputs(32), false).await.expect("create");
        let b = exec.create(&ctx, &urn(), &inputs(32), false).await.expect("create");
        assert_ne!(a.id, b.id);
        assert_ne!(a.outputs.get(RESULT), b.outputs.get(RESULT));
    }

    #[tokio::test]
    async fn update_keeps_result() {
        let ctx = ProviderContext::in_memory();
        let exec = executor();
        let created = exec.create(&ctx, &urn(), &inputs(12), false).await.expect("create");

        let outputs = exec
            .update(&ctx, &urn(), &created.id, &created.outputs, &inputs(12), false)
            .await
            .expect("update");
        assert_eq!(outputs.get(RESULT), created.outputs.get(RESULT));
    }

    #[tokio::test]
    async fn update_refuses_length_change() {
        let ctx = ProviderContext::in_memory();
        let exec = executor();
        let created = exec.create(&ctx, &urn(), &inputs(12), false).await.expect("create");

        let err = exec
            .update(&ctx, &urn(), &created.id, &created.outputs, &inputs(13), false)
            .await
            .expect_err("replace required");
        match err {
            ProviderError::UpdateFailed { reason, .. } => assert!(reason.contains("replac")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn update_of_missing_resource_is_not_found() {
        let ctx = ProviderContext::in_memory();
        let id = ResourceId::new("missing-00000000").expect("valid id");
        let err = executor()
            .update(&ctx, &urn(), &id, &PropertyBag::new(), &inputs(4), false)
            .await
            .expect_err("missing");
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_type_is_schema_not_found() {
        let ctx = ProviderContext::in_memory();
        let other = Urn::new("dev", "demo", "teamcity:index:Nope", "x").expect("valid urn");
        let err = executor().create(&ctx, &other, &inputs(4), false).await.expect_err("unknown");
        assert!(matches!(err, ProviderError::SchemaNotFound { .. }));
    }

    #[tokio::test]
    async fn works_against_file_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = crate::backend::FileBackend::open(dir.path()).await.expect("open");
        let ctx = ProviderContext::new(Arc::new(backend));
        let exec = executor();

        let created = exec.create(&ctx, &urn(), &inputs(16), false).await.expect("create");
        let read = exec.read(&ctx, &urn(), &created.id).await.expect("read");
        assert_eq!(read, created.outputs);
    }
}
