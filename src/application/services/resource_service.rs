//! The validated CRUD pipeline shared by every resource.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::domain::access::{Actor, Authorizer, Operation, Owned, Principal};
use crate::domain::query::ListQuery;
use crate::domain::repositories::ResourceRepository;
use crate::domain::resource::{Resource, WriteMode};
use crate::domain::validation::{FieldErrors, ValidationContext, decode_payload};
use crate::error::AppError;

/// Serves list/retrieve/create/update/delete for one resource type.
///
/// Each operation runs, in order: the authorization policy without a target,
/// the lookup (detail operations), the policy again with the loaded record,
/// validation (writes) and finally persistence. A failing step
/// short-circuits everything after it.
pub struct ResourceService<R: Resource> {
    repository: Arc<dyn ResourceRepository<R>>,
    authorizer: Arc<dyn Authorizer>,
}

impl<R: Resource> ResourceService<R> {
    pub fn new(
        repository: Arc<dyn ResourceRepository<R>>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            repository,
            authorizer,
        }
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] or [`AppError::Forbidden`] if the
    /// policy denies listing.
    pub async fn list(&self, actor: &Actor, query: &ListQuery) -> Result<Vec<R::Entity>, AppError> {
        self.authorize(actor, Operation::List, None)?;
        let items = self.repository.list(query).await?;
        record(Operation::List);
        Ok(items)
    }

    /// Lists records for raw query-string parameters.
    ///
    /// The policy is consulted before the parameters are parsed.
    ///
    /// # Errors
    ///
    /// Returns an authorization error if the policy denies listing and
    /// [`AppError::Validation`] for malformed pagination parameters.
    pub async fn list_params(
        &self,
        actor: &Actor,
        params: &HashMap<String, String>,
    ) -> Result<Vec<R::Entity>, AppError> {
        self.authorize(actor, Operation::List, None)?;
        let query = ListQuery::from_params(R::schema(), params)?;
        self.list(actor, &query).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this id, or an
    /// authorization error if the policy denies reading.
    pub async fn retrieve(&self, actor: &Actor, id: i64) -> Result<R::Entity, AppError> {
        let entity = self.load_authorized(actor, Operation::Retrieve, id).await?;
        record(Operation::Retrieve);
        Ok(entity)
    }

    /// Validates the payload and stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] with every field error if the payload
    /// is invalid; nothing is stored in that case.
    pub async fn create(&self, actor: &Actor, input: R::Input) -> Result<R::Entity, AppError> {
        self.authorize(actor, Operation::Create, None)?;
        let principal = actor.require_authenticated()?;

        let draft = self.validate(&input, WriteMode::Create, principal).await?;
        let entity = self.repository.insert(draft).await?;

        tracing::info!(
            resource = R::KIND.as_str(),
            id = R::id(&entity),
            user_id = principal.id,
            "Record created"
        );
        record(Operation::Create);
        Ok(entity)
    }

    /// Creates a record from a raw JSON body.
    ///
    /// The policy runs before the body is decoded, so a caller that may not
    /// create never learns anything about its payload.
    ///
    /// # Errors
    ///
    /// Returns an authorization error first, then [`AppError::Validation`]
    /// for a body that is malformed, badly typed or invalid.
    pub async fn create_json(&self, actor: &Actor, body: &[u8]) -> Result<R::Entity, AppError> {
        self.authorize(actor, Operation::Create, None)?;
        let input = decode_payload::<R::Input>(body)?;
        self.create(actor, input).await
    }

    /// Updates a record from a raw JSON body. With `partial` only the
    /// supplied fields are validated and merged; otherwise every writable
    /// field is required.
    ///
    /// Both policy checks, including the one against the stored record, run
    /// before the body is decoded.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or [`AppError::NotFound`] first, then
    /// [`AppError::Validation`] for a bad body or an invalid candidate.
    pub async fn update_json(
        &self,
        actor: &Actor,
        id: i64,
        body: &[u8],
        partial: bool,
    ) -> Result<R::Entity, AppError> {
        let operation = update_operation(partial);
        let existing = self.load_authorized(actor, operation, id).await?;
        let input = decode_payload::<R::Input>(body)?;
        self.apply_update(actor, existing, input, partial).await
    }

    async fn apply_update(
        &self,
        actor: &Actor,
        existing: R::Entity,
        input: R::Input,
        partial: bool,
    ) -> Result<R::Entity, AppError> {
        let principal = actor.require_authenticated()?;
        let id = R::id(&existing);

        let mode = if partial {
            WriteMode::Patch(&existing)
        } else {
            WriteMode::Replace(&existing)
        };
        let draft = self.validate(&input, mode, principal).await?;

        let entity = self
            .repository
            .replace(id, draft)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;

        tracing::info!(
            resource = R::KIND.as_str(),
            id,
            partial,
            user_id = principal.id,
            "Record updated"
        );
        record(update_operation(partial));
        Ok(entity)
    }

    /// Deletes a record and its cascade dependents.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist, including
    /// when it was already deleted.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<(), AppError> {
        self.load_authorized(actor, Operation::Delete, id).await?;

        if !self.repository.delete(id).await? {
            return Err(not_found::<R>(id));
        }

        tracing::info!(
            resource = R::KIND.as_str(),
            id,
            user_id = actor.id(),
            "Record deleted"
        );
        record(Operation::Delete);
        Ok(())
    }

    /// Runs the policy, loads the record, then runs the policy against it.
    async fn load_authorized(
        &self,
        actor: &Actor,
        operation: Operation,
        id: i64,
    ) -> Result<R::Entity, AppError> {
        self.authorize(actor, operation, None)?;
        let entity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;
        self.authorize(actor, operation, Some(&entity))?;
        Ok(entity)
    }

    fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        target: Option<&R::Entity>,
    ) -> Result<(), AppError> {
        let target = target.map(|e| e as &dyn Owned);
        self.authorizer
            .authorize(actor, operation, target)
            .inspect_err(|e| {
                tracing::debug!(
                    resource = R::KIND.as_str(),
                    operation = operation.as_str(),
                    policy = self.authorizer.name(),
                    user_id = actor.id(),
                    error = %e,
                    "Access denied"
                );
                metrics::counter!(
                    "resource_denials_total",
                    "resource" => R::KIND.as_str(),
                    "operation" => operation.as_str()
                )
                .increment(1);
            })
    }

    /// Runs every field rule, then checks foreign keys of fields that passed.
    async fn validate(
        &self,
        input: &R::Input,
        mode: WriteMode<'_, R::Entity>,
        principal: &Principal,
    ) -> Result<R::Draft, AppError> {
        let ctx = ValidationContext::now();
        let mut errors = FieldErrors::new();

        let draft = R::build_draft(input, mode, principal, &ctx, &mut errors);

        if let Err(report) = input.validate() {
            let mut later = FieldErrors::new();
            later.merge_validator(&report);
            errors.absorb_first(later);
        }

        if let Some(draft) = &draft {
            for reference in R::references(draft) {
                if errors.contains(reference.field) {
                    continue;
                }
                if !self.repository.reference_exists(&reference).await? {
                    errors.add(reference.field, reference.missing_message());
                }
            }
        }

        match draft {
            Some(draft) if errors.is_empty() => Ok(draft),
            _ => {
                tracing::debug!(
                    resource = R::KIND.as_str(),
                    fields = ?errors.fields().collect::<Vec<_>>(),
                    "Validation failed"
                );
                Err(AppError::validation(errors))
            }
        }
    }
}

fn not_found<R: Resource>(id: i64) -> AppError {
    AppError::not_found(
        "Not found.",
        json!({ "resource": R::KIND.as_str(), "id": id }),
    )
}

fn update_operation(partial: bool) -> Operation {
    if partial {
        Operation::PartialUpdate
    } else {
        Operation::Update
    }
}

fn record(operation: Operation) {
    metrics::counter!("resource_operations_total", "operation" => operation.as_str()).increment(1);
}
