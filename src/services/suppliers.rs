use crate::{
    db::DbPool,
    entities::supplier::{self, ActiveModel as SupplierActiveModel, Entity as SupplierEntity, Model as SupplierModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the supplier service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required and must be at most 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Contact person is required"))]
    pub contact_person: String,
    #[validate(email(message = "Email must be well-formed"))]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "Phone is required and must be at most 20 characters"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Contact person must be at most 100 characters"))]
    pub contact_person: Option<String>,
    #[validate(email(message = "Email must be well-formed"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplierListResponse {
    pub suppliers: Vec<SupplierResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SupplierService {
    /// Creates a new supplier service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new supplier in the database
    #[instrument(skip(self, request), fields(supplier_name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let supplier_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for supplier creation");
            ServiceError::DatabaseError(e)
        })?;

        let supplier_active_model = SupplierActiveModel {
            id: Set(supplier_id),
            name: Set(request.name.clone()),
            contact_person: Set(request.contact_person),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            ..Default::default()
        };

        let supplier_model = supplier_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, supplier_id = %supplier_id, "Failed to create supplier in database");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, supplier_id = %supplier_id, "Failed to commit supplier creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_id = %supplier_id, name = %request.name, "Supplier created successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::SupplierCreated(supplier_id)).await {
                warn!(error = %e, supplier_id = %supplier_id, "Failed to send supplier created event");
            }
        }

        Ok(model_to_response(supplier_model))
    }

    /// Retrieves a supplier by ID
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn get_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<SupplierResponse>, ServiceError> {
        let db = &*self.db_pool;

        let supplier = SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, supplier_id = %supplier_id, "Failed to fetch supplier from database");
                ServiceError::DatabaseError(e)
            })?;

        Ok(supplier.map(model_to_response))
    }

    /// Lists suppliers with pagination and optional name/contact/email search
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<SupplierListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = SupplierEntity::find();
        if let Some(term) = search.as_deref().filter(|term| !term.trim().is_empty()) {
            let term = term.trim();
            query = query.filter(
                Condition::any()
                    .add(supplier::Column::Name.contains(term))
                    .add(supplier::Column::ContactPerson.contains(term))
                    .add(supplier::Column::Email.contains(term)),
            );
        }

        let paginator = query
            .order_by_asc(supplier::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count suppliers");
            ServiceError::DatabaseError(e)
        })?;

        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch suppliers page");
            ServiceError::DatabaseError(e)
        })?;

        let supplier_responses: Vec<SupplierResponse> =
            suppliers.into_iter().map(model_to_response).collect();

        info!(
            total = total,
            page = page,
            per_page = per_page,
            returned_count = supplier_responses.len(),
            "Suppliers listed successfully"
        );

        Ok(SupplierListResponse {
            suppliers: supplier_responses,
            total,
            page,
            per_page,
        })
    }

    /// Updates a supplier's contact details
    #[instrument(skip(self, request), fields(supplier_id = %supplier_id))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        request: UpdateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let supplier = SupplierEntity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, supplier_id = %supplier_id, "Failed to find supplier for update");
                ServiceError::DatabaseError(e)
            })?;

        let supplier = supplier.ok_or_else(|| {
            warn!(supplier_id = %supplier_id, "Supplier not found for update");
            ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
        })?;

        let mut supplier_active_model: SupplierActiveModel = supplier.into();
        if let Some(name) = request.name {
            supplier_active_model.name = Set(name);
        }
        if let Some(contact_person) = request.contact_person {
            supplier_active_model.contact_person = Set(contact_person);
        }
        if let Some(email) = request.email {
            supplier_active_model.email = Set(email);
        }
        if let Some(phone) = request.phone {
            supplier_active_model.phone = Set(phone);
        }
        if let Some(address) = request.address {
            supplier_active_model.address = Set(address);
        }

        let updated_supplier = supplier_active_model.update(db).await.map_err(|e| {
            error!(error = %e, supplier_id = %supplier_id, "Failed to update supplier");
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_id = %supplier_id, "Supplier updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::SupplierUpdated(supplier_id)).await {
                warn!(error = %e, supplier_id = %supplier_id, "Failed to send supplier updated event");
            }
        }

        Ok(model_to_response(updated_supplier))
    }

    /// Deletes a supplier
    ///
    /// Items referencing the supplier survive: the database clears their
    /// `supplier_id` through the SET NULL foreign key action.
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = SupplierEntity::delete_by_id(supplier_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, supplier_id = %supplier_id, "Failed to delete supplier");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            warn!(supplier_id = %supplier_id, "Supplier not found for deletion");
            return Err(ServiceError::NotFound(format!(
                "Supplier {} not found",
                supplier_id
            )));
        }

        info!(supplier_id = %supplier_id, "Supplier deleted successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::SupplierDeleted(supplier_id)).await {
                warn!(error = %e, supplier_id = %supplier_id, "Failed to send supplier deleted event");
            }
        }

        Ok(())
    }
}

/// Converts a supplier model to response format
pub(crate) fn model_to_response(model: SupplierModel) -> SupplierResponse {
    SupplierResponse {
        id: model.id,
        name: model.name,
        contact_person: model.contact_person,
        email: model.email,
        phone: model.phone,
        address: model.address,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_to_response_maps_all_fields() {
        let now = Utc::now();
        let supplier_id = Uuid::new_v4();

        let model = SupplierModel {
            id: supplier_id,
            name: "Acme Corp".to_string(),
            contact_person: "Jo Smith".to_string(),
            email: "jo@acme.example".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Industrial Way".to_string(),
            created_at: now,
            updated_at: now,
        };

        let response = model_to_response(model);

        assert_eq!(response.id, supplier_id);
        assert_eq!(response.name, "Acme Corp");
        assert_eq!(response.contact_person, "Jo Smith");
        assert_eq!(response.email, "jo@acme.example");
    }

    #[test]
    fn create_request_rejects_malformed_email() {
        let request = CreateSupplierRequest {
            name: "Acme Corp".to_string(),
            contact_person: "Jo Smith".to_string(),
            email: "not-an-email".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Industrial Way".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn update_request_allows_partial_payloads() {
        let request = UpdateSupplierRequest {
            name: Some("Acme Corp".to_string()),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
        };

        assert!(request.validate().is_ok());
    }
}
