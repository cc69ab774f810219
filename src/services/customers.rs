use sea_orm::{EntityTrait, QueryOrder};
use std::sync::Arc;
use tracing::instrument;

use crate::{db::DbPool, entities::customer, errors::ServiceError};

/// Read-side of the customer directory. The lifecycle manager resolves
/// customers here for denormalization and ownership checks; account
/// management itself lives in another system.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Resolves a customer by id.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i64) -> Result<Option<customer::Model>, ServiceError> {
        let found = customer::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    /// Lists every customer, newest first. Used by the admin console when
    /// linking a shipment to an account.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<customer::Model>, ServiceError> {
        let customers = customer::Entity::find()
            .order_by_desc(customer::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(customers)
    }
}
