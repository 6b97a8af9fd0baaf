use crate::{
    entities::{
        address, customer, order, Address, AddressModel, Customer, CustomerModel, MembershipType,
        Order,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::validate_email;

/// Customer service: customers and their single address.
///
/// The address row keys on the customer id, so a customer can never hold
/// more than one. Deleting a customer takes the address with it, but is
/// refused while the customer still has orders.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a customer. Membership defaults to Bronze when omitted.
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        if !validate_email(&input.email) {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not a valid email address",
                input.email
            )));
        }

        self.ensure_unique_email(&input.email, None).await?;

        let customer_id = Uuid::new_v4();
        let customer = customer::ActiveModel {
            id: Set(customer_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            birth_date: Set(input.birth_date),
            membership_type: Set(input.membership_type.unwrap_or_default()),
        };

        let customer = customer.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(customer_id))
            .await;

        info!("Created customer: {}", customer_id);
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        let customer = self.get_customer(customer_id).await?;
        let mut active: customer::ActiveModel = customer.into();

        if let Some(email) = input.email {
            if !validate_email(&email) {
                return Err(ServiceError::ValidationError(format!(
                    "'{}' is not a valid email address",
                    email
                )));
            }
            self.ensure_unique_email(&email, Some(customer_id)).await?;
            active.email = Set(email);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(birth_date);
        }
        if let Some(membership_type) = input.membership_type {
            active.membership_type = Set(membership_type);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerUpdated(customer_id))
            .await;

        Ok(updated)
    }

    /// Deletes a customer and their address atomically.
    ///
    /// Refused while the customer has orders; in that case nothing is
    /// removed.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let customer = Customer::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let order_count = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .count(&txn)
            .await?;

        if order_count > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Customer {} has {} order(s)",
                customer_id, order_count
            )));
        }

        Address::delete_many()
            .filter(address::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        customer.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CustomerDeleted(customer_id))
            .await;

        info!("Deleted customer: {}", customer_id);
        Ok(())
    }

    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    pub async fn get_customer_by_email(&self, email: &str) -> Result<CustomerModel, ServiceError> {
        Customer::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer '{}' not found", email)))
    }

    pub async fn list_customers(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Ok(Customer::find()
            .order_by_asc(customer::Column::LastName)
            .order_by_asc(customer::Column::FirstName)
            .all(&*self.db)
            .await?)
    }

    /// Creates or replaces the customer's address.
    #[instrument(skip(self))]
    pub async fn upsert_address(
        &self,
        customer_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        self.get_customer(customer_id).await.map_err(|_| {
            ServiceError::ValidationError(format!("Customer {} does not exist", customer_id))
        })?;

        let existing = Address::find_by_id(customer_id).one(&*self.db).await?;

        let address = match existing {
            Some(existing) => {
                let mut active: address::ActiveModel = existing.into();
                active.street = Set(input.street);
                active.city = Set(input.city);
                active.zip_code = Set(input.zip_code);
                active.update(&*self.db).await?
            }
            None => {
                let active = address::ActiveModel {
                    customer_id: Set(customer_id),
                    street: Set(input.street),
                    city: Set(input.city),
                    zip_code: Set(input.zip_code),
                };
                active.insert(&*self.db).await?
            }
        };

        self.event_sender
            .send_or_log(Event::AddressUpserted(customer_id))
            .await;

        Ok(address)
    }

    pub async fn get_address(&self, customer_id: Uuid) -> Result<AddressModel, ServiceError> {
        Address::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} has no address", customer_id))
            })
    }

    async fn ensure_unique_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Customer::find().filter(customer::Column::Email.eq(email));
        if let Some(customer_id) = exclude {
            query = query.filter(customer::Column::Id.ne(customer_id));
        }

        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Email '{}' is already in use",
                email
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    /// Defaults to Bronze when omitted.
    pub membership_type: Option<MembershipType>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCustomerInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub membership_type: Option<MembershipType>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub zip_code: Option<String>,
}
