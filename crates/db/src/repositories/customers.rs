//! Read-only access to the customer directory.
//!
//! Customer records are owned by the administration side of the product;
//! this subsystem only reads the fields that drive scheduling and accrual
//! generation.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::customers;
use mizan_core::obligation::{CompanyType, LedgerType, TaxpayerProfile};

/// Read-only customer directory queries.
pub struct CustomerDirectory;

impl CustomerDirectory {
    /// Finds a customer by id.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(customer_id).one(conn).await
    }

    /// Lists active, fee-bearing customers in a stable order.
    ///
    /// Customers without a subscription fee never accrue and are excluded
    /// from the bulk generation sweep up front.
    pub async fn list_active_fee_bearing<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Vec<customers::Model>, DbErr> {
        customers::Entity::find()
            .filter(customers::Column::IsActive.eq(true))
            .filter(customers::Column::SubscriptionFee.is_not_null())
            .order_by_asc(customers::Column::Name)
            .all(conn)
            .await
    }

    /// Builds the taxpayer profile from the stored customer fields.
    ///
    /// Returns `None` when the stored tokens are not valid profile values;
    /// callers report that as a configuration problem, not a crash.
    #[must_use]
    pub fn profile_of(customer: &customers::Model) -> Option<TaxpayerProfile> {
        Some(TaxpayerProfile {
            company_type: CompanyType::parse(&customer.company_type)?,
            ledger_type: LedgerType::parse(&customer.ledger_type)?,
            has_employees: customer.has_employees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(company_type: &str, ledger_type: &str) -> customers::Model {
        customers::Model {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            company_type: company_type.to_string(),
            ledger_type: ledger_type.to_string(),
            has_employees: true,
            is_active: true,
            subscription_fee: Some("2.500,00".to_string()),
            established_on: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_profile_of_parses_stored_tokens() {
        let profile = CustomerDirectory::profile_of(&customer("CAPITAL", "BALANCE")).unwrap();
        assert_eq!(profile.company_type, CompanyType::Capital);
        assert_eq!(profile.ledger_type, LedgerType::Balance);
        assert!(profile.has_employees);

        // Tokens are parsed case-insensitively
        assert!(CustomerDirectory::profile_of(&customer("personal", "operating")).is_some());
    }

    #[test]
    fn test_profile_of_rejects_unknown_tokens() {
        assert!(CustomerDirectory::profile_of(&customer("LLC", "BALANCE")).is_none());
        assert!(CustomerDirectory::profile_of(&customer("CAPITAL", "NONE")).is_none());
    }
}
