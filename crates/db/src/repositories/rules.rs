//! Obligation rule config store.
//!
//! Global rule defaults keyed by obligation type, per-customer override sets
//! with a replace-all write contract, and effective-rule resolution (resolver
//! output, overlaid with the stored global rule and the customer override).

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{customer_obligation_overrides, obligation_rules};
use mizan_core::obligation::{
    Frequency, ObligationRule, Quarters, RuleOverride, TaxpayerProfile, merge, resolve,
};
use mizan_shared::AppError;

/// Error types for rule config operations.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A rule for this obligation type already exists.
    #[error("Obligation rule already exists: {0}")]
    DuplicateType(String),

    /// No rule stored for this obligation type.
    #[error("Obligation rule not found: {0}")]
    RuleNotFound(String),

    /// A field value cannot be stored (out of range for the column).
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },

    /// A stored row no longer parses into a valid rule.
    #[error("Stored rule {obligation_type} is corrupt: {detail}")]
    Corrupt {
        /// Obligation type key of the bad row.
        obligation_type: String,
        /// What failed to parse.
        detail: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<RuleError> for AppError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::DuplicateType(_) => Self::Conflict(err.to_string()),
            RuleError::RuleNotFound(_) => Self::NotFound(err.to_string()),
            RuleError::InvalidValue { .. } => Self::Validation(err.to_string()),
            RuleError::Corrupt { .. } => Self::Configuration(err.to_string()),
            RuleError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Obligation rule config repository.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    db: DatabaseConnection,
}

impl RuleRepository {
    /// Creates a new rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all global rules ordered by obligation type.
    pub async fn list_rules(&self) -> Result<Vec<ObligationRule>, RuleError> {
        let models = obligation_rules::Entity::find()
            .order_by_asc(obligation_rules::Column::ObligationType)
            .all(&self.db)
            .await?;

        models.iter().map(rule_from_model).collect()
    }

    /// Finds the global rule for an obligation type.
    pub async fn get_rule(&self, obligation_type: &str) -> Result<ObligationRule, RuleError> {
        let model = find_rule_model(&self.db, obligation_type)
            .await?
            .ok_or_else(|| RuleError::RuleNotFound(obligation_type.to_string()))?;

        rule_from_model(&model)
    }

    /// Creates a global rule; a second rule for the same type is a conflict.
    pub async fn create_rule(&self, rule: &ObligationRule) -> Result<ObligationRule, RuleError> {
        if find_rule_model(&self.db, &rule.obligation_type)
            .await?
            .is_some()
        {
            return Err(RuleError::DuplicateType(rule.obligation_type.clone()));
        }

        let now = chrono::Utc::now().into();
        let active = obligation_rules::ActiveModel {
            id: Set(Uuid::new_v4()),
            obligation_type: Set(rule.obligation_type.clone()),
            frequency: Set(rule.frequency.as_str().to_string()),
            due_day: Set(to_i16("due_day", rule.due_day)?),
            due_hour: Set(to_i16("due_hour", rule.due_hour)?),
            due_minute: Set(to_i16("due_minute", rule.due_minute)?),
            due_month: Set(rule.due_month.map(|m| to_i16("due_month", m)).transpose()?),
            quarter_offset: Set(rule
                .quarter_offset
                .map(|o| to_i16("quarter_offset", o))
                .transpose()?),
            applicable_quarters: Set(rule.applicable_quarters.to_csv()),
            skip_fourth_quarter: Set(rule.skip_fourth_quarter),
            enabled: Set(rule.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = active.insert(&self.db).await?;
        rule_from_model(&inserted)
    }

    /// Replaces the stored rule for `rule.obligation_type`.
    pub async fn update_rule(&self, rule: &ObligationRule) -> Result<ObligationRule, RuleError> {
        let model = find_rule_model(&self.db, &rule.obligation_type)
            .await?
            .ok_or_else(|| RuleError::RuleNotFound(rule.obligation_type.clone()))?;

        let mut active: obligation_rules::ActiveModel = model.into();
        active.frequency = Set(rule.frequency.as_str().to_string());
        active.due_day = Set(to_i16("due_day", rule.due_day)?);
        active.due_hour = Set(to_i16("due_hour", rule.due_hour)?);
        active.due_minute = Set(to_i16("due_minute", rule.due_minute)?);
        active.due_month = Set(rule.due_month.map(|m| to_i16("due_month", m)).transpose()?);
        active.quarter_offset = Set(rule
            .quarter_offset
            .map(|o| to_i16("quarter_offset", o))
            .transpose()?);
        active.applicable_quarters = Set(rule.applicable_quarters.to_csv());
        active.skip_fourth_quarter = Set(rule.skip_fourth_quarter);
        active.enabled = Set(rule.enabled);
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await?;
        rule_from_model(&updated)
    }

    /// Deletes the stored rule for an obligation type.
    pub async fn delete_rule(&self, obligation_type: &str) -> Result<(), RuleError> {
        let model = find_rule_model(&self.db, obligation_type)
            .await?
            .ok_or_else(|| RuleError::RuleNotFound(obligation_type.to_string()))?;

        model.delete(&self.db).await?;
        Ok(())
    }

    /// Lists a customer's override set.
    pub async fn list_overrides(&self, customer_id: Uuid) -> Result<Vec<RuleOverride>, RuleError> {
        let models = customer_obligation_overrides::Entity::find()
            .filter(customer_obligation_overrides::Column::CustomerId.eq(customer_id))
            .order_by_asc(customer_obligation_overrides::Column::ObligationType)
            .all(&self.db)
            .await?;

        models.iter().map(override_from_model).collect()
    }

    /// Replaces a customer's full override set.
    ///
    /// Destructive replace-all by contract: every existing override row for
    /// the customer is deleted and the submitted set inserted, in one
    /// transaction. Callers must always submit the complete desired set.
    pub async fn replace_overrides(
        &self,
        customer_id: Uuid,
        overrides: &[RuleOverride],
    ) -> Result<(), RuleError> {
        let txn = self.db.begin().await?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        customer_obligation_overrides::Entity::delete_many()
            .filter(customer_obligation_overrides::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        for ov in overrides {
            let active = customer_obligation_overrides::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(customer_id),
                obligation_type: Set(ov.obligation_type.clone()),
                frequency: Set(ov.frequency.map(|f| f.as_str().to_string())),
                due_day: Set(ov.due_day.map(|v| to_i16("due_day", v)).transpose()?),
                due_hour: Set(ov.due_hour.map(|v| to_i16("due_hour", v)).transpose()?),
                due_minute: Set(ov.due_minute.map(|v| to_i16("due_minute", v)).transpose()?),
                due_month: Set(ov.due_month.map(|v| to_i16("due_month", v)).transpose()?),
                quarter_offset: Set(ov
                    .quarter_offset
                    .map(|v| to_i16("quarter_offset", v))
                    .transpose()?),
                applicable_quarters: Set(ov.applicable_quarters.map(Quarters::to_csv)),
                skip_fourth_quarter: Set(ov.skip_fourth_quarter),
                enabled: Set(ov.enabled),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(&txn).await?;
        }

        txn.commit().await?;

        tracing::debug!(
            customer_id = %customer_id,
            count = overrides.len(),
            "Replaced customer override set"
        );
        Ok(())
    }

    /// Resolves the effective rule set for a customer.
    ///
    /// The resolver derives the applicable types from the profile; a stored
    /// global rule for a type replaces the canonical spec as the base, and
    /// the customer's override then merges field by field.
    pub async fn effective_rules(
        &self,
        customer_id: Uuid,
        profile: &TaxpayerProfile,
    ) -> Result<Vec<ObligationRule>, RuleError> {
        let resolved = resolve(profile);

        let globals = obligation_rules::Entity::find().all(&self.db).await?;
        let overrides = self.list_overrides(customer_id).await?;

        resolved
            .into_iter()
            .map(|canonical| {
                let base = match globals
                    .iter()
                    .find(|g| g.obligation_type == canonical.obligation_type)
                {
                    Some(model) => rule_from_model(model)?,
                    None => canonical,
                };

                let effective = match overrides
                    .iter()
                    .find(|o| o.obligation_type == base.obligation_type)
                {
                    Some(ov) => merge(&base, ov),
                    None => base,
                };
                Ok(effective)
            })
            .collect()
    }
}

async fn find_rule_model(
    db: &DatabaseConnection,
    obligation_type: &str,
) -> Result<Option<obligation_rules::Model>, DbErr> {
    obligation_rules::Entity::find()
        .filter(obligation_rules::Column::ObligationType.eq(obligation_type))
        .one(db)
        .await
}

fn to_i16(field: &'static str, value: u32) -> Result<i16, RuleError> {
    i16::try_from(value).map_err(|_| RuleError::InvalidValue { field, value })
}

fn to_u32(obligation_type: &str, field: &str, value: i16) -> Result<u32, RuleError> {
    u32::try_from(value).map_err(|_| RuleError::Corrupt {
        obligation_type: obligation_type.to_string(),
        detail: format!("{field} is negative: {value}"),
    })
}

/// Maps a stored rule row into the domain rule type.
fn rule_from_model(model: &obligation_rules::Model) -> Result<ObligationRule, RuleError> {
    let frequency =
        Frequency::parse(&model.frequency).ok_or_else(|| RuleError::Corrupt {
            obligation_type: model.obligation_type.clone(),
            detail: format!("unknown frequency token {:?}", model.frequency),
        })?;

    let applicable_quarters =
        Quarters::from_csv(&model.applicable_quarters).ok_or_else(|| RuleError::Corrupt {
            obligation_type: model.obligation_type.clone(),
            detail: format!("unparseable quarter set {:?}", model.applicable_quarters),
        })?;

    let t = &model.obligation_type;
    Ok(ObligationRule {
        obligation_type: model.obligation_type.clone(),
        frequency,
        due_day: to_u32(t, "due_day", model.due_day)?,
        due_hour: to_u32(t, "due_hour", model.due_hour)?,
        due_minute: to_u32(t, "due_minute", model.due_minute)?,
        due_month: model
            .due_month
            .map(|m| to_u32(t, "due_month", m))
            .transpose()?,
        quarter_offset: model
            .quarter_offset
            .map(|o| to_u32(t, "quarter_offset", o))
            .transpose()?,
        applicable_quarters,
        skip_fourth_quarter: model.skip_fourth_quarter,
        enabled: model.enabled,
    })
}

/// Maps a stored override row into the domain override type.
fn override_from_model(
    model: &customer_obligation_overrides::Model,
) -> Result<RuleOverride, RuleError> {
    let frequency = model
        .frequency
        .as_deref()
        .map(|s| {
            Frequency::parse(s).ok_or_else(|| RuleError::Corrupt {
                obligation_type: model.obligation_type.clone(),
                detail: format!("unknown frequency token {s:?}"),
            })
        })
        .transpose()?;

    let applicable_quarters = model
        .applicable_quarters
        .as_deref()
        .map(|csv| {
            Quarters::from_csv(csv).ok_or_else(|| RuleError::Corrupt {
                obligation_type: model.obligation_type.clone(),
                detail: format!("unparseable quarter set {csv:?}"),
            })
        })
        .transpose()?;

    let t = &model.obligation_type;
    Ok(RuleOverride {
        obligation_type: model.obligation_type.clone(),
        frequency,
        due_day: model.due_day.map(|v| to_u32(t, "due_day", v)).transpose()?,
        due_hour: model
            .due_hour
            .map(|v| to_u32(t, "due_hour", v))
            .transpose()?,
        due_minute: model
            .due_minute
            .map(|v| to_u32(t, "due_minute", v))
            .transpose()?,
        due_month: model
            .due_month
            .map(|v| to_u32(t, "due_month", v))
            .transpose()?,
        quarter_offset: model
            .quarter_offset
            .map(|v| to_u32(t, "quarter_offset", v))
            .transpose()?,
        applicable_quarters,
        skip_fourth_quarter: model.skip_fourth_quarter,
        enabled: model.enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_model() -> obligation_rules::Model {
        obligation_rules::Model {
            id: Uuid::new_v4(),
            obligation_type: "KDV".to_string(),
            frequency: "MONTHLY".to_string(),
            due_day: 28,
            due_hour: 23,
            due_minute: 59,
            due_month: None,
            quarter_offset: None,
            applicable_quarters: "1,2,3,4".to_string(),
            skip_fourth_quarter: false,
            enabled: true,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_rule_from_model() {
        let rule = rule_from_model(&rule_model()).unwrap();
        assert_eq!(rule.obligation_type, "KDV");
        assert_eq!(rule.frequency, Frequency::Monthly);
        assert_eq!(rule.due_day, 28);
        assert!(rule.applicable_quarters.contains(4));
    }

    #[test]
    fn test_rule_from_model_rejects_bad_frequency() {
        let mut model = rule_model();
        model.frequency = "FORTNIGHTLY".to_string();
        assert!(matches!(
            rule_from_model(&model),
            Err(RuleError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_rule_from_model_rejects_bad_quarters() {
        let mut model = rule_model();
        model.applicable_quarters = "1,9".to_string();
        assert!(matches!(
            rule_from_model(&model),
            Err(RuleError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_override_from_model_keeps_absent_fields_absent() {
        let model = customer_obligation_overrides::Model {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            obligation_type: "KDV".to_string(),
            frequency: None,
            due_day: Some(26),
            due_hour: None,
            due_minute: None,
            due_month: None,
            quarter_offset: None,
            applicable_quarters: Some("1,3".to_string()),
            skip_fourth_quarter: None,
            enabled: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        let ov = override_from_model(&model).unwrap();
        assert_eq!(ov.due_day, Some(26));
        assert!(ov.frequency.is_none());
        assert!(ov.enabled.is_none());
        let quarters = ov.applicable_quarters.unwrap();
        assert!(quarters.contains(1) && quarters.contains(3) && !quarters.contains(2));
    }

    #[test]
    fn test_to_i16_rejects_out_of_range() {
        assert!(to_i16("due_day", 28).is_ok());
        assert!(matches!(
            to_i16("due_day", 40_000),
            Err(RuleError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rule_error_maps_to_app_error() {
        let err: AppError = RuleError::DuplicateType("KDV".to_string()).into();
        assert_eq!(err.status_code(), 409);

        let err: AppError = RuleError::RuleNotFound("KDV".to_string()).into();
        assert_eq!(err.status_code(), 404);

        let err: AppError = RuleError::Corrupt {
            obligation_type: "KDV".to_string(),
            detail: "x".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 422);
    }
}
