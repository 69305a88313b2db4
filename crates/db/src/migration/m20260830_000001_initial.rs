//! Initial database migration.
//!
//! Creates the obligation rule config, override, accounting period, and
//! subscription accrual tables plus the customer directory projection.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CUSTOMER DIRECTORY (read-only collaborator)
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;

        // ============================================================
        // PART 3: OBLIGATION RULE CONFIG
        // ============================================================
        db.execute_unprepared(OBLIGATION_RULES_SQL).await?;
        db.execute_unprepared(OVERRIDES_SQL).await?;

        // ============================================================
        // PART 4: ACCRUAL LEDGER
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;
        db.execute_unprepared(SUBSCRIPTION_ACCRUALS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Accounting period status
CREATE TYPE accounting_period_status AS ENUM ('OPEN', 'CLOSED');
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    company_type VARCHAR(16) NOT NULL,
    ledger_type VARCHAR(16) NOT NULL,
    has_employees BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    subscription_fee VARCHAR(64),
    established_on DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_customers_active ON customers(is_active);
";

const OBLIGATION_RULES_SQL: &str = r"
CREATE TABLE obligation_rules (
    id UUID PRIMARY KEY,
    obligation_type VARCHAR(64) NOT NULL,
    frequency VARCHAR(16) NOT NULL,
    due_day SMALLINT NOT NULL,
    due_hour SMALLINT NOT NULL,
    due_minute SMALLINT NOT NULL,
    due_month SMALLINT,
    quarter_offset SMALLINT,
    applicable_quarters VARCHAR(16) NOT NULL DEFAULT '1,2,3,4',
    skip_fourth_quarter BOOLEAN NOT NULL DEFAULT FALSE,
    enabled BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- One rule per obligation type
    CONSTRAINT uq_obligation_rules_type UNIQUE (obligation_type)
);
";

const OVERRIDES_SQL: &str = r"
CREATE TABLE customer_obligation_overrides (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    obligation_type VARCHAR(64) NOT NULL,
    frequency VARCHAR(16),
    due_day SMALLINT,
    due_hour SMALLINT,
    due_minute SMALLINT,
    due_month SMALLINT,
    quarter_offset SMALLINT,
    applicable_quarters VARCHAR(16),
    skip_fourth_quarter BOOLEAN,
    enabled BOOLEAN,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_overrides_customer_type UNIQUE (customer_id, obligation_type)
);

CREATE INDEX idx_overrides_customer ON customer_obligation_overrides(customer_id);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status accounting_period_status NOT NULL DEFAULT 'OPEN',
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- One period per customer per calendar year; backstops the
    -- find-or-create path against concurrent inserts
    CONSTRAINT uq_periods_customer_year UNIQUE (customer_id, year)
);
";

const SUBSCRIPTION_ACCRUALS_SQL: &str = r"
CREATE TABLE subscription_accruals (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    period_id UUID NOT NULL REFERENCES accounting_periods(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    due_date DATE NOT NULL,
    is_paid BOOLEAN NOT NULL DEFAULT FALSE,
    payment_date DATE,
    carry_forward_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    carry_forward_to_period_id UUID REFERENCES accounting_periods(id),
    description VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_accruals_customer_due ON subscription_accruals(customer_id, due_date);
CREATE INDEX idx_accruals_period ON subscription_accruals(period_id);
CREATE INDEX idx_accruals_carry_target ON subscription_accruals(carry_forward_to_period_id);
";

const TRIGGERS_SQL: &str = r"
-- Keep updated_at current on every row update
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_customers_updated_at
    BEFORE UPDATE ON customers
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_obligation_rules_updated_at
    BEFORE UPDATE ON obligation_rules
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_overrides_updated_at
    BEFORE UPDATE ON customer_obligation_overrides
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_periods_updated_at
    BEFORE UPDATE ON accounting_periods
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_accruals_updated_at
    BEFORE UPDATE ON subscription_accruals
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS subscription_accruals CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS customer_obligation_overrides CASCADE;
DROP TABLE IF EXISTS obligation_rules CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP FUNCTION IF EXISTS set_updated_at CASCADE;
DROP TYPE IF EXISTS accounting_period_status CASCADE;
";
