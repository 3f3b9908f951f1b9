//! Initial database migration.
//!
//! Creates the wallet ledger tables. Balance non-negativity and status values
//! are enforced with `CHECK` constraints; external references are unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACCOUNTS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: MARKETPLACE & HOUSING
        // ============================================================
        db.execute_unprepared(MARKET_ITEMS_SQL).await?;
        db.execute_unprepared(ORDERS_SQL).await?;
        db.execute_unprepared(HOUSING_LISTINGS_SQL).await?;
        db.execute_unprepared(TOUR_REQUESTS_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTION LOG
        // ============================================================
        db.execute_unprepared(WALLET_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: NOTIFICATIONS
        // ============================================================
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
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

const USERS_SQL: &str = r"
CREATE TABLE users (
    id                  UUID PRIMARY KEY,
    email               VARCHAR(255) NOT NULL UNIQUE,
    full_name           VARCHAR(255) NOT NULL,
    role                VARCHAR(32) NOT NULL DEFAULT 'student',
    available_balance   NUMERIC(19, 4) NOT NULL DEFAULT 0,
    escrow_balance      NUMERIC(19, 4) NOT NULL DEFAULT 0,
    in_transit_balance  NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_available_non_negative CHECK (available_balance >= 0),
    CONSTRAINT chk_escrow_non_negative CHECK (escrow_balance >= 0),
    CONSTRAINT chk_in_transit_non_negative CHECK (in_transit_balance >= 0)
);
";

const MARKET_ITEMS_SQL: &str = r"
CREATE TABLE market_items (
    id          UUID PRIMARY KEY,
    seller_id   UUID NOT NULL REFERENCES users(id),
    title       VARCHAR(255) NOT NULL,
    description TEXT,
    price       NUMERIC(19, 4) NOT NULL,
    status      VARCHAR(16) NOT NULL DEFAULT 'available',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_item_price_positive CHECK (price > 0),
    CONSTRAINT chk_item_status CHECK (status IN ('available', 'sold'))
);

CREATE INDEX idx_market_items_seller ON market_items(seller_id);
";

const ORDERS_SQL: &str = r"
CREATE TABLE orders (
    id              UUID PRIMARY KEY,
    buyer_id        UUID NOT NULL REFERENCES users(id),
    seller_id       UUID NOT NULL REFERENCES users(id),
    item_id         UUID NOT NULL REFERENCES market_items(id),
    amount          NUMERIC(19, 4) NOT NULL,
    escrow_amount   NUMERIC(19, 4) NOT NULL,
    status          VARCHAR(16) NOT NULL DEFAULT 'pending',
    escrow_status   VARCHAR(16) NOT NULL DEFAULT 'held',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_order_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_order_escrow_non_negative CHECK (escrow_amount >= 0),
    CONSTRAINT chk_order_status CHECK (
        status IN ('pending', 'processing', 'shipping', 'delivered', 'cancelled')
    ),
    CONSTRAINT chk_order_escrow_status CHECK (escrow_status IN ('held', 'released', 'refunded')),
    CONSTRAINT chk_order_parties CHECK (buyer_id <> seller_id)
);

CREATE INDEX idx_orders_buyer ON orders(buyer_id, created_at DESC);
CREATE INDEX idx_orders_seller ON orders(seller_id, created_at DESC);
";

const HOUSING_LISTINGS_SQL: &str = r"
CREATE TABLE housing_listings (
    id          UUID PRIMARY KEY,
    landlord_id UUID NOT NULL REFERENCES users(id),
    title       VARCHAR(255) NOT NULL,
    rent_amount NUMERIC(19, 4) NOT NULL,
    status      VARCHAR(16) NOT NULL DEFAULT 'available',
    tenant_id   UUID REFERENCES users(id),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_rent_positive CHECK (rent_amount > 0),
    CONSTRAINT chk_listing_status CHECK (status IN ('available', 'rented'))
);
";

const TOUR_REQUESTS_SQL: &str = r"
CREATE TABLE tour_requests (
    id              UUID PRIMARY KEY,
    listing_id      UUID NOT NULL REFERENCES housing_listings(id),
    requester_id    UUID NOT NULL REFERENCES users(id),
    host_id         UUID NOT NULL REFERENCES users(id),
    fee             NUMERIC(19, 4) NOT NULL,
    payment_status  VARCHAR(16) NOT NULL DEFAULT 'unpaid',
    paid_at         TIMESTAMPTZ,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_tour_fee_positive CHECK (fee > 0),
    CONSTRAINT chk_tour_payment_status CHECK (payment_status IN ('unpaid', 'paid'))
);
";

const WALLET_TRANSACTIONS_SQL: &str = r"
CREATE TABLE wallet_transactions (
    id                  UUID PRIMARY KEY,
    user_id             UUID NOT NULL REFERENCES users(id),
    transaction_type    VARCHAR(32) NOT NULL,
    amount              NUMERIC(19, 4) NOT NULL,
    status              VARCHAR(32) NOT NULL,
    related_user_id     UUID REFERENCES users(id),
    pairing_id          UUID,
    reference           VARCHAR(255),
    order_id            UUID REFERENCES orders(id),
    market_item_id      UUID REFERENCES market_items(id),
    description         TEXT,
    bank_details        JSONB,
    processed_by        UUID REFERENCES users(id),
    processed_at        TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_wallet_tx_type CHECK (transaction_type IN (
        'topup', 'withdrawal', 'transfer_out', 'transfer_in',
        'escrow_hold', 'escrow_release', 'escrow_refund',
        'tour_payment', 'tour_earning', 'rent_payment', 'rent_earning'
    )),
    CONSTRAINT chk_wallet_tx_status CHECK (status IN (
        'pending', 'pending_acceptance', 'completed', 'failed', 'rejected'
    )),
    CONSTRAINT chk_wallet_tx_amount_non_zero CHECK (amount <> 0)
);

-- One credit per external gateway reference
CREATE UNIQUE INDEX uq_wallet_tx_reference ON wallet_transactions(reference)
    WHERE reference IS NOT NULL;

CREATE INDEX idx_wallet_tx_user ON wallet_transactions(user_id, created_at DESC);
CREATE INDEX idx_wallet_tx_pairing ON wallet_transactions(pairing_id)
    WHERE pairing_id IS NOT NULL;
CREATE INDEX idx_wallet_tx_pending_withdrawals ON wallet_transactions(created_at)
    WHERE transaction_type = 'withdrawal' AND status = 'pending';
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id          UUID PRIMARY KEY,
    user_id     UUID NOT NULL REFERENCES users(id),
    title       VARCHAR(255) NOT NULL,
    body        TEXT NOT NULL,
    data        JSONB NOT NULL DEFAULT '{}'::jsonb,
    read_at     TIMESTAMPTZ,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_notifications_user ON notifications(user_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_market_items_updated_at BEFORE UPDATE ON market_items
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_orders_updated_at BEFORE UPDATE ON orders
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_housing_listings_updated_at BEFORE UPDATE ON housing_listings
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_tour_requests_updated_at BEFORE UPDATE ON tour_requests
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_wallet_transactions_updated_at BEFORE UPDATE ON wallet_transactions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

-- Ledger rows keep their identity and amount forever
CREATE OR REPLACE FUNCTION prevent_wallet_tx_rewrite()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.amount <> OLD.amount
        OR NEW.user_id <> OLD.user_id
        OR NEW.transaction_type <> OLD.transaction_type
        OR NEW.reference IS DISTINCT FROM OLD.reference THEN
        RAISE EXCEPTION 'wallet transaction % is immutable', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_wallet_transactions_immutable BEFORE UPDATE ON wallet_transactions
    FOR EACH ROW EXECUTE FUNCTION prevent_wallet_tx_rewrite();

CREATE OR REPLACE FUNCTION prevent_wallet_tx_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'wallet transactions cannot be deleted';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_wallet_transactions_no_delete BEFORE DELETE ON wallet_transactions
    FOR EACH ROW EXECUTE FUNCTION prevent_wallet_tx_delete();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS wallet_transactions CASCADE;
DROP TABLE IF EXISTS tour_requests CASCADE;
DROP TABLE IF EXISTS housing_listings CASCADE;
DROP TABLE IF EXISTS orders CASCADE;
DROP TABLE IF EXISTS market_items CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP FUNCTION IF EXISTS prevent_wallet_tx_delete();
DROP FUNCTION IF EXISTS prevent_wallet_tx_rewrite();
DROP FUNCTION IF EXISTS set_updated_at();
";
