#![allow(dead_code)]

use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use local_basket_backend::database::SchemaDescriptor;
use local_basket_backend::domain::payout::CommissionSettings;
use local_basket_backend::entities::ActorRole;
use local_basket_backend::middlewares::AuthUser;
use local_basket_backend::services::*;
use local_basket_backend::utils::JwtService;

pub const JWT_SECRET: &str = "test-secret";

pub const CUSTOMER: AuthUser = AuthUser {
    id: 501,
    role: ActorRole::Customer,
};
pub const OTHER_CUSTOMER: AuthUser = AuthUser {
    id: 502,
    role: ActorRole::Customer,
};
pub const ADMIN: AuthUser = AuthUser {
    id: 1,
    role: ActorRole::Admin,
};

/// Approved seller with valid bank details
pub const SELLER_ID: i64 = 10;
/// Approved seller without bank details
pub const SELLER_NO_KYC_ID: i64 = 11;
/// Registered but not approved
pub const SELLER_PENDING_ID: i64 = 12;

pub fn seller(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: ActorRole::Seller,
    }
}

pub struct TestContext {
    pub pool: DatabaseConnection,
    pub audit: AuditService,
    pub sellers: SellerService,
    pub commissions: CommissionService,
    pub orders: OrderService,
    pub payouts: PayoutService,
    pub imports: ImportService,
    pub jwt: JwtService,
}

/// In-memory SQLite has one database per connection, so the pool keeps exactly one.
pub async fn setup() -> TestContext {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let pool = Database::connect(opt).await.unwrap();
    Migrator::up(&pool, None).await.unwrap();

    seed_sellers(&pool).await;

    let schema = SchemaDescriptor::load(&pool).await.unwrap().into_shared();
    let sellers = SellerService::new(pool.clone(), schema);
    let commissions = CommissionService::new(pool.clone(), CommissionSettings::default());

    TestContext {
        audit: AuditService::new(pool.clone()),
        payouts: PayoutService::new(pool.clone(), sellers.clone(), commissions.clone()),
        orders: OrderService::new(pool.clone()),
        imports: ImportService::new(pool.clone()),
        sellers,
        commissions,
        jwt: JwtService::new(JWT_SECRET, 3600),
        pool,
    }
}

async fn seed_sellers(pool: &DatabaseConnection) {
    let backend = pool.get_database_backend();
    let sql = format!(
        "INSERT INTO sellers (id, store_name, status, bank_holder, bank_account, bank_ifsc) VALUES \
         ({SELLER_ID}, 'Sharma Kirana', 'APPROVED', 'R Sharma', '123456789012', 'HDFC0001234'), \
         ({SELLER_NO_KYC_ID}, 'Fresh Veggies', 'APPROVED', NULL, NULL, NULL), \
         ({SELLER_PENDING_ID}, 'New Shop', 'PENDING', NULL, NULL, NULL)"
    );
    pool.execute(Statement::from_string(backend, sql))
        .await
        .unwrap();
}

impl TestContext {
    pub fn token(&self, user: &AuthUser) -> String {
        self.jwt.generate_access_token(user.id, user.role).unwrap()
    }
}
