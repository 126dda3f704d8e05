//! # polymat-db
//!
//! PostgreSQL persistence layer for polymat.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for paragraphs, materials, records,
//!   property metadata, methods, checkpoints, filter markers, and
//!   cross-reference pairs
//! - Logical schema setup for fresh databases and test schemas
//!
//! ## Example
//!
//! ```rust,ignore
//! use polymat_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/polymat").await?;
//!     let count = db.paragraphs.count().await?;
//!     println!("{count} paragraphs ingested");
//!     Ok(())
//! }
//! ```

pub mod checkpoints;
pub mod crossrefs;
pub mod filtered;
pub mod materials;
pub mod methods;
pub mod paragraphs;
pub mod pool;
pub mod properties;
pub mod records;
pub mod schema;

// Test fixtures for integration tests.
// Always compiled so integration tests (in tests/) can use them.
pub mod test_fixtures;

// Re-export core types
pub use polymat_core::*;

// Re-export repository implementations
pub use checkpoints::PgCheckpointRepository;
pub use crossrefs::PgCrossrefRepository;
pub use filtered::PgFilteredDataRepository;
pub use materials::PgMaterialRepository;
pub use methods::PgMethodRepository;
pub use paragraphs::PgParagraphRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use properties::PgPropertyRepository;
pub use records::PgRecordRepository;
pub use schema::ensure_schema;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Paragraph repository.
    pub paragraphs: PgParagraphRepository,
    /// Material mention repository.
    pub materials: PgMaterialRepository,
    /// Extracted record repository.
    pub records: PgRecordRepository,
    /// Property metadata repository.
    pub properties: PgPropertyRepository,
    /// Extraction method repository.
    pub methods: PgMethodRepository,
    /// Checkpoint/cursor store.
    pub checkpoints: PgCheckpointRepository,
    /// Validator marker store.
    pub filtered: PgFilteredDataRepository,
    /// Cross-reference pair store.
    pub crossrefs: PgCrossrefRepository,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the repository set over an existing pool.
    pub fn from_pool(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            paragraphs: PgParagraphRepository::new(pool.clone()),
            materials: PgMaterialRepository::new(pool.clone()),
            records: PgRecordRepository::new(pool.clone()),
            properties: PgPropertyRepository::new(pool.clone()),
            methods: PgMethodRepository::new(pool.clone()),
            checkpoints: PgCheckpointRepository::new(pool.clone()),
            filtered: PgFilteredDataRepository::new(pool.clone()),
            crossrefs: PgCrossrefRepository::new(pool.clone()),
            pool,
        }
    }
}
