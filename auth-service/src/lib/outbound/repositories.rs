pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserRepository;
pub use memory::SeedError;
pub use postgres::PostgresUserRepository;
