pub mod executor;
pub mod scorer;

pub use executor::QueryExecutor;
pub use scorer::Scorer;
