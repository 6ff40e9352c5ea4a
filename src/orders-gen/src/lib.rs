pub mod catalog;
pub mod customers;
pub mod error;
pub mod generator;
pub mod orders;
pub mod schema;

pub use generator::OrderGenerator;
pub use generator::RunReport;
pub use schema::RetailSchema;
