pub mod loader;
pub mod products;
pub mod store;

pub use loader::RawProduct;
pub use products::CatalogEntry;
pub use products::Product;
pub use store::CatalogStore;
