pub mod config;
pub mod error;

pub const DEFAULT_KEYSPACE: &str = "retail_ks";
pub const DEFAULT_HOST: &str = "127.0.0.1:9042";
pub const DEFAULT_REPLICATION_FACTOR: u32 = 1;
pub const DEFAULT_ORDERS: usize = 100001;
pub const DEFAULT_CUSTOMER_LOW: u32 = 700;
pub const DEFAULT_CUSTOMER_HIGH: u32 = 800;
pub const DEFAULT_DELAY_MS: u64 = 10;
