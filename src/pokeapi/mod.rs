pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
#[cfg(test)]
pub mod mock;
pub mod types;
