pub mod accounts;
pub mod files;
pub mod pool;
pub mod posts;
pub mod sessions;
pub mod settings;
