pub mod admin;
pub mod config_entry;
pub mod device;
pub mod operation_log;
pub mod user;

pub use admin::{AdminRole, AdminUser};
pub use config_entry::ConfigEntry;
pub use device::Device;
pub use operation_log::OperationLog;
pub use user::{User, UserRole};
