// ── Domain model ──

pub mod device;
pub mod ids;
pub mod site;

pub use device::{DeviceKind, InventoryDevice};
pub use ids::{DeviceMac, OrgId, SiteId};
pub use site::Site;
