pub mod announcement;
pub mod audit_log;
pub mod category;
pub mod feedback;
pub mod license_key;
pub mod message;
pub mod premium;
pub mod reaction;
pub mod request;
pub mod serial;
pub mod setting;
pub mod software;
pub mod ticket;
pub mod user;
pub mod video;

pub use category::CategoryKind;
pub use license_key::LicenseStatus;
pub use premium::{AccountType, PremiumStatus};
pub use request::RequestStatus;
pub use serial::SerialStatus;
pub use ticket::{TicketPriority, TicketStatus};
pub use user::Role;
