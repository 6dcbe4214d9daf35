//! Database entities.

pub mod notification;
pub mod support_ticket;
pub mod suspension_record;
pub mod user;

pub use notification::Entity as Notification;
pub use support_ticket::Entity as SupportTicket;
pub use suspension_record::Entity as SuspensionRecord;
pub use user::Entity as User;
