//! Database repositories.

mod moderation;
mod notification;
mod ticket;
mod user;

pub use moderation::ModerationRepository;
pub use notification::NotificationRepository;
pub use ticket::{ClaimOutcome, TicketRepository};
pub use user::UserRepository;
