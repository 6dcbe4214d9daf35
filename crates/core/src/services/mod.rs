//! Business services.

pub mod gate;
pub mod moderation;
pub mod notification;
pub mod sync;
pub mod ticket;

pub use gate::{AccessDecision, GateService, evaluate, require_allowed};
pub use moderation::{ModerationService, SuspensionAction};
pub use notification::NotificationService;
pub use sync::{SyncService, SyncSnapshot, TicketSummary};
pub use ticket::{CloseOutcome, EscalateOutcome, TicketCreation, TicketService};
