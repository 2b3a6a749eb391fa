pub mod audit_entry;
pub mod customer;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use audit_entry::AuditEntry;
pub use customer::Customer;
pub use ticket::{PaymentMethod, Ticket, TicketDetails, TicketListingView, TicketStatus, TicketView};
pub use ticket_type::{TicketType, TicketTypeView};
pub use user::User;
