pub mod audit;
pub mod customers;
pub mod ticket_types;
pub mod tickets;
pub mod users;
