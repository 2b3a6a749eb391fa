pub mod extractor;
pub mod jwt;
pub mod pin;
pub mod session;
