pub mod notification;
pub mod requests;
pub mod user;
