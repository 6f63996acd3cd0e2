pub mod grant;
pub mod principal;
pub mod ticket;
