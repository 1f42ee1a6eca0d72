pub mod booking_code;
pub mod jwt;
