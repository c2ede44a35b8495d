//! Domain types: transaction records, checkout data and the ports the
//! gateway client talks through.

pub mod basket;
pub mod ports;
pub mod record;
