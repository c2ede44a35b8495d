//! Application layer: the gateway client and the checkout-facing facade.
//!
//! `GatewayClient` owns the transport and the record store and performs one
//! remote call per operation. `CheckoutFacade` resolves configuration and
//! callback URLs on the checkout's behalf.

pub mod facade;
pub mod gateway;
