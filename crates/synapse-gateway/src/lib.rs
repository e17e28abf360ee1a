//! # synapse-gateway
//!
//! The real-time messaging core of the Synapse platform: holds the live
//! WebSocket connections of every team room, fans chat events out to room
//! members, and evicts connections that misbehave or die mid-send.

pub mod broadcast;
pub mod close_codes;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod session;

pub use server::{create_app, create_gateway_state, run, GatewayState};
