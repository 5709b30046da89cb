//! Classification model boundary
//!
//! The remote model is an opaque capability behind the [`ModelProvider`]
//! trait; the [`ModelGateway`] owns its lifecycle (load / ready / error)
//! and exposes the single inference operation.

pub mod gateway;
pub mod provider;

pub use gateway::{GatewayPhase, ModelGateway};
pub use provider::{HttpModelProvider, InferenceSession, ModelProvider};
