//! Services driving the two validator-side duties that need a beacon node:
//! proposing blocks ([`block_service`]) and keeping relays apprised of fee
//! recipient / gas-limit preferences ([`registration_service`]).

pub mod block_service;
pub mod convert;
pub mod registration_service;
pub mod signing_root;

pub use block_service::{BlockService, BlockServiceBuilder};
pub use registration_service::RegistrationService;
