//! Data Transfer Objects for REST request/response serialization.
//!
//! All fields use camelCase on the wire to match the client contract.

pub mod booking_dto;

pub use booking_dto::*;
