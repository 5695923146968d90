//! Records exchanged with the authorization server.
//!
//! The issuing framework hands the stores anything implementing
//! [`ClientInfo`] or [`TokenInfo`]; lookups return the concrete
//! [`Client`] and [`Token`] records.

mod client;
mod token;

pub use client::{Client, ClientInfo};
pub use token::{Token, TokenInfo, unset_time};
