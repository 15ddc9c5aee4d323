//! Core types and trait definitions for the ledgerview chain index.
//!
//! No database code lives here. Storage backends implement the traits in
//! [`store`]; the host node and query layers program against those traits.

pub mod block;
pub mod entity;
pub mod error;
pub mod kind;
pub mod outcome;
pub mod payload;
pub mod rating;
pub mod store;
pub mod utxo;

pub use error::{Error, Result};
