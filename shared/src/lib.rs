//! Wire types shared by the expense tracker backend and its clients.

mod types;

pub use types::*;
