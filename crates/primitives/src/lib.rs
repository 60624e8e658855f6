//! Collection of generic internal data types that are used widely.

mod macros;

pub mod address;
pub mod amount;
pub mod big;
pub mod buf;
pub mod currency;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod params;
pub mod sig;

pub mod prelude;
