//! Row values and their on-page encoding.
//!
//! - [`Value`] - One typed field
//! - [`encode_tuple`] / [`decode_tuple`] - The tagged-field codec

mod codec;
mod value;

pub use codec::{decode_tuple, encode_tuple};
pub use value::Value;
