//! Wire encodings.
//!
//! Only what type size estimation needs: a chainpack writer for literal
//! values.

pub mod chainpack;

pub use chainpack::{encode, encoded_len, ChainPackWriter};
