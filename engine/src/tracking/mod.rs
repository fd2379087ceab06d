//! Per-frame landmark processing: data types, normalization, hand roles.

pub mod landmarks;
pub mod normalize;
pub mod roles;

#[cfg(test)]
pub(crate) mod testutil;
