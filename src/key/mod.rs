//! Per-pixel green-screen keying.
//!
//! Everything here is a pure function of (pixels, [`KeyingParams`]).

pub(crate) mod params;
pub(crate) mod pass;
pub(crate) mod table;
