//! Mathematical primitives for SCPN KSpace Neutrinos.

pub mod interp;
pub mod quad;
