// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Background Cosmology
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Homogeneous neutrino and radiation background.
//!
//! `rho_nu` tabulates the single-species density, `omega_nu` combines the
//! species (with degeneracies and the hybrid particle split) into density
//! parameters, and `context` owns everything a simulation step needs.

pub mod context;
pub mod hybrid;
pub mod omega_nu;
pub mod rho_nu;
