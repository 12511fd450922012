// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fourier-space neutrino correction for a particle-mesh density grid.
//!
//! The grid flows one way: [`powerspectrum`] measures the CDM power, a
//! [`solver::NeutrinoPerturbationSolver`] supplies the neutrino amplitude,
//! [`ratio`] interpolates δ_ν/δ_cdm and [`driver`] rescales every mode.

pub mod comm;
pub mod driver;
pub mod output;
pub mod powerspectrum;
pub mod ratio;
pub mod solver;
