// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical constants in CGS units, kept in sync with the host N-body code.

/// Number of neutrino mass eigenstates tracked.
pub const NUSPECIES: usize = 3;

/// Speed of light (cm/s).
pub const LIGHTCGS: f64 = 2.99792458e10;

/// Newton's constant (cgs).
pub const GRAVITY: f64 = 6.67408e-8;

/// 100 km/s/Mpc in 1/s (h = 1).
pub const HUBBLE: f64 = 3.24077929e-18;

/// Reduced Planck constant (eV s).
pub const HBAR_EV_S: f64 = 6.582119e-16;

/// Stefan-Boltzmann constant (erg cm^-2 s^-1 K^-4).
pub const STEFAN_BOLTZMANN: f64 = 5.670373e-5;

/// Boltzmann constant (eV/K).
pub const BOLEVK: f64 = 8.61734e-5;

/// Present-day CMB temperature (K), Fixsen 2009.
pub const T_CMB0: f64 = 2.7255;

/// Present-day neutrino temperature (K):
/// T_CMB0 · (4/11)^(1/3) · 1.00328, the last factor absorbing
/// non-instantaneous decoupling so that Ω_ν h² = m_ν / 93.14 eV.
pub const TNU: f64 = 1.951749648967578;

/// 1 eV/c² in grams.
pub const EV_IN_GRAMS: f64 = 1.60217646e-12 / (LIGHTCGS * LIGHTCGS);

/// Riemann zeta values used by the non-relativistic density expansion.
pub const ZETA3: f64 = 1.202056903159594;
pub const ZETA5: f64 = 1.0369277551433704;
pub const ZETA7: f64 = 1.0083492773819229;
pub const ZETA9: f64 = 1.0020083928260826;

/// Absolute tolerance (eV) below which two masses count as degenerate.
pub const MASS_DEGENERACY_TOL: f64 = 1e-6;

/// k_B T_ν in eV.
#[inline]
pub fn kt_nu() -> f64 {
    BOLEVK * TNU
}
