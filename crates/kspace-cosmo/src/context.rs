// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Cosmology Context
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Background cosmology shared by every neutrino routine.
//!
//! Built once at simulation start and passed by reference; there is no
//! process-wide state.

use crate::hybrid::HybridState;
use crate::omega_nu::OmegaNuModel;
use kspace_types::config::KspaceConfig;
use kspace_types::constants::{HUBBLE, NUSPECIES};
use kspace_types::error::{KspaceError, KspaceResult};

#[derive(Debug, Clone)]
pub struct CosmologyContext {
    omnu: OmegaNuModel,
    omega0: f64,
    hubble_param: f64,
    /// H0 in internal inverse time units.
    hubble: f64,
    omega_nu_now: f64,
}

impl CosmologyContext {
    pub fn new(
        masses: &[f64; NUSPECIES],
        omega0: f64,
        a0: f64,
        hubble_param: f64,
        unit_time_in_s: f64,
    ) -> KspaceResult<Self> {
        if !(omega0 > 0.0) || !(hubble_param > 0.0) || !(unit_time_in_s > 0.0) {
            return Err(KspaceError::ConfigError(format!(
                "Omega0, HubbleParam and UnitTime_in_s must be > 0, got {omega0}, {hubble_param}, {unit_time_in_s}"
            )));
        }
        let omnu = OmegaNuModel::new(masses, omega0, a0, hubble_param)?;
        Ok(Self::from_model(omnu, hubble_param, unit_time_in_s))
    }

    /// Wrap an existing background model, e.g. one with hybrid mode enabled.
    pub fn from_model(omnu: OmegaNuModel, hubble_param: f64, unit_time_in_s: f64) -> Self {
        let omega_nu_now = omnu.omega_nu(1.0);
        CosmologyContext {
            omega0: omnu.omega0(),
            omnu,
            hubble_param,
            hubble: HUBBLE * unit_time_in_s,
            omega_nu_now,
        }
    }

    pub fn from_config(cfg: &KspaceConfig) -> KspaceResult<Self> {
        cfg.validate()?;
        let u = &cfg.units;
        let mut omnu =
            OmegaNuModel::new(&cfg.masses(), u.omega0, cfg.time_transfer, u.hubble_param)?;
        if cfg.hybrid_neutrinos_on {
            let hybrid = HybridState::new(&cfg.masses(), cfg.vcrit, u.light(), cfg.nu_part_time)?;
            log::info!(
                "Hybrid neutrinos on after a = {}: particle fractions {:?}",
                hybrid.nu_crit_time,
                hybrid.nufrac_low
            );
            omnu = omnu.with_hybrid(hybrid);
        }
        Ok(Self::from_model(omnu, u.hubble_param, u.unit_time_in_s))
    }

    pub fn omega_nu_model(&self) -> &OmegaNuModel {
        &self.omnu
    }

    pub fn omega0(&self) -> f64 {
        self.omega0
    }

    pub fn hubble_param(&self) -> f64 {
        self.hubble_param
    }

    pub fn omega_nu(&self, a: f64) -> f64 {
        self.omnu.omega_nu(a)
    }

    pub fn omega_nu_nopart(&self, a: f64) -> f64 {
        self.omnu.omega_nu_nopart(a)
    }

    /// Matter density not in neutrinos, Ω0 − Ω_ν(1).
    pub fn omega_nonu(&self) -> f64 {
        self.omega0 - self.omega_nu_now
    }

    /// Flat matter + Λ expansion rate with neutrino and radiation
    /// corrections, in internal units.
    pub fn hubble_function(&self, a: f64) -> f64 {
        let mut omega_tot = self.omega0 / a.powi(3) + (1.0 - self.omega0);
        omega_tot += self.omnu.omega_nu(a) - self.omega_nu_now / a.powi(3);
        omega_tot += self.omnu.omega_gamma(a);
        self.hubble * omega_tot.sqrt()
    }
}
