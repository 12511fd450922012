// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{LIGHTCGS, NUSPECIES};
use crate::error::{KspaceError, KspaceResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Neutrino module parameters.
/// Field names follow the host parameter file (MNue, Vcrit, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KspaceConfig {
    /// CAMB transfer function file, read by the host before the first step.
    #[serde(rename = "KspaceTransferFunction")]
    pub transfer_function: String,
    /// Scale factor of the transfer function, also the start of the tables.
    #[serde(rename = "TimeTransfer")]
    pub time_transfer: f64,
    #[serde(rename = "OmegaBaryonCAMB")]
    pub omega_baryon_camb: f64,
    #[serde(rename = "InputSpectrum_UnitLength_in_cm")]
    pub input_spectrum_unit_length_in_cm: f64,
    /// Neutrino masses in eV.
    #[serde(rename = "MNue", default)]
    pub mnue: f64,
    #[serde(rename = "MNum", default)]
    pub mnum: f64,
    #[serde(rename = "MNut", default)]
    pub mnut: f64,
    /// Accepts `true`/`false` or the integer tag of the host parameter file.
    #[serde(rename = "HybridNeutrinosOn", default, deserialize_with = "bool_or_int")]
    pub hybrid_neutrinos_on: bool,
    /// Critical velocity above which neutrinos are followed analytically.
    /// Unperturbed velocity today in internal units; multiply by (1+z) for
    /// the velocity at redshift z.
    #[serde(rename = "Vcrit", default = "default_vcrit")]
    pub vcrit: f64,
    /// Scale factor at which the particle neutrinos switch on.
    #[serde(rename = "NuPartTime", default = "default_nu_part_time")]
    pub nu_part_time: f64,
    pub units: SimulationUnits,
}

/// Unit system and background cosmology of the host simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationUnits {
    #[serde(rename = "BoxSize")]
    pub box_size: f64,
    #[serde(rename = "UnitLength_in_cm", default = "default_unit_length")]
    pub unit_length_in_cm: f64,
    #[serde(rename = "UnitTime_in_s", default = "default_unit_time")]
    pub unit_time_in_s: f64,
    #[serde(rename = "Omega0")]
    pub omega0: f64,
    #[serde(rename = "HubbleParam")]
    pub hubble_param: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SwitchValue {
    Bool(bool),
    Int(i64),
}

/// Any non-zero integer switches on.
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match SwitchValue::deserialize(deserializer)? {
        SwitchValue::Bool(b) => b,
        SwitchValue::Int(i) => i != 0,
    })
}

fn default_vcrit() -> f64 {
    500.0
}
fn default_nu_part_time() -> f64 {
    0.25
}
fn default_unit_length() -> f64 {
    3.085678e21
}
fn default_unit_time() -> f64 {
    3.08568025e16
}

impl SimulationUnits {
    /// Speed of light in internal velocity units.
    pub fn light(&self) -> f64 {
        LIGHTCGS * self.unit_time_in_s / self.unit_length_in_cm
    }
}

impl KspaceConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> KspaceResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn masses(&self) -> [f64; NUSPECIES] {
        [self.mnue, self.mnum, self.mnut]
    }

    pub fn validate(&self) -> KspaceResult<()> {
        for (i, m) in self.masses().iter().enumerate() {
            if !m.is_finite() || *m < 0.0 {
                return Err(KspaceError::ConfigError(format!(
                    "Neutrino mass {i} must be finite and >= 0, got {m}"
                )));
            }
        }
        if !self.time_transfer.is_finite() || self.time_transfer <= 0.0 {
            return Err(KspaceError::ConfigError(format!(
                "TimeTransfer must be finite > 0, got {}",
                self.time_transfer
            )));
        }
        if self.hybrid_neutrinos_on && (!self.vcrit.is_finite() || self.vcrit <= 0.0) {
            return Err(KspaceError::ConfigError(format!(
                "Hybrid neutrinos need Vcrit > 0, got {}",
                self.vcrit
            )));
        }
        let u = &self.units;
        if !(u.box_size > 0.0 && u.unit_length_in_cm > 0.0 && u.unit_time_in_s > 0.0) {
            return Err(KspaceError::ConfigError(
                "BoxSize and unit scales must be > 0".to_string(),
            ));
        }
        if !(u.hubble_param > 0.0) || !(u.omega0 > 0.0) {
            return Err(KspaceError::ConfigError(format!(
                "HubbleParam and Omega0 must be > 0, got {} and {}",
                u.hubble_param, u.omega0
            )));
        }
        Ok(())
    }
}
