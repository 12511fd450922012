// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Grid Correction Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Adds the neutrino power to the Fourier-space density grid of a PM step.
//!
//! Every mode is multiplied by `1 + prefactor · δ_ν(k)/δ_cdm(k)`, which
//! turns the CDM power into the total matter power once the host divides
//! by the total mass.

use crate::comm::Communicator;
use crate::output::{nu_power_path, total_power_path, write_nu_power, write_total_power};
use crate::powerspectrum::compute_power_spectrum;
use crate::ratio::RatioModel;
use crate::solver::NeutrinoPerturbationSolver;
use kspace_cosmo::context::CosmologyContext;
use kspace_types::error::{KspaceError, KspaceResult};
use kspace_types::state::{kval, FourierSlab};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Per-step inputs from the host simulation.
#[derive(Debug, Clone)]
pub struct GridCorrectionParams {
    /// Scale factor of this step.
    pub a: f64,
    /// Box side in internal length units.
    pub box_size: f64,
    /// Number of radial bins of the power spectrum.
    pub nbins: usize,
    /// Normalisation of the power spectrum.
    pub total_mass: f64,
    /// Write `powerspec_nu_<n>` from rank 0 when set.
    pub snapshot: Option<u32>,
    pub output_dir: PathBuf,
}

/// Binned amplitudes of one step, non-empty bins only.
#[derive(Debug, Clone, PartialEq)]
pub struct NeutrinoPower {
    pub a: f64,
    /// `ln k` with k in physical units.
    pub logk: Vec<f64>,
    pub delta_nu: Vec<f64>,
    pub delta_cdm: Vec<f64>,
    pub prefactor: f64,
}

impl NeutrinoPower {
    pub fn nbins(&self) -> usize {
        self.logk.len()
    }

    pub fn save_nu_power(&self, snapshot: u32, output_dir: &Path) -> KspaceResult<PathBuf> {
        let path = nu_power_path(output_dir, snapshot);
        write_nu_power(&path, self.a, &self.logk, &self.delta_nu)?;
        Ok(path)
    }

    /// Write the total matter power. Without a cosmology the neutrinos are
    /// ignored and the CDM power is written.
    pub fn save_total_power(
        &self,
        ctx: Option<&CosmologyContext>,
        snapshot: u32,
        output_dir: &Path,
    ) -> KspaceResult<PathBuf> {
        let delta_tot: Vec<f64> = match ctx {
            Some(ctx) => {
                let omega_nu_a3 = ctx.omega_nu_nopart(self.a) * self.a.powi(3);
                let omega_nu1 = ctx.omega_nu(1.0);
                self.delta_nu
                    .iter()
                    .zip(self.delta_cdm.iter())
                    .map(|(&dn, &dc)| get_delta_tot(dn, dc, omega_nu_a3, ctx.omega_nonu(), omega_nu1))
                    .collect()
            }
            None => self.delta_cdm.clone(),
        };
        let path = total_power_path(output_dir, snapshot);
        write_total_power(&path, self.a, &self.logk, &delta_tot)?;
        Ok(path)
    }
}

/// Total matter amplitude from the CDM and neutrino amplitudes, weighted
/// by the fraction of matter each carries.
pub fn get_delta_tot(
    delta_nu: f64,
    delta_cdm: f64,
    omega_nu_a3: f64,
    omega_nonu: f64,
    omega_nu1: f64,
) -> f64 {
    let fcdm = 1.0 - omega_nu_a3 / (omega_nonu + omega_nu1);
    fcdm * (delta_cdm + delta_nu * omega_nu_a3 / (omega_nonu + omega_nu1 - omega_nu_a3))
}

/// Mass in analytic neutrinos over the mass carried by particles.
pub fn kspace_prefactor(ctx: &CosmologyContext, a: f64) -> f64 {
    let nopart = ctx.omega_nu_nopart(a);
    nopart * a.powi(3) / (ctx.omega_nonu() + ctx.omega_nu(a) - nopart)
}

fn check_box_size(box_size: f64) -> KspaceResult<()> {
    if !box_size.is_finite() || box_size <= 0.0 {
        return Err(KspaceError::InvalidInput(format!(
            "BoxSize must be finite > 0, got {box_size}"
        )));
    }
    Ok(())
}

/// √P_cdm(k) and k in physical units on the non-empty bins.
fn cdm_amplitudes<C: Communicator + ?Sized>(
    comm: &C,
    slab: &FourierSlab,
    params: &GridCorrectionParams,
) -> KspaceResult<(Vec<f64>, Vec<f64>)> {
    check_box_size(params.box_size)?;
    let ps = compute_power_spectrum(comm, slab, params.nbins, params.total_mass)?.nonempty();
    let kfund = 2.0 * PI / params.box_size;
    let scale = kfund.powi(3);
    let delta_cdm = ps.power.iter().map(|p| (p / scale).sqrt()).collect();
    let keff = ps.keff.iter().map(|k| k * kfund).collect();
    Ok((keff, delta_cdm))
}

/// Power spectrum only, for steps without neutrinos: δ_ν is zero.
pub fn compute_cdm_power<C: Communicator + ?Sized>(
    comm: &C,
    slab: &FourierSlab,
    params: &GridCorrectionParams,
) -> KspaceResult<NeutrinoPower> {
    let (keff, delta_cdm) = cdm_amplitudes(comm, slab, params)?;
    Ok(NeutrinoPower {
        a: params.a,
        logk: keff.iter().map(|k| k.ln()).collect(),
        delta_nu: vec![0.0; delta_cdm.len()],
        delta_cdm,
        prefactor: 0.0,
    })
}

/// Multiply every mode of `slab` by `1 + prefactor · ratio(ln k)`, k in
/// physical units. The DC mode is left alone.
pub fn apply_ratio_to_grid(
    slab: &mut FourierSlab,
    box_size: f64,
    ratio: &RatioModel,
    prefactor: f64,
) -> KspaceResult<()> {
    check_box_size(box_size)?;
    let n = slab.grid_dim;
    let nz = slab.nz();
    let slab_start = slab.slab_start;
    let kfund = 2.0 * PI / box_size;
    let data = slab.data.as_slice_mut().ok_or_else(|| {
        KspaceError::InvalidInput("Fourier slab is not contiguous".to_string())
    })?;

    data.par_chunks_mut(n * nz)
        .enumerate()
        .try_for_each(|(iy, plane)| -> KspaceResult<()> {
            let ky = kval(slab_start + iy, n);
            for x in 0..n {
                let kx = kval(x, n);
                for z in 0..nz {
                    let kz = kval(z, n);
                    let k2 = kx * kx + ky * ky + kz * kz;
                    if k2 <= 0 {
                        continue;
                    }
                    let logk = ((k2 as f64).sqrt() * kfund).ln();
                    let smth = 1.0 + prefactor * ratio.evaluate_ratio(logk)?;
                    plane[x * nz + z] *= smth;
                }
            }
            Ok(())
        })
}

/// δ_ν may be neither NaN nor negative.
fn validate_delta_nu(delta_nu: &[f64], delta_cdm: &[f64], keff: &[f64]) -> KspaceResult<()> {
    if delta_nu.len() != delta_cdm.len() {
        return Err(KspaceError::InvalidInput(format!(
            "Neutrino solver returned {} bins for {} CDM bins",
            delta_nu.len(),
            delta_cdm.len()
        )));
    }
    match delta_nu.iter().position(|d| d.is_nan() || *d < 0.0) {
        Some(i) => Err(KspaceError::InvalidNeutrinoAmplitude {
            index: i,
            delta_nu: delta_nu[i],
            delta_cdm: delta_cdm[i],
            k: keff[i],
        }),
        None => Ok(()),
    }
}

/// Measure the CDM power, obtain the neutrino power from `solver`, and
/// correct this worker's slab in place.
///
/// All workers must call this together; every worker returns the same
/// `NeutrinoPower`. If the grid pass fails on any worker, every worker
/// returns an error and the slabs are left partially corrected.
pub fn add_nu_power_to_rhogrid<C, S>(
    ctx: &CosmologyContext,
    solver: &mut S,
    comm: &C,
    slab: &mut FourierSlab,
    params: &GridCorrectionParams,
) -> KspaceResult<NeutrinoPower>
where
    C: Communicator + ?Sized,
    S: NeutrinoPerturbationSolver + ?Sized,
{
    let a = params.a;
    let prefactor = kspace_prefactor(ctx, a);
    let (keff, delta_cdm) = cdm_amplitudes(comm, slab, params)?;

    if !solver.is_initialised() {
        if let Some((before, after)) = solver.history_mut().truncate_from(a) {
            if comm.rank() == 0 {
                log::info!("Truncating delta_tot to current time {a}, rows: {before} -> {after}");
            }
        }
        let time_transfer = solver.time_transfer();
        solver.history_mut().check_resume(a, time_transfer)?;
        solver.initialise(&keff, &delta_cdm)?;
    }

    let delta_nu = solver.delta_nu(a, &keff, &delta_cdm)?;
    validate_delta_nu(&delta_nu, &delta_cdm, &keff)?;
    comm.barrier()?;
    if comm.rank() == 0 {
        log::info!("Done computing neutrino power on all workers");
    }

    let logk: Vec<f64> = keff.iter().map(|k| k.ln()).collect();
    let ratio = RatioModel::build(&logk, &delta_nu, &delta_cdm)?;
    // Only the workers owning the lowest modes can fail here, so the
    // outcome is agreed on before anyone leaves the collective sequence.
    let applied = apply_ratio_to_grid(slab, params.box_size, &ratio, prefactor);
    let mut failed = [u64::from(applied.is_err())];
    comm.all_reduce_sum_u64(&mut failed)?;
    applied?;
    if failed[0] > 0 {
        return Err(KspaceError::Communication(format!(
            "Grid correction failed on {} of {} workers",
            failed[0],
            comm.size()
        )));
    }
    comm.barrier()?;
    if comm.rank() == 0 {
        log::info!("Done adding neutrinos to grid on all workers");
        if let Some(snapshot) = params.snapshot {
            let path = ratio.persist(a, snapshot, &params.output_dir)?;
            log::debug!("Wrote neutrino power to {}", path.display());
        }
    }

    Ok(NeutrinoPower {
        a,
        logk,
        delta_nu,
        delta_cdm,
        prefactor,
    })
}
