// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — End-to-End Grid Correction Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Full pipeline on small grids, serial and split over in-process workers.

use kspace_core::comm::{LocalGroup, SerialComm, SlabDecomposition};
use kspace_core::driver::{add_nu_power_to_rhogrid, GridCorrectionParams, NeutrinoPower};
use kspace_core::powerspectrum::compute_power_spectrum;
use kspace_core::solver::TransferRatioSolver;
use kspace_cosmo::context::CosmologyContext;
use kspace_types::error::{KspaceError, KspaceResult};
use kspace_types::state::FourierSlab;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(n: usize, seed: u64) -> FourierSlab {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut slab = FourierSlab::zeros(n, 0, n);
    for v in slab.data.iter_mut() {
        *v = Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    }
    slab
}

fn split(full: &FourierSlab, nworkers: usize) -> Vec<FourierSlab> {
    SlabDecomposition::decompose(full.grid_dim, nworkers)
        .unwrap()
        .iter()
        .map(|d| full.sub_slab(d.slab_start, d.slab_count).unwrap())
        .collect()
}

fn solver() -> TransferRatioSolver {
    let logk: Vec<f64> = (0..8).map(|i| -6.0 + i as f64).collect();
    let t_nu: Vec<f64> = logk.iter().map(|lk| 0.6 / (1.0 + (lk + 2.0).exp())).collect();
    TransferRatioSolver::new(logk, t_nu, 0.2).unwrap()
}

fn params(n_bins: usize, snapshot: Option<u32>, dir: &str) -> GridCorrectionParams {
    let output_dir = std::env::temp_dir().join(dir);
    std::fs::create_dir_all(&output_dir).unwrap();
    GridCorrectionParams {
        a: 0.2,
        box_size: 256.0,
        nbins: n_bins,
        total_mass: 1.0,
        snapshot,
        output_dir,
    }
}

#[test]
fn single_mode_16_cubed_concentrates_power() {
    let n = 16;
    let mut slab = FourierSlab::zeros(n, 0, n);
    slab.set(0, 1, 0, Complex64::new(1.0, 0.0));

    let ps = compute_power_spectrum(&SerialComm, &slab, 8, 1.0).unwrap();
    let loaded: Vec<usize> = (0..8).filter(|&i| ps.power[i] != 0.0).collect();
    assert_eq!(loaded, vec![0]);
    assert_eq!(ps.total_count(), (n * n * n - 1) as u64);
    // Eight bins are too coarse to separate |k| = 1 from |k| = √2.
    assert!(ps.keff[0] >= 1.0 && ps.keff[0] < 2f64.sqrt());

    let fine = compute_power_spectrum(&SerialComm, &slab, 16, 1.0).unwrap();
    let loaded: Vec<usize> = (0..16).filter(|&i| fine.power[i] != 0.0).collect();
    assert_eq!(loaded, vec![0]);
    assert_eq!(fine.keff[0], 1.0);
    // (±1,0,0), (0,±1,0) once each; (0,0,1) stands for itself and its conjugate.
    assert_eq!(fine.count[0], 6);
}

#[test]
fn worker_split_matches_serial_spectrum() {
    let n = 12;
    let full = random_grid(n, 7);
    let serial = compute_power_spectrum(&SerialComm, &full, 10, 3.0).unwrap();
    for nworkers in [2usize, 3, 5] {
        let group = LocalGroup::new(nworkers).unwrap();
        let results = group
            .run_each(split(&full, nworkers), |comm, slab| {
                compute_power_spectrum(&comm, &slab, 10, 3.0)
            })
            .unwrap();
        let first = results[0].as_ref().unwrap();
        for r in &results {
            // Every worker holds the same reduced bits.
            assert_eq!(r.as_ref().unwrap(), first);
        }
        assert_eq!(first.count, serial.count);
        for i in 0..10 {
            let tol = 1e-12 * serial.power[i].abs().max(1e-300);
            assert!(
                (first.power[i] - serial.power[i]).abs() <= tol,
                "{nworkers} workers, bin {i}: {} vs {}",
                first.power[i],
                serial.power[i]
            );
            assert!((first.keff[i] - serial.keff[i]).abs() <= 1e-12 * serial.keff[i].max(1.0));
        }
    }
}

#[test]
fn worker_split_matches_serial_correction() {
    let n = 12;
    let ctx = CosmologyContext::new(&[0.1, 0.1, 0.1], 0.3, 0.2, 0.7, 1.0).unwrap();
    let full = random_grid(n, 11);
    let p = params(8, None, "kspace_e2e_split");

    let mut serial_grid = full.clone();
    let mut serial_solver = solver();
    let serial_np =
        add_nu_power_to_rhogrid(&ctx, &mut serial_solver, &SerialComm, &mut serial_grid, &p)
            .unwrap();
    assert!(serial_np.prefactor > 0.0);

    let nworkers = 3;
    let group = LocalGroup::new(nworkers).unwrap();
    let states: Vec<(FourierSlab, TransferRatioSolver)> =
        split(&full, nworkers).into_iter().map(|s| (s, solver())).collect();
    let results: Vec<KspaceResult<(FourierSlab, NeutrinoPower)>> = group
        .run_each(states, |comm, (mut slab, mut s)| -> KspaceResult<_> {
            let np = add_nu_power_to_rhogrid(&ctx, &mut s, &comm, &mut slab, &p)?;
            Ok((slab, np))
        })
        .unwrap();

    let first_np = results[0].as_ref().unwrap().1.clone();
    assert_eq!(first_np.nbins(), serial_np.nbins());
    for r in &results {
        let (slab, np) = r.as_ref().unwrap();
        assert_eq!(np, &first_np);
        for y in slab.slab_start..slab.slab_start + slab.slab_count() {
            for x in 0..n {
                for z in 0..slab.nz() {
                    let got = slab.get(y, x, z);
                    let want = serial_grid.get(y, x, z);
                    assert!((got - want).norm() <= 1e-10 * want.norm().max(1e-12));
                }
            }
        }
    }
}

#[test]
fn grid_failure_on_some_workers_reaches_every_worker() {
    let n = 32;
    let ctx = CosmologyContext::new(&[0.1, 0.1, 0.1], 0.3, 0.2, 0.7, 1.0).unwrap();
    let full = random_grid(n, 19);
    // Four bins put the first knot near |k| = 2.34, more than a factor of
    // two above the fundamental mode.
    let p = params(4, None, "kspace_e2e_partial_failure");

    let err = add_nu_power_to_rhogrid(&ctx, &mut solver(), &SerialComm, &mut full.clone(), &p)
        .expect_err("fundamental mode below table");
    assert!(matches!(err, KspaceError::WavenumberBelowTable { .. }));

    let nworkers = 4;
    let group = LocalGroup::new(nworkers).unwrap();
    let states: Vec<(FourierSlab, TransferRatioSolver)> =
        split(&full, nworkers).into_iter().map(|s| (s, solver())).collect();
    let results = group
        .run_each(states, |comm, (mut slab, mut s)| {
            add_nu_power_to_rhogrid(&ctx, &mut s, &comm, &mut slab, &p)
        })
        .unwrap();
    for (rank, r) in results.iter().enumerate() {
        match r {
            // Rows 0, 1 and 31 carry the |k| = 1 modes.
            Err(KspaceError::WavenumberBelowTable { .. }) => assert!(rank == 0 || rank == 3),
            Err(KspaceError::Communication(msg)) => {
                assert!(rank == 1 || rank == 2);
                assert!(msg.contains("2 of 4"), "{msg}");
            }
            other => panic!("Unexpected result on rank {rank}: {other:?}"),
        }
    }
}

#[test]
fn correction_persists_neutrino_power_on_rank_zero() {
    let n = 8;
    let ctx = CosmologyContext::new(&[0.06, 0.0, 0.0], 0.3, 0.2, 0.7, 1.0).unwrap();
    let mut slab = random_grid(n, 3);
    let p = params(6, Some(5), "kspace_e2e_persist");
    let np = add_nu_power_to_rhogrid(&ctx, &mut solver(), &SerialComm, &mut slab, &p).unwrap();

    let text = std::fs::read_to_string(p.output_dir.join("powerspec_nu_5")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "0.2");
    assert_eq!(lines[1], np.nbins().to_string());
    assert_eq!(lines.len(), np.nbins() + 2);

    let total = np.save_total_power(Some(&ctx), 5, &p.output_dir).unwrap();
    let text = std::fs::read_to_string(total).unwrap();
    assert!(text.starts_with("# k P_nu(k)\n# a = 0.2\n"));
    assert_eq!(text.lines().count(), np.nbins() + 3);
}
