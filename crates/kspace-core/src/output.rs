// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Spectrum Output Files
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plain-text power spectrum files read by the existing analysis scripts.

use kspace_types::error::{KspaceError, KspaceResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const G_PRECISION: i32 = 6;

/// Render `x` the way C's `%g` does: six significant digits, trailing
/// zeros dropped, exponent form outside `1e-4 <= |x| < 1e6`.
pub fn format_g(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent after rounding to the target precision decides the style.
    let sci = format!("{:.*e}", (G_PRECISION - 1) as usize, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= G_PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (G_PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn create(path: &Path) -> KspaceResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| KspaceError::FileOpen {
            path: path.display().to_string(),
            source,
        })
}

/// `<dir>/powerspec_nu_<snapshot>`
pub fn nu_power_path(output_dir: &Path, snapshot: u32) -> PathBuf {
    output_dir.join(format!("powerspec_nu_{snapshot}"))
}

/// `<dir>/powerspec_tot_<snapshot:03>.txt`
pub fn total_power_path(output_dir: &Path, snapshot: u32) -> PathBuf {
    output_dir.join(format!("powerspec_tot_{snapshot:03}.txt"))
}

/// Scale factor, bin count, then one `k δ_ν²` line per bin.
pub fn write_nu_power(
    path: &Path,
    a: f64,
    logk: &[f64],
    delta_nu: &[f64],
) -> KspaceResult<()> {
    let mut w = create(path)?;
    writeln!(w, "{}", format_g(a))?;
    writeln!(w, "{}", logk.len())?;
    for (lk, dn) in logk.iter().zip(delta_nu.iter()) {
        writeln!(w, "{} {}", format_g(lk.exp()), format_g(dn * dn))?;
    }
    w.flush()?;
    Ok(())
}

/// Commented header, then one `k δ_tot²` line per bin.
pub fn write_total_power(
    path: &Path,
    a: f64,
    logk: &[f64],
    delta_tot: &[f64],
) -> KspaceResult<()> {
    let mut w = create(path)?;
    writeln!(w, "# k P_nu(k)")?;
    writeln!(w, "# a = {}", format_g(a))?;
    writeln!(w, "# nbins = {}", logk.len())?;
    for (lk, dt) in logk.iter().zip(delta_tot.iter()) {
        writeln!(w, "{} {}", format_g(lk.exp()), format_g(dt * dt))?;
    }
    w.flush()?;
    Ok(())
}
