use anyhow::Result;

use crate::ctx::Ctx;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let degenerate = ctx.records.iter().filter(|r| r.is_degenerate()).count();
    let materials = {
        let mut names: Vec<&str> = ctx.records.iter().map(|r| r.material.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    };

    let mut out = String::new();
    out.push_str(&format!("gamma-atten v{}\n", version));
    out.push_str(&format!(
        "Runs: {} ({} degenerate), materials={}\n",
        ctx.records.len(),
        degenerate,
        if materials.is_empty() {
            "none".to_string()
        } else {
            materials.join(",")
        }
    ));

    for f in &ctx.fits {
        let hvl = f
            .fit
            .half_value_layer
            .map(|v| format!("{:.3} cm", v))
            .unwrap_or_else(|| "undefined".to_string());
        let reduced = f
            .fit
            .reduced_chi_square()
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| "NA".to_string());
        out.push_str(&format!(
            "Fit {}: mu={:.5} +/- {:.5} cm^-1, chi2={:.3}, ndf={}, chi2/ndf={}, HVL={}\n",
            f.label(),
            f.fit.slope,
            f.fit.slope_error,
            f.fit.chi_square,
            f.fit.ndf,
            reduced,
            hvl
        ));
    }

    for c in &ctx.comparisons {
        if let (Some(max), Some(min)) = (&c.max_difference, &c.min_difference) {
            out.push_str(&format!(
                "Compare {}: max {:+.1}% at {} MeV, min {:+.1}% at {} MeV\n",
                c.material, max.difference_percent, max.energy, min.difference_percent, min.energy
            ));
        }
        if let Some(cal) = &c.calibration {
            out.push_str(&format!(
                "Compare {} @ {:.0} keV: reference={:.4} measured={:.4} cm^2/g ({:+.1}%)\n",
                c.material,
                cal.energy_kev(),
                cal.mu_rho_reference,
                cal.mu_rho_measured,
                cal.difference_percent
            ));
        }
    }

    if let Some(contrast) = &ctx.contrast {
        if let Some(factor) = contrast.attenuation_factor {
            out.push_str(&format!("Attenuation factor across materials: {:.1}x\n", factor));
        }
    }

    Ok(out)
}
