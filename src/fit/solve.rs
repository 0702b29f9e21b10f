use std::f64::consts::{LN_2, LN_10};

use crate::error::{AttenError, AttenResult};
use crate::fit::{ErrorScale, FitModel, FitOptions, FitResult, FitWarning};

/// Weighted least-squares fit of `responses` against `thicknesses`.
pub fn fit(
    thicknesses: &[f64],
    responses: &[f64],
    weights: &[f64],
    options: FitOptions,
) -> AttenResult<FitResult> {
    fit_labeled("fit", thicknesses, responses, weights, options)
}

#[derive(Debug, Default)]
struct Sums {
    s: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    sxy: f64,
}

pub(crate) fn fit_labeled(
    label: &str,
    thicknesses: &[f64],
    responses: &[f64],
    weights: &[f64],
    options: FitOptions,
) -> AttenResult<FitResult> {
    let n = thicknesses.len();
    if responses.len() != n || weights.len() != n {
        return Err(AttenError::config(
            label,
            format!(
                "input length mismatch: {} thicknesses, {} responses, {} weights",
                n,
                responses.len(),
                weights.len()
            ),
        ));
    }
    let params = options.model.free_parameters();
    if n < params + 1 {
        return Err(AttenError::FitUnderdetermined {
            config: label.to_string(),
            points: n,
            parameters: params,
        });
    }

    let mut sums = Sums::default();
    for i in 0..n {
        let (x, y, w) = (thicknesses[i], responses[i], weights[i]);
        if !(x.is_finite() && y.is_finite()) {
            return Err(AttenError::config(
                label,
                format!("non-finite point {} ({}, {})", i, x, y),
            ));
        }
        if !(w.is_finite() && w > 0.0) {
            return Err(AttenError::config(
                label,
                format!("weight {} must be positive, got {}", i, w),
            ));
        }
        sums.s += w;
        sums.sx += w * x;
        sums.sy += w * y;
        sums.sxx += w * x * x;
        sums.sxy += w * x * y;
    }

    let singular = || AttenError::FitUnderdetermined {
        config: label.to_string(),
        points: n,
        parameters: params,
    };

    // (slope, var_slope, intercept, var_intercept)
    let (slope, var_slope, intercept, var_intercept) = match options.model {
        FitModel::Proportional => {
            if sums.sxx <= 0.0 {
                return Err(singular());
            }
            (sums.sxy / sums.sxx, 1.0 / sums.sxx, 0.0, None)
        }
        FitModel::Linear => {
            let det = sums.s * sums.sxx - sums.sx * sums.sx;
            if det <= f64::EPSILON * sums.s * sums.sxx {
                return Err(singular());
            }
            (
                (sums.s * sums.sxy - sums.sx * sums.sy) / det,
                sums.s / det,
                (sums.sxx * sums.sy - sums.sx * sums.sxy) / det,
                Some(sums.sxx / det),
            )
        }
    };

    let chi_square: f64 = (0..n)
        .map(|i| {
            let r = responses[i] - (intercept + slope * thicknesses[i]);
            weights[i] * r * r
        })
        .sum();
    let ndf = n - params;

    let scale = match options.error_scale {
        ErrorScale::Absolute => 1.0,
        ErrorScale::Relative => chi_square / ndf as f64,
    };

    let mut warnings = Vec::new();
    let (half_value_layer, tenth_value_layer) = if slope > 0.0 {
        (Some(LN_2 / slope), Some(LN_10 / slope))
    } else {
        tracing::warn!(fit = %label, slope, "non-positive slope; data not attenuating");
        warnings.push(FitWarning::NonPositiveSlope { slope });
        (None, None)
    };

    Ok(FitResult {
        model: options.model,
        slope,
        slope_error: (var_slope * scale).sqrt(),
        intercept,
        intercept_error: var_intercept.map(|v| (v * scale).sqrt()),
        chi_square,
        ndf,
        half_value_layer,
        tenth_value_layer,
        points: n,
        warnings,
    })
}
