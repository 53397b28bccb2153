//! Static figures for the topics that plot formulas rather than a live run.
//!
//! Builders read validated [`ParamValues`] and fail with the domain error of
//! the underlying distribution; the caller keeps its previous frame then.

use probviz::error::InvalidParameterError;
use probviz::prng::Prng;

use crate::distributions::{standard_normal, Continuous, ContinuousKind, Discrete, DiscreteKind};
use crate::params::ParamValues;
use crate::plot::{curve, PlotFrame, ReferenceLine, Series};
use crate::special::normal_quantile;

fn count(values: &ParamValues, key: &str) -> Result<u64, InvalidParameterError> {
    let v = values.require(key)?;
    if v < 0.0 || v.fract() != 0.0 {
        return Err(InvalidParameterError::new(key, "must be a non-negative whole number"));
    }
    Ok(v as u64)
}

fn pmf_bars(label: impl Into<String>, d: &Discrete) -> Series {
    Series::bars(label, d.support().map(|k| (k as f64, d.pmf(k))).collect())
}

pub fn binomial(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let n = count(values, "n")?;
    let p = values.require("p")?;
    let d = Discrete::binomial(n, p)?;
    Ok(PlotFrame::new(
        format!("Probability mass function of $B(n={n}, p={p})$"),
        "k",
        "P(X = k)",
    )
    .with_series(pmf_bars("PMF", &d))
    .with_note(format!("E[X] = {:.3}, Var[X] = {:.3}", d.mean(), d.variance()))
    .fit_to_data())
}

pub fn poisson(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let lambda = values.require("lambda")?;
    let d = Discrete::poisson(lambda)?;
    Ok(PlotFrame::new(
        format!("Probability mass function of $P(\\lambda={lambda:.3})$"),
        "k",
        "P(X = k)",
    )
    .with_series(pmf_bars("PMF", &d))
    .fit_to_data())
}

/// Binomial B(n, λ/n) against its Poisson limit P(λ).
pub fn poisson_theorem(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let n = count(values, "n")?;
    let lambda = values.require("lambda")?;
    let p = lambda / n as f64;
    let binom = Discrete::binomial(n, p)?;
    let poisson = Discrete::poisson(lambda)?;

    let upper = (lambda + 4.0 * lambda.sqrt()) as u64 + 1;
    let ks = 0..=upper.min(n);
    let max_gap = ks
        .clone()
        .map(|k| (binom.pmf(k) - poisson.pmf(k)).abs())
        .fold(0.0, f64::max);
    Ok(PlotFrame::new(
        format!("$B(n={n}, p={p:.3})$ - $P(\\lambda={lambda})$"),
        "k",
        "P(X = k)",
    )
    .with_series(Series::bars(
        "Binomial",
        ks.clone().map(|k| (k as f64, binom.pmf(k))).collect(),
    ))
    .with_series(Series::bars(
        "Poisson",
        ks.map(|k| (k as f64, poisson.pmf(k))).collect(),
    ))
    .with_note(format!("largest pointwise difference {max_gap:.5}"))
    .fit_to_data())
}

/// Binomial PMF with the normal curve of equal mean and variance.
pub fn central_limit(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let n = count(values, "n")?;
    let p = values.require("p")?;
    let binom = Discrete::binomial(n, p)?;
    let mu = binom.mean();
    let sigma = binom.variance().sqrt();
    let normal = Continuous::normal(mu, sigma)?;

    let lo = (mu - 4.0 * sigma).max(0.0).floor() as u64;
    let hi = (mu + 4.0 * sigma) as u64;
    Ok(PlotFrame::new(
        "Central limit theorem: binomial vs normal",
        "k",
        "Probability",
    )
    .with_series(Series::bars(
        format!("B(n={n}, p={p})"),
        (lo..=hi).map(|k| (k as f64, binom.pmf(k))).collect(),
    ))
    .with_series(curve(
        format!("N(μ={mu:.1}, σ²={:.1})", sigma * sigma),
        lo as f64,
        hi as f64,
        |x| normal.pdf(x),
    ))
    .fit_to_data())
}

pub fn one_dim_normal(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let mu = values.require("mu")?;
    let sigma = values.require("sigma")?;
    let d = Continuous::normal(mu, sigma)?;
    // Fixed axes so changes in μ and σ are visible as movement.
    let peak = Continuous::normal(0.0, 0.1)?.pdf(0.0);
    Ok(PlotFrame::new(
        format!(
            "Probability density of $N(\\mu={mu:.3}, \\sigma^2={:.3})$",
            sigma * sigma
        ),
        "x",
        "f(x)",
    )
    .with_ranges((-10.0, 10.0), (0.0, peak * 1.05))
    .with_series(curve("PDF", -10.0, 10.0, |x| d.pdf(x)))
    .with_reference(ReferenceLine::vertical("x = 0", 0.0)))
}

/// Correlated normal pairs drawn as a scatter.
pub fn two_dim_normal(
    values: &ParamValues,
    rng: &mut Prng,
) -> Result<PlotFrame, InvalidParameterError> {
    const POINTS: usize = 500;

    let mu1 = values.require("mu1")?;
    let mu2 = values.require("mu2")?;
    let sigma1 = values.require("sigma1")?;
    let sigma2 = values.require("sigma2")?;
    let rho = values.require("rho")?;
    Continuous::normal(mu1, sigma1)?;
    Continuous::normal(mu2, sigma2)?;
    if !(rho > -1.0 && rho < 1.0) {
        return Err(InvalidParameterError::new("rho", "must lie in (-1, 1)"));
    }

    let shear = (1.0 - rho * rho).sqrt();
    let points: Vec<(f64, f64)> = (0..POINTS)
        .map(|_| {
            let z1 = standard_normal(rng);
            let z2 = standard_normal(rng);
            (mu1 + sigma1 * z1, mu2 + sigma2 * (rho * z1 + shear * z2))
        })
        .collect();

    let n = POINTS as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(a, b), (x, y)| (a + x / n, b + y / n));
    let (sxx, syy, sxy) = points.iter().fold((0.0, 0.0, 0.0), |(a, b, c), (x, y)| {
        let (dx, dy) = (x - mx, y - my);
        (a + dx * dx, b + dy * dy, c + dx * dy)
    });
    let sample_rho = sxy / (sxx * syy).sqrt();

    Ok(PlotFrame::new(
        format!(
            "$N(\\mu_1={mu1:.2}, \\mu_2={mu2:.2}, \\sigma_1^2={:.2}, \\sigma_2^2={:.2}, \\rho={rho:.2})$",
            sigma1 * sigma1,
            sigma2 * sigma2
        ),
        "X",
        "Y",
    )
    .with_ranges(
        (mu1 - 4.0 * sigma1, mu1 + 4.0 * sigma1),
        (mu2 - 4.0 * sigma2, mu2 + 4.0 * sigma2),
    )
    .with_series(Series::points("Samples", points))
    .with_note(format!("sample correlation {sample_rho:.3}")))
}

/// Probabilities of the two errors of a two-sided z test (σ = 1, n = 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRates {
    pub critical_lower: f64,
    pub critical_upper: f64,
    pub alpha: f64,
    pub beta: f64,
}

pub fn error_rates(alpha: f64, mu0: f64, mu1: f64) -> Result<ErrorRates, InvalidParameterError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(InvalidParameterError::new("alpha", "must lie in (0, 1)"));
    }
    let h1 = Continuous::normal(mu1, 1.0)?;
    let z = normal_quantile(1.0 - alpha / 2.0);
    let (critical_lower, critical_upper) = (mu0 - z, mu0 + z);
    Ok(ErrorRates {
        critical_lower,
        critical_upper,
        alpha,
        beta: h1.cdf(critical_upper) - h1.cdf(critical_lower),
    })
}

pub fn two_types_of_errors(values: &ParamValues) -> Result<PlotFrame, InvalidParameterError> {
    let alpha = values.require("alpha")?;
    let mu0 = values.require("mu0")?;
    let mu1 = values.require("mu1")?;
    let rates = error_rates(alpha, mu0, mu1)?;
    let h0 = Continuous::normal(mu0, 1.0)?;
    let h1 = Continuous::normal(mu1, 1.0)?;

    let (lo, hi) = (mu0.min(mu1) - 4.0, mu0.max(mu1) + 4.0);
    Ok(PlotFrame::new(
        format!("Two types of errors: $\\alpha={alpha}, \\mu_0={mu0}, \\mu_1={mu1}$"),
        "Sample mean",
        "Density",
    )
    .with_series(curve(format!("H0: μ = {mu0}"), lo, hi, |x| h0.pdf(x)))
    .with_series(curve(format!("H1: μ = {mu1}"), lo, hi, |x| h1.pdf(x)))
    .with_reference(ReferenceLine::vertical("Critical value", rates.critical_lower))
    .with_reference(ReferenceLine::vertical("Critical value", rates.critical_upper))
    .with_note(format!("Type I error α = {alpha}"))
    .with_note(format!("Type II error β = {:.3}", rates.beta))
    .with_ranges((lo, hi), (0.0, h0.pdf(mu0) * 1.1)))
}

/// Sample sizes compared by the consistency figure.
pub fn consistency_sample_sizes(n: u64) -> Vec<u64> {
    let mut sizes: Vec<u64> = [2, n / 4, n / 2, n / 4 * 3, n]
        .into_iter()
        .map(|s| s.max(2))
        .collect();
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}

/// Density histogram of sample means for growing sample sizes.
pub fn point_estimation(
    values: &ParamValues,
    rng: &mut Prng,
) -> Result<PlotFrame, InvalidParameterError> {
    const BINS: usize = 30;

    let mu = values.require("mu")?;
    let sigma = values.require("sigma")?;
    let n = count(values, "n")?;
    let population = Continuous::normal(mu, sigma)?;

    let (lo, hi) = (mu - 3.0 * sigma, mu + 3.0 * sigma);
    let mut frame = PlotFrame::new(
        "Consistency of the sample mean",
        "Sample mean",
        "Density",
    );
    for size in consistency_sample_sizes(n) {
        let repeats = (2000 / size).clamp(100, 1000);
        let estimates: Vec<f64> = (0..repeats)
            .map(|_| {
                (0..size)
                    .filter_map(|_| population.sample(rng))
                    .sum::<f64>()
                    / size as f64
            })
            .collect();
        let spread = (estimates.iter().map(|e| (e - mu).powi(2)).sum::<f64>()
            / estimates.len() as f64)
            .sqrt();
        frame = frame
            .with_series(Series::line(
                format!("n={size}"),
                histogram(&estimates, lo, hi, BINS),
            ))
            .with_note(format!("n={size}: RMS error of the mean {spread:.4}"));
    }
    Ok(frame
        .with_reference(ReferenceLine::vertical(format!("μ={mu}"), mu))
        .with_ranges((lo, hi), (0.0, BINS as f64 / (hi - lo))))
}

/// Density histogram evaluated at bin centers; values outside are dropped.
pub fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<(f64, f64)> {
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0u64; bins];
    for &v in values.iter().filter(|v| (lo..hi).contains(*v)) {
        let i = (((v - lo) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    let total = values.len().max(1) as f64;
    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (lo + width * (i as f64 + 0.5), c as f64 / (total * width)))
        .collect()
}

/// PMF bars with a CDF step line.
pub fn discrete_distribution(
    kind: DiscreteKind,
    values: &ParamValues,
) -> Result<PlotFrame, InvalidParameterError> {
    let d = kind.build(values)?;
    let support = d.support();
    let cdf = support.clone().map(|k| (k as f64, d.cdf(k))).collect();
    let (lo, hi) = (*support.start() as f64 - 0.5, *support.end() as f64 + 0.5);
    Ok(PlotFrame::new(
        format!("{} distribution", kind.display_name()),
        "k",
        "Probability",
    )
    .with_ranges((lo, hi), (0.0, 1.1))
    .with_series(pmf_bars("PMF", &d))
    .with_series(Series::line("CDF", cdf))
    .with_note(format!("E[X] = {:.4}, Var[X] = {:.4}", d.mean(), d.variance())))
}

/// PDF and CDF curves.
pub fn continuous_distribution(
    kind: ContinuousKind,
    values: &ParamValues,
) -> Result<PlotFrame, InvalidParameterError> {
    let d = kind.build(values)?;
    let (lo, hi) = d.plot_range();
    let pdf = curve("PDF", lo, hi, |x| d.pdf(x));
    let peak = pdf
        .points
        .iter()
        .map(|p| p.1)
        .filter(|y| y.is_finite())
        .fold(1.0, f64::max);
    Ok(PlotFrame::new(
        format!("{} distribution", kind.display_name()),
        "x",
        "Density",
    )
    .with_ranges((lo, hi), (0.0, peak * 1.1))
    .with_series(pdf)
    .with_series(curve("CDF", lo, hi, |x| d.cdf(x)))
    .with_note(format!("E[X] = {:.4}, Var[X] = {:.4}", d.mean(), d.variance())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn binomial_figure_has_one_bar_per_outcome() {
        let values = ParamValues::defaults(params::binomial());
        let frame = binomial(&values).unwrap();
        assert_eq!(frame.series[0].points.len(), 11);
        let total: f64 = frame.series[0].points.iter().map(|p| p.1).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn binomial_endpoint_probability_is_a_domain_error() {
        let mut values = ParamValues::defaults(params::binomial());
        values.set("p", 1.0).unwrap();
        assert_eq!(binomial(&values).unwrap_err().name, "p");
    }

    #[test]
    fn poisson_zero_rate_is_a_domain_error() {
        let mut values = ParamValues::defaults(params::poisson());
        values.set("lambda", 0.0).unwrap();
        assert!(poisson(&values).is_err());
    }

    #[test]
    fn poisson_theorem_gap_is_small_for_large_n() {
        let mut values = ParamValues::defaults(params::poisson_theorem());
        values.set("n", 400.0).unwrap();
        let frame = poisson_theorem(&values).unwrap();
        let (b, p) = (&frame.series[0].points, &frame.series[1].points);
        let gap = b.iter().zip(p).map(|(x, y)| (x.1 - y.1).abs()).fold(0.0, f64::max);
        assert!(gap < 0.005);
    }

    #[test]
    fn error_rates_match_z_test() {
        let rates = error_rates(0.05, 0.0, 1.0).unwrap();
        assert!((rates.critical_upper - 1.959_964).abs() < 1e-5);
        assert!((rates.critical_lower + 1.959_964).abs() < 1e-5);
        // β = Φ(0.959964) - Φ(-2.959964)
        assert!((rates.beta - 0.829_925).abs() < 1e-4);

        let frame = two_types_of_errors(&ParamValues::defaults(params::two_types_of_errors())).unwrap();
        assert_eq!(frame.reference_lines.len(), 2);
        assert!(frame.notes.iter().any(|n| n.contains("β = 0.83")));
    }

    #[test]
    fn consistency_sizes_are_sorted_and_unique() {
        assert_eq!(consistency_sample_sizes(30), vec![2, 7, 15, 21, 30]);
        assert_eq!(consistency_sample_sizes(4), vec![2, 3, 4]);
    }

    #[test]
    fn sample_mean_concentrates_as_n_grows() {
        let mut values = ParamValues::defaults(params::point_estimation());
        values.set("n", 400.0).unwrap();
        let frame = point_estimation(&values, &mut Prng::new(9)).unwrap();
        assert_eq!(frame.series.len(), 5);
        let peak = |i: usize| frame.series[i].points.iter().map(|p| p.1).fold(0.0, f64::max);
        assert!(peak(4) > peak(0));
    }

    #[test]
    fn two_dim_samples_follow_correlation() {
        let mut values = ParamValues::defaults(params::two_dim_normal());
        values.set("rho", 0.9).unwrap();
        let frame = two_dim_normal(&values, &mut Prng::new(4)).unwrap();
        assert_eq!(frame.series[0].points.len(), 500);
        let note = &frame.notes[0];
        let rho: f64 = note.rsplit(' ').next().unwrap().parse().unwrap();
        assert!((rho - 0.9).abs() < 0.05);
    }

    #[test]
    fn histogram_integrates_to_inside_share() {
        let h = histogram(&[0.1, 0.2, 0.9, 5.0], 0.0, 1.0, 4);
        let area: f64 = h.iter().map(|p| p.1 * 0.25).sum();
        assert!((area - 0.75).abs() < 1e-12);
    }

    #[test]
    fn every_distribution_kind_renders() {
        for &kind in DiscreteKind::all() {
            let frame = discrete_distribution(kind, &ParamValues::defaults(kind.params())).unwrap();
            assert_eq!(frame.series.len(), 2);
        }
        for &kind in ContinuousKind::all() {
            let frame =
                continuous_distribution(kind, &ParamValues::defaults(kind.params())).unwrap();
            assert!(frame.y_range.1.is_finite());
        }
    }
}
