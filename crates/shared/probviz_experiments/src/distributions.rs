//! Validated probability distributions behind the static figures.
//!
//! Every constructor checks its domain and returns
//! [`InvalidParameterError`] instead of producing NaN curves.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use probviz::error::InvalidParameterError;
use probviz::prng::Prng;

use crate::params::{ParamSpec, ParamValues};
use crate::special::{
    incomplete_beta, incomplete_gamma, ln_beta, ln_choose, ln_gamma, normal_cdf, normal_pdf,
};

fn check(ok: bool, name: &str, reason: &str) -> Result<(), InvalidParameterError> {
    if ok {
        Ok(())
    } else {
        Err(InvalidParameterError::new(name, reason))
    }
}

fn whole(value: f64, name: &str) -> Result<u64, InvalidParameterError> {
    check(
        value.is_finite() && value >= 0.0 && value.fract() == 0.0,
        name,
        "must be a non-negative whole number",
    )?;
    Ok(value as u64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Discrete {
    Bernoulli { p: f64 },
    Binomial { n: u64, p: f64 },
    Poisson { lambda: f64 },
    /// `draws` taken without replacement from `population` items, of which
    /// `successes` are marked.
    Hypergeometric { population: u64, successes: u64, draws: u64 },
    /// Trials up to and including the first success.
    Geometric { p: f64 },
    /// Failures before the `r`-th success.
    NegativeBinomial { r: f64, p: f64 },
}

impl Discrete {
    pub fn bernoulli(p: f64) -> Result<Self, InvalidParameterError> {
        check(p > 0.0 && p < 1.0, "p", "must lie in (0, 1)")?;
        Ok(Self::Bernoulli { p })
    }

    pub fn binomial(n: u64, p: f64) -> Result<Self, InvalidParameterError> {
        check(n >= 1, "n", "must be at least 1")?;
        check(p > 0.0 && p < 1.0, "p", "must lie in (0, 1)")?;
        Ok(Self::Binomial { n, p })
    }

    pub fn poisson(lambda: f64) -> Result<Self, InvalidParameterError> {
        check(lambda > 0.0 && lambda.is_finite(), "lambda", "must be positive")?;
        Ok(Self::Poisson { lambda })
    }

    pub fn hypergeometric(
        population: u64,
        successes: u64,
        draws: u64,
    ) -> Result<Self, InvalidParameterError> {
        check(population >= 1, "population", "must be at least 1")?;
        check(
            successes <= population,
            "successes",
            "cannot exceed the population size",
        )?;
        check(draws <= population, "draws", "cannot exceed the population size")?;
        Ok(Self::Hypergeometric {
            population,
            successes,
            draws,
        })
    }

    pub fn geometric(p: f64) -> Result<Self, InvalidParameterError> {
        check(p > 0.0 && p <= 1.0, "p", "must lie in (0, 1]")?;
        Ok(Self::Geometric { p })
    }

    pub fn negative_binomial(r: f64, p: f64) -> Result<Self, InvalidParameterError> {
        check(r > 0.0 && r.is_finite(), "r", "must be positive")?;
        check(p > 0.0 && p <= 1.0, "p", "must lie in (0, 1]")?;
        Ok(Self::NegativeBinomial { r, p })
    }

    pub fn pmf(&self, k: u64) -> f64 {
        let kf = k as f64;
        match *self {
            Self::Bernoulli { p } => match k {
                0 => 1.0 - p,
                1 => p,
                _ => 0.0,
            },
            Self::Binomial { n, p } => {
                if k > n {
                    return 0.0;
                }
                (ln_choose(n, k) + kf * p.ln() + (n - k) as f64 * (1.0 - p).ln()).exp()
            }
            Self::Poisson { lambda } => (kf * lambda.ln() - lambda - ln_gamma(kf + 1.0)).exp(),
            Self::Hypergeometric {
                population,
                successes,
                draws,
            } => {
                if k > draws || k > successes || draws - k > population - successes {
                    return 0.0;
                }
                (ln_choose(successes, k) + ln_choose(population - successes, draws - k)
                    - ln_choose(population, draws))
                .exp()
            }
            Self::Geometric { p } => {
                if k == 0 {
                    0.0
                } else {
                    (1.0 - p).powf(kf - 1.0) * p
                }
            }
            Self::NegativeBinomial { r, p } => {
                let ln_coeff = ln_gamma(kf + r) - ln_gamma(r) - ln_gamma(kf + 1.0);
                ln_coeff.exp() * p.powf(r) * (1.0 - p).powf(kf)
            }
        }
    }

    pub fn cdf(&self, k: u64) -> f64 {
        let lo = *self.support().start();
        if k < lo {
            return 0.0;
        }
        (lo..=k).map(|i| self.pmf(i)).sum::<f64>().min(1.0)
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Self::Bernoulli { p } => p,
            Self::Binomial { n, p } => n as f64 * p,
            Self::Poisson { lambda } => lambda,
            Self::Hypergeometric {
                population,
                successes,
                draws,
            } => draws as f64 * successes as f64 / population as f64,
            Self::Geometric { p } => 1.0 / p,
            Self::NegativeBinomial { r, p } => r * (1.0 - p) / p,
        }
    }

    pub fn variance(&self) -> f64 {
        match *self {
            Self::Bernoulli { p } => p * (1.0 - p),
            Self::Binomial { n, p } => n as f64 * p * (1.0 - p),
            Self::Poisson { lambda } => lambda,
            Self::Hypergeometric {
                population,
                successes,
                draws,
            } => {
                if population < 2 {
                    return 0.0;
                }
                let m = population as f64;
                let k = successes as f64;
                let n = draws as f64;
                n * (k / m) * ((m - k) / m) * ((m - n) / (m - 1.0))
            }
            Self::Geometric { p } => (1.0 - p) / (p * p),
            Self::NegativeBinomial { r, p } => r * (1.0 - p) / (p * p),
        }
    }

    /// Values worth plotting: the full support when it is finite, otherwise
    /// a window holding almost all of the mass.
    pub fn support(&self) -> RangeInclusive<u64> {
        match *self {
            Self::Bernoulli { .. } => 0..=1,
            Self::Binomial { n, .. } => 0..=n,
            Self::Poisson { lambda } => 0..=(lambda + 4.0 * lambda.sqrt()).max(10.0) as u64,
            Self::Hypergeometric {
                population,
                successes,
                draws,
            } => (draws + successes).saturating_sub(population)..=draws.min(successes),
            Self::Geometric { .. } => 1..=20,
            Self::NegativeBinomial { r, p } => {
                let tail = self.mean() + 4.0 * (r * (1.0 - p)).sqrt() / p;
                0..=tail.max(19.0) as u64
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Continuous {
    Uniform { a: f64, b: f64 },
    Normal { mu: f64, sigma: f64 },
    Exponential { lambda: f64 },
    StudentT { df: f64 },
    /// Shape/rate parameterization.
    Gamma { shape: f64, rate: f64 },
    Beta { alpha: f64, beta: f64 },
}

impl Continuous {
    pub fn uniform(a: f64, b: f64) -> Result<Self, InvalidParameterError> {
        check(a.is_finite() && b.is_finite(), "a", "bounds must be finite")?;
        check(a < b, "b", "must be greater than a")?;
        Ok(Self::Uniform { a, b })
    }

    pub fn normal(mu: f64, sigma: f64) -> Result<Self, InvalidParameterError> {
        check(mu.is_finite(), "mu", "must be finite")?;
        check(sigma > 0.0 && sigma.is_finite(), "sigma", "must be positive")?;
        Ok(Self::Normal { mu, sigma })
    }

    pub fn exponential(lambda: f64) -> Result<Self, InvalidParameterError> {
        check(lambda > 0.0 && lambda.is_finite(), "lambda", "must be positive")?;
        Ok(Self::Exponential { lambda })
    }

    pub fn student_t(df: f64) -> Result<Self, InvalidParameterError> {
        check(df > 0.0 && df.is_finite(), "df", "must be positive")?;
        Ok(Self::StudentT { df })
    }

    pub fn gamma(shape: f64, rate: f64) -> Result<Self, InvalidParameterError> {
        check(shape > 0.0 && shape.is_finite(), "alpha", "must be positive")?;
        check(rate > 0.0 && rate.is_finite(), "beta", "must be positive")?;
        Ok(Self::Gamma { shape, rate })
    }

    pub fn beta(alpha: f64, beta: f64) -> Result<Self, InvalidParameterError> {
        check(alpha > 0.0 && alpha.is_finite(), "alpha", "must be positive")?;
        check(beta > 0.0 && beta.is_finite(), "beta", "must be positive")?;
        Ok(Self::Beta { alpha, beta })
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match *self {
            Self::Uniform { a, b } => {
                if (a..=b).contains(&x) {
                    1.0 / (b - a)
                } else {
                    0.0
                }
            }
            Self::Normal { mu, sigma } => normal_pdf((x - mu) / sigma) / sigma,
            Self::Exponential { lambda } => {
                if x < 0.0 {
                    0.0
                } else {
                    lambda * (-lambda * x).exp()
                }
            }
            Self::StudentT { df } => {
                let half = df / 2.0;
                (ln_gamma(half + 0.5)
                    - 0.5 * (df * std::f64::consts::PI).ln()
                    - ln_gamma(half)
                    - (half + 0.5) * (1.0 + x * x / df).ln())
                .exp()
            }
            Self::Gamma { shape, rate } => {
                if x < 0.0 {
                    return 0.0;
                }
                if x == 0.0 {
                    return edge_density(shape, rate);
                }
                (shape * rate.ln() + (shape - 1.0) * x.ln() - rate * x - ln_gamma(shape)).exp()
            }
            Self::Beta { alpha, beta } => {
                if !(0.0..=1.0).contains(&x) {
                    return 0.0;
                }
                if x == 0.0 {
                    return edge_density(alpha, beta);
                }
                if x == 1.0 {
                    return edge_density(beta, alpha);
                }
                ((alpha - 1.0) * x.ln() + (beta - 1.0) * (1.0 - x).ln() - ln_beta(alpha, beta))
                    .exp()
            }
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            Self::Uniform { a, b } => ((x - a) / (b - a)).clamp(0.0, 1.0),
            Self::Normal { mu, sigma } => normal_cdf((x - mu) / sigma),
            Self::Exponential { lambda } => {
                if x <= 0.0 {
                    0.0
                } else {
                    1.0 - (-lambda * x).exp()
                }
            }
            Self::StudentT { df } => {
                let tail = incomplete_beta(df / (df + x * x), df / 2.0, 0.5) / 2.0;
                if x >= 0.0 {
                    1.0 - tail
                } else {
                    tail
                }
            }
            Self::Gamma { shape, rate } => incomplete_gamma(shape, rate * x),
            Self::Beta { alpha, beta } => incomplete_beta(x, alpha, beta),
        }
    }

    /// NaN where the moment does not exist.
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Uniform { a, b } => (a + b) / 2.0,
            Self::Normal { mu, .. } => mu,
            Self::Exponential { lambda } => 1.0 / lambda,
            Self::StudentT { df } => {
                if df > 1.0 {
                    0.0
                } else {
                    f64::NAN
                }
            }
            Self::Gamma { shape, rate } => shape / rate,
            Self::Beta { alpha, beta } => alpha / (alpha + beta),
        }
    }

    /// NaN where undefined, infinity where it diverges.
    pub fn variance(&self) -> f64 {
        match *self {
            Self::Uniform { a, b } => (b - a).powi(2) / 12.0,
            Self::Normal { sigma, .. } => sigma * sigma,
            Self::Exponential { lambda } => 1.0 / (lambda * lambda),
            Self::StudentT { df } => {
                if df > 2.0 {
                    df / (df - 2.0)
                } else if df > 1.0 {
                    f64::INFINITY
                } else {
                    f64::NAN
                }
            }
            Self::Gamma { shape, rate } => shape / (rate * rate),
            Self::Beta { alpha, beta } => {
                let s = alpha + beta;
                alpha * beta / (s * s * (s + 1.0))
            }
        }
    }

    /// Horizontal window for plotting.
    pub fn plot_range(&self) -> (f64, f64) {
        match *self {
            Self::Uniform { a, b } => {
                let pad = 0.1 * (b - a);
                (a - pad, b + pad)
            }
            Self::Normal { mu, sigma } => (mu - 4.0 * sigma, mu + 4.0 * sigma),
            Self::Exponential { lambda } => (0.0, 5.0 / lambda),
            Self::StudentT { .. } => (-5.0, 5.0),
            Self::Gamma { .. } => (0.0, (self.mean() + 4.0 * self.variance().sqrt()).max(10.0)),
            Self::Beta { .. } => (0.0, 1.0),
        }
    }

    /// Only the families with a closed-form inverse are sampled directly.
    pub fn sample(&self, rng: &mut Prng) -> Option<f64> {
        match *self {
            Self::Uniform { a, b } => Some(rng.gen_range_f64(a, b)),
            Self::Normal { mu, sigma } => Some(mu + sigma * standard_normal(rng)),
            Self::Exponential { lambda } => Some(-(1.0 - rng.next_f64_01()).ln() / lambda),
            _ => None,
        }
    }
}

// Density at the left edge of x^(a-1) * ... families.
fn edge_density(a: f64, scale: f64) -> f64 {
    if a < 1.0 {
        f64::INFINITY
    } else if a == 1.0 {
        scale
    } else {
        0.0
    }
}

/// One standard normal draw (Box-Muller, cosine branch).
pub fn standard_normal(rng: &mut Prng) -> f64 {
    let u1 = 1.0 - rng.next_f64_01();
    let u2 = rng.next_f64_01();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

macro_rules! kind_enum {
    ($name:ident { $($variant:ident => $label:literal, $display:literal;)* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)*
                }
            }

            pub fn display_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $display,)*
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant,)*]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = InvalidParameterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::all()
                    .iter()
                    .copied()
                    .find(|k| k.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        let names: Vec<_> = Self::all().iter().map(|k| k.label()).collect();
                        InvalidParameterError::new(
                            "dist",
                            format!("unknown distribution `{s}` (expected {})", names.join("|")),
                        )
                    })
            }
        }
    };
}

kind_enum!(DiscreteKind {
    Bernoulli => "bernoulli", "Bernoulli";
    Binomial => "binomial", "Binomial";
    Poisson => "poisson", "Poisson";
    Hypergeometric => "hypergeometric", "Hypergeometric";
    Geometric => "geometric", "Geometric";
    NegativeBinomial => "negative_binomial", "Negative binomial";
});

kind_enum!(ContinuousKind {
    Uniform => "uniform", "Uniform";
    Normal => "normal", "Normal";
    Exponential => "exponential", "Exponential";
    StudentT => "t", "Student's t";
    Gamma => "gamma", "Gamma";
    Beta => "beta", "Beta";
});

impl DiscreteKind {
    pub fn params(self) -> Vec<ParamSpec> {
        let p = ParamSpec::real("p", "p", "Success probability.", 0.01, 0.99, 0.01, 0.5);
        match self {
            Self::Bernoulli | Self::Geometric => vec![p],
            Self::Binomial => vec![
                ParamSpec::count("n", "n", "Number of trials.", 1.0, 100.0, 10.0),
                p,
            ],
            Self::Poisson => vec![ParamSpec::real(
                "lambda",
                "λ",
                "Mean number of events.",
                0.1,
                20.0,
                0.01,
                5.0,
            )],
            Self::Hypergeometric => vec![
                ParamSpec::count("population", "M", "Population size.", 1.0, 100.0, 50.0),
                ParamSpec::count("successes", "n", "Marked items in the population.", 1.0, 100.0, 10.0),
                ParamSpec::count("draws", "N", "Items drawn.", 1.0, 50.0, 20.0),
            ],
            Self::NegativeBinomial => vec![
                ParamSpec::count("r", "r", "Successes to wait for.", 1.0, 20.0, 5.0),
                p,
            ],
        }
    }

    pub fn build(self, values: &ParamValues) -> Result<Discrete, InvalidParameterError> {
        match self {
            Self::Bernoulli => Discrete::bernoulli(values.require("p")?),
            Self::Binomial => {
                Discrete::binomial(whole(values.require("n")?, "n")?, values.require("p")?)
            }
            Self::Poisson => Discrete::poisson(values.require("lambda")?),
            Self::Hypergeometric => Discrete::hypergeometric(
                whole(values.require("population")?, "population")?,
                whole(values.require("successes")?, "successes")?,
                whole(values.require("draws")?, "draws")?,
            ),
            Self::Geometric => Discrete::geometric(values.require("p")?),
            Self::NegativeBinomial => {
                Discrete::negative_binomial(values.require("r")?, values.require("p")?)
            }
        }
    }
}

impl ContinuousKind {
    pub fn params(self) -> Vec<ParamSpec> {
        match self {
            Self::Uniform => vec![
                ParamSpec::real("a", "a", "Lower bound.", -10.0, 10.0, 0.01, 0.0),
                ParamSpec::real("b", "b", "Upper bound.", 0.0, 20.0, 0.01, 10.0),
            ],
            Self::Normal => vec![
                ParamSpec::real("mu", "μ", "Mean.", -10.0, 10.0, 0.01, 0.0),
                ParamSpec::real("sigma", "σ", "Standard deviation.", 0.1, 10.0, 0.01, 1.0),
            ],
            Self::Exponential => vec![ParamSpec::real(
                "lambda",
                "λ",
                "Rate.",
                0.1,
                10.0,
                0.01,
                1.0,
            )],
            Self::StudentT => vec![ParamSpec::count("df", "ν", "Degrees of freedom.", 1.0, 100.0, 5.0)],
            Self::Gamma => vec![
                ParamSpec::real("alpha", "α", "Shape.", 0.1, 20.0, 0.1, 2.0),
                ParamSpec::real("beta", "β", "Rate.", 0.1, 10.0, 0.1, 1.0),
            ],
            Self::Beta => vec![
                ParamSpec::real("alpha", "α", "First shape.", 0.1, 20.0, 0.1, 2.0),
                ParamSpec::real("beta", "β", "Second shape.", 0.1, 20.0, 0.1, 5.0),
            ],
        }
    }

    pub fn build(self, values: &ParamValues) -> Result<Continuous, InvalidParameterError> {
        match self {
            Self::Uniform => Continuous::uniform(values.require("a")?, values.require("b")?),
            Self::Normal => Continuous::normal(values.require("mu")?, values.require("sigma")?),
            Self::Exponential => Continuous::exponential(values.require("lambda")?),
            Self::StudentT => Continuous::student_t(values.require("df")?),
            Self::Gamma => Continuous::gamma(values.require("alpha")?, values.require("beta")?),
            Self::Beta => Continuous::beta(values.require("alpha")?, values.require("beta")?),
        }
    }
}
