//! Topic inventory: every subject ProbViz can show, with its copy, its
//! controls and the kind of experiment behind it.

use std::fmt;
use std::str::FromStr;

use probviz::error::InvalidParameterError;
use probviz::prng::Prng;

use crate::figures;
use crate::params::{self, ParamSpec, ParamValues};
use crate::plot::PlotFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    DiceRolling,
    CoinTossing,
    Binomial,
    Poisson,
    PoissonTheorem,
    CentralLimit,
    PointEstimation,
    TwoTypesOfErrors,
    OneDimNormal,
    TwoDimNormal,
    ContinuousDistributions,
    DiscreteDistributions,
}

/// What drives a topic's experiment page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentKind {
    /// Animated run of [`crate::coin::CoinToss`].
    CoinTossing,
    /// Animated run of [`crate::dice::DieRoll`].
    DiceRolling,
    /// One static figure redrawn when a parameter changes.
    Figure,
    /// Figure for a user-selected discrete family.
    DiscreteFamily,
    /// Figure for a user-selected continuous family.
    ContinuousFamily,
}

impl TopicKind {
    /// Stable route key.
    pub fn label(self) -> &'static str {
        match self {
            TopicKind::DiceRolling => "dice_rolling_experiment",
            TopicKind::CoinTossing => "coin_tossing_experiment",
            TopicKind::Binomial => "binomial_distribution",
            TopicKind::Poisson => "poisson_distribution",
            TopicKind::PoissonTheorem => "poisson_theorem",
            TopicKind::CentralLimit => "central_limit_theorem",
            TopicKind::PointEstimation => "consistency_of_point_estimation",
            TopicKind::TwoTypesOfErrors => "two_types_of_errors",
            TopicKind::OneDimNormal => "one_dim_norm",
            TopicKind::TwoDimNormal => "two_dim_norm",
            TopicKind::ContinuousDistributions => "continuous_pdf",
            TopicKind::DiscreteDistributions => "discrete_pdf",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TopicKind::DiceRolling => "Dice rolling",
            TopicKind::CoinTossing => "Coin tossing",
            TopicKind::Binomial => "Binomial distribution",
            TopicKind::Poisson => "Poisson distribution",
            TopicKind::PoissonTheorem => "Poisson theorem",
            TopicKind::CentralLimit => "Central limit theorem",
            TopicKind::PointEstimation => "Consistency of point estimation",
            TopicKind::TwoTypesOfErrors => "Two types of errors",
            TopicKind::OneDimNormal => "Normal curve",
            TopicKind::TwoDimNormal => "Bivariate normal",
            TopicKind::ContinuousDistributions => "Continuous distributions",
            TopicKind::DiscreteDistributions => "Discrete distributions",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            TopicKind::DiceRolling => {
                "Roll a fair die and watch event frequencies and the mean settle."
            }
            TopicKind::CoinTossing => "Toss a coin and watch the frequency of heads settle.",
            TopicKind::Binomial => "Successes in n independent trials.",
            TopicKind::Poisson => "Counts of rare events in a fixed interval.",
            TopicKind::PoissonTheorem => "The binomial law approaches the Poisson law.",
            TopicKind::CentralLimit => "Sums of many trials look normal.",
            TopicKind::PointEstimation => "The sample mean closes in on μ as n grows.",
            TopicKind::TwoTypesOfErrors => "Type I and type II errors of a z test.",
            TopicKind::OneDimNormal => "How μ and σ shape the normal density.",
            TopicKind::TwoDimNormal => "Joint normal samples with correlation ρ.",
            TopicKind::ContinuousDistributions => "PDF and CDF of common continuous families.",
            TopicKind::DiscreteDistributions => "PMF and CDF of common discrete families.",
        }
    }

    /// Markdown shown on the description page; math is written in TeX.
    pub fn description(self) -> &'static str {
        match self {
            TopicKind::DiceRolling => DICE_ROLLING,
            TopicKind::CoinTossing => COIN_TOSSING,
            TopicKind::Binomial => BINOMIAL,
            TopicKind::Poisson => POISSON,
            TopicKind::PoissonTheorem => POISSON_THEOREM,
            TopicKind::CentralLimit => CENTRAL_LIMIT,
            TopicKind::PointEstimation => POINT_ESTIMATION,
            TopicKind::TwoTypesOfErrors => TWO_TYPES_OF_ERRORS,
            TopicKind::OneDimNormal => ONE_DIM_NORMAL,
            TopicKind::TwoDimNormal => TWO_DIM_NORMAL,
            TopicKind::ContinuousDistributions => CONTINUOUS,
            TopicKind::DiscreteDistributions => DISCRETE,
        }
    }

    pub fn experiment(self) -> ExperimentKind {
        match self {
            TopicKind::CoinTossing => ExperimentKind::CoinTossing,
            TopicKind::DiceRolling => ExperimentKind::DiceRolling,
            TopicKind::ContinuousDistributions => ExperimentKind::ContinuousFamily,
            TopicKind::DiscreteDistributions => ExperimentKind::DiscreteFamily,
            _ => ExperimentKind::Figure,
        }
    }

    /// Controls of the experiment page. Family topics take theirs from the
    /// selected distribution instead.
    pub fn params(self) -> Vec<ParamSpec> {
        match self {
            TopicKind::DiceRolling => params::dice_rolling(),
            TopicKind::CoinTossing => params::coin_tossing(),
            TopicKind::Binomial => params::binomial(),
            TopicKind::Poisson => params::poisson(),
            TopicKind::PoissonTheorem => params::poisson_theorem(),
            TopicKind::CentralLimit => params::central_limit(),
            TopicKind::PointEstimation => params::point_estimation(),
            TopicKind::TwoTypesOfErrors => params::two_types_of_errors(),
            TopicKind::OneDimNormal => params::one_dim_normal(),
            TopicKind::TwoDimNormal => params::two_dim_normal(),
            TopicKind::ContinuousDistributions | TopicKind::DiscreteDistributions => Vec::new(),
        }
    }

    /// Builds the figure of a [`ExperimentKind::Figure`] topic; `None` for
    /// every other kind.
    pub fn figure(
        self,
        values: &ParamValues,
        rng: &mut Prng,
    ) -> Result<Option<PlotFrame>, InvalidParameterError> {
        let frame = match self {
            TopicKind::Binomial => figures::binomial(values)?,
            TopicKind::Poisson => figures::poisson(values)?,
            TopicKind::PoissonTheorem => figures::poisson_theorem(values)?,
            TopicKind::CentralLimit => figures::central_limit(values)?,
            TopicKind::PointEstimation => figures::point_estimation(values, rng)?,
            TopicKind::TwoTypesOfErrors => figures::two_types_of_errors(values)?,
            TopicKind::OneDimNormal => figures::one_dim_normal(values)?,
            TopicKind::TwoDimNormal => figures::two_dim_normal(values, rng)?,
            TopicKind::DiceRolling
            | TopicKind::CoinTossing
            | TopicKind::ContinuousDistributions
            | TopicKind::DiscreteDistributions => return Ok(None),
        };
        Ok(Some(frame))
    }

    /// Navigation order.
    pub fn all() -> &'static [TopicKind] {
        &[
            TopicKind::DiceRolling,
            TopicKind::CoinTossing,
            TopicKind::Binomial,
            TopicKind::Poisson,
            TopicKind::PoissonTheorem,
            TopicKind::CentralLimit,
            TopicKind::PointEstimation,
            TopicKind::TwoTypesOfErrors,
            TopicKind::OneDimNormal,
            TopicKind::TwoDimNormal,
            TopicKind::ContinuousDistributions,
            TopicKind::DiscreteDistributions,
        ]
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TopicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TopicKind::all()
            .iter()
            .copied()
            .find(|t| t.label() == s)
            .ok_or_else(|| format!("unknown topic `{s}`"))
    }
}

const DICE_ROLLING: &str = r"
# Dice rolling

Roll a fair die repeatedly and let $X$ be the face shown.

1. Watch how the frequencies of the events $\{X < 4\}$ and $\{X = 5\}$ behave
   as the number of rolls grows.
2. Use the stability of frequency to estimate
   $P(X < 4) = \frac{1}{2}$ and $P(X = 5) = \frac{1}{6}$.
3. In expectation mode, follow the running mean of the faces towards
   $E[X] = \frac{1 + 2 + \cdots + 6}{6} = 3.5$.
";

const COIN_TOSSING: &str = r"
# Coin tossing

Toss a coin $n$ times and record the relative frequency of heads
$f_n = \frac{n_H}{n}$.

For small $n$ the frequency swings widely; as $n$ grows it settles near the
probability of heads $p$. This stability of frequency is what the
statistical definition of probability rests on.
";

const BINOMIAL: &str = r"
# Binomial distribution

In $n$ independent Bernoulli trials with success probability $p$, the number
of successes $X$ satisfies

$$
P(X = k) = C_n^k p^k (1-p)^{n-k}, \quad k = 0, 1, \ldots, n
$$

written $X \sim B(n, p)$, with $E[X] = np$ and $D(X) = np(1-p)$.
";

const POISSON: &str = r"
# Poisson distribution

A random variable $X$ taking the values $0, 1, 2, \ldots$ with

$$
P(X = k) = \frac{\lambda^k}{k!} e^{-\lambda}, \quad \lambda > 0
$$

follows the Poisson distribution $X \sim P(\lambda)$. Both its mean and its
variance equal $\lambda$.
";

const POISSON_THEOREM: &str = r"
# Poisson theorem

Let $X$ count the successes of $n$ Bernoulli trials with success probability
$p_n$, where $\lim_{n \to \infty} n p_n = \lambda > 0$. Then for every
non-negative integer $k$

$$
\lim_{n \to \infty} C_n^k p_n^k (1-p_n)^{n-k} = \frac{\lambda^k}{k!} e^{-\lambda}
$$

so for large $n$ and small $p$ the binomial law is close to $P(np)$.
";

const CENTRAL_LIMIT: &str = r"
# Central limit theorem

If $X \sim B(n, p)$, then for large $n$

$$
\frac{X - np}{\sqrt{np(1-p)}} \xrightarrow{d} N(0, 1)
$$

The bars show the binomial probabilities; the curve is the normal density
with the same mean $np$ and variance $np(1-p)$.
";

const POINT_ESTIMATION: &str = r"
# Consistency of point estimation

An estimator $\hat\theta_n$ is consistent when for every $\varepsilon > 0$

$$
\lim_{n \to \infty} P(|\hat\theta_n - \theta| < \varepsilon) = 1
$$

The sample mean $\bar X = \frac{1}{n}\sum_{i=1}^n X_i$ of a normal population
is consistent for $\mu$: the histograms of repeated estimates narrow around
$\mu$ as the sample size grows.
";

const TWO_TYPES_OF_ERRORS: &str = r"
# Two types of errors

Let $X_1, \ldots, X_n$ be a sample from $N(\mu, \sigma^2)$ with $\sigma^2$
known. At significance level $\alpha$ test $H_0: \mu = \mu_0$ against
$H_1: \mu \neq \mu_0$.

| | $H_0$ true | $H_0$ false |
| --- | --- | --- |
| Reject $H_0$ | Type I error ($\alpha$) | Correct ($1 - \beta$) |
| Accept $H_0$ | Correct ($1 - \alpha$) | Type II error ($\beta$) |

The figure uses $\sigma = 1$ and $n = 1$.
";

const ONE_DIM_NORMAL: &str = r"
# Normal curve

The density of $X \sim N(\mu, \sigma^2)$ is

$$
f(x) = \frac{1}{\sqrt{2\pi}\sigma} e^{-\frac{(x-\mu)^2}{2\sigma^2}}
$$

$\mu$ moves the curve along the axis; a smaller $\sigma$ makes it taller and
narrower.
";

const TWO_DIM_NORMAL: &str = r"
# Bivariate normal distribution

$(X, Y) \sim N(\mu_1, \mu_2, \sigma_1^2, \sigma_2^2, \rho)$ has density

$$
f(x, y) = \frac{1}{2\pi\sigma_1\sigma_2\sqrt{1-\rho^2}}
\exp\left\{-\frac{1}{2(1-\rho^2)}\left[\frac{(x-\mu_1)^2}{\sigma_1^2}
- \frac{2\rho(x-\mu_1)(y-\mu_2)}{\sigma_1\sigma_2}
+ \frac{(y-\mu_2)^2}{\sigma_2^2}\right]\right\}
$$

Both marginals are normal; $\rho$ tilts and stretches the cloud of samples.
";

const CONTINUOUS: &str = r"
# Continuous distributions

For a continuous random variable the distribution function is
$F(x) = \int_{-\infty}^{x} f(t)\,dt$. Pick a family to plot $f$ and $F$:

- Uniform $U(a, b)$
- Normal $N(\mu, \sigma^2)$
- Exponential $E(\lambda)$
- Student's $t(\nu)$
- Gamma $\Gamma(\alpha, \beta)$
- Beta $B(\alpha, \beta)$
";

const DISCRETE: &str = r"
# Discrete distributions

For a discrete random variable $P(X = x_k) = p_k$ and
$F(x) = \sum_{x_k \le x} p_k$. Pick a family to plot both:

- Bernoulli $B(1, p)$
- Binomial $B(n, p)$
- Poisson $P(\lambda)$
- Hypergeometric $H(N, M, n)$
- Geometric $G(p)$
- Negative binomial $NB(r, p)$
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_inventory_is_stable() {
        let all = TopicKind::all();
        assert_eq!(all.len(), 12);

        let mut labels: Vec<&str> = all.iter().map(|t| t.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 12);

        for t in all {
            assert!(!t.display_name().trim().is_empty());
            assert!(!t.summary().trim().is_empty());
            assert!(t.description().trim_start().starts_with("# "));
            assert_eq!(t.label().parse::<TopicKind>(), Ok(*t));
        }
    }

    #[test]
    fn figure_topics_render_with_defaults() {
        let mut rng = Prng::new(1);
        for &t in TopicKind::all() {
            let values = ParamValues::defaults(t.params());
            let frame = t.figure(&values, &mut rng).unwrap();
            assert_eq!(frame.is_some(), t.experiment() == ExperimentKind::Figure, "{t}");
        }
    }

    #[test]
    fn simulation_topics_are_coin_and_dice() {
        let animated: Vec<_> = TopicKind::all()
            .iter()
            .filter(|t| {
                matches!(
                    t.experiment(),
                    ExperimentKind::CoinTossing | ExperimentKind::DiceRolling
                )
            })
            .collect();
        assert_eq!(animated, [&TopicKind::DiceRolling, &TopicKind::CoinTossing]);
        assert!("empirical".parse::<TopicKind>().is_err());
    }
}
