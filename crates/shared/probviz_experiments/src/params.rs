//! Parameter tables for the experiment controls.
//!
//! Each control is described by a [`ParamSpec`]; values pass through
//! [`validate`] before they reach a trial or a distribution, and a rejected
//! value leaves the previous one in place.

use probviz::error::InvalidParameterError;

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub key: &'static str,
    /// Symbol shown next to the control.
    pub label: &'static str,
    pub description: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    /// Whole numbers only (counts).
    pub integer: bool,
}

impl ParamSpec {
    pub const fn real(
        key: &'static str,
        label: &'static str,
        description: &'static str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Self {
        Self {
            key,
            label,
            description,
            min,
            max,
            step,
            default,
            integer: false,
        }
    }

    pub const fn count(
        key: &'static str,
        label: &'static str,
        description: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            key,
            label,
            description,
            min,
            max,
            step: 1.0,
            default,
            integer: true,
        }
    }

    /// One line of a control listing: symbol, value, help text and range.
    pub fn describe(&self, value: f64) -> String {
        format!(
            "{} = {}  {} [{}, {}] step {}",
            self.label, value, self.description, self.min, self.max, self.step
        )
    }

    /// `value` moved by `steps` increments and snapped to the step grid.
    /// The result is not range-checked.
    pub fn nudge(&self, value: f64, steps: i32) -> f64 {
        let k = (value / self.step).round() + f64::from(steps);
        // Snap to 9 decimals so 3 * 0.01 reads back as 0.03.
        (k * self.step * 1e9).round() / 1e9
    }
}

/// Checks `value` against the control's range.
pub fn validate(spec: &ParamSpec, value: f64) -> Result<f64, InvalidParameterError> {
    if !value.is_finite() {
        return Err(InvalidParameterError::new(spec.key, "must be a finite number"));
    }
    if spec.integer && value.fract() != 0.0 {
        return Err(InvalidParameterError::new(
            spec.key,
            format!("must be a whole number, got {value}"),
        ));
    }
    if value < spec.min || value > spec.max {
        return Err(InvalidParameterError::new(
            spec.key,
            format!("must lie in [{}, {}], got {value}", spec.min, spec.max),
        ));
    }
    Ok(value)
}

/// Parses a `key=value` assignment as typed on the command line.
pub fn parse_assignment(raw: &str) -> Result<(String, f64), InvalidParameterError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| InvalidParameterError::new(raw, "expected key=value"))?;
    let key = key.trim();
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| InvalidParameterError::new(key, format!("`{}` is not a number", value.trim())))?;
    Ok((key.to_string(), value))
}

/// Current values for one table of controls, always within their ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamValues {
    specs: Vec<ParamSpec>,
    values: Vec<f64>,
}

impl ParamValues {
    pub fn defaults(specs: Vec<ParamSpec>) -> Self {
        let values = specs.iter().map(|s| s.default).collect();
        Self { specs, values }
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.position(key).map(|i| self.values[i])
    }

    /// Like [`Self::get`], for builders that need the value to exist.
    pub fn require(&self, key: &str) -> Result<f64, InvalidParameterError> {
        self.get(key)
            .ok_or_else(|| InvalidParameterError::new(key, "not a parameter of this experiment"))
    }

    /// Updates one value; on error the old value is kept.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), InvalidParameterError> {
        let i = self
            .position(key)
            .ok_or_else(|| InvalidParameterError::new(key, "not a parameter of this experiment"))?;
        self.values[i] = validate(&self.specs[i], value)?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamSpec, f64)> + '_ {
        self.specs.iter().zip(self.values.iter().copied())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.key == key)
    }
}

// Sample counts shared by the two simulation topics.
const SAMPLE_COUNT: ParamSpec =
    ParamSpec::count("n", "n", "Number of trials in one run.", 10.0, 1000.0, 100.0);

pub fn coin_tossing() -> Vec<ParamSpec> {
    vec![
        SAMPLE_COUNT,
        ParamSpec::real("p", "p", "Probability of heads.", 0.01, 0.99, 0.01, 0.5),
    ]
}

pub fn dice_rolling() -> Vec<ParamSpec> {
    vec![SAMPLE_COUNT]
}

pub fn binomial() -> Vec<ParamSpec> {
    vec![
        ParamSpec::count("n", "n", "Number of independent trials.", 1.0, 100.0, 10.0),
        ParamSpec::real("p", "p", "Success probability of each trial.", 0.0, 1.0, 0.01, 0.5),
    ]
}

pub fn poisson() -> Vec<ParamSpec> {
    vec![ParamSpec::real(
        "lambda",
        "λ",
        "Mean number of events per interval.",
        0.0,
        20.0,
        0.1,
        10.0,
    )]
}

pub fn poisson_theorem() -> Vec<ParamSpec> {
    vec![
        ParamSpec::count("n", "n", "Number of Bernoulli trials.", 50.0, 400.0, 200.0),
        ParamSpec::real("lambda", "λ", "Fixed product np.", 15.0, 25.0, 0.1, 20.0),
    ]
}

pub fn central_limit() -> Vec<ParamSpec> {
    vec![
        ParamSpec::count("n", "n", "Number of summed Bernoulli trials.", 10.0, 200.0, 50.0),
        ParamSpec::real("p", "p", "Success probability.", 0.01, 0.99, 0.01, 0.5),
    ]
}

pub fn one_dim_normal() -> Vec<ParamSpec> {
    vec![
        ParamSpec::real("mu", "μ", "Mean.", -10.0, 10.0, 0.1, 0.0),
        ParamSpec::real("sigma", "σ", "Standard deviation.", 0.1, 5.0, 0.1, 1.0),
    ]
}

pub fn two_dim_normal() -> Vec<ParamSpec> {
    vec![
        ParamSpec::real("mu1", "μ₁", "Mean of X.", -5.0, 5.0, 0.1, 0.0),
        ParamSpec::real("mu2", "μ₂", "Mean of Y.", -5.0, 5.0, 0.1, 0.0),
        ParamSpec::real("sigma1", "σ₁", "Standard deviation of X.", 0.1, 3.0, 0.1, 1.0),
        ParamSpec::real("sigma2", "σ₂", "Standard deviation of Y.", 0.1, 3.0, 0.1, 1.0),
        ParamSpec::real("rho", "ρ", "Correlation of X and Y.", -0.99, 0.99, 0.01, 0.0),
    ]
}

pub fn two_types_of_errors() -> Vec<ParamSpec> {
    vec![
        ParamSpec::real("alpha", "α", "Significance level.", 0.001, 0.2, 0.001, 0.05),
        ParamSpec::real("mu0", "μ₀", "Mean under H₀.", -5.0, 5.0, 0.1, 0.0),
        ParamSpec::real("mu1", "μ₁", "Mean under H₁.", -5.0, 5.0, 0.1, 1.0),
    ]
}

pub fn point_estimation() -> Vec<ParamSpec> {
    vec![
        ParamSpec::real("mu", "μ", "Population mean.", -10.0, 10.0, 0.1, 0.0),
        ParamSpec::real("sigma", "σ", "Population standard deviation.", 0.1, 10.0, 0.1, 1.0),
        ParamSpec::count("n", "n", "Largest sample size.", 10.0, 1000.0, 30.0),
    ]
}
