use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// A field holds a value outside of its legal range
    #[error("setting '{name}' is out of range: must be {requirement}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
    },
}

/// Solver settings.
///
/// Construct with [`SettingsBuilder`] or use `Settings::default()`.  Fields
/// are validated when built, in declaration order of the checks below, and
/// the first failing field is reported.
///
/// ```
/// use splitcone::solver::SettingsBuilder;
///
/// let settings = SettingsBuilder::default()
///     .eps_abs(1e-6)
///     .verbose(false)
///     .build()
///     .unwrap();
/// assert_eq!(settings.max_iters, 100000);
/// ```

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    ///maximum number of iterations
    #[builder(default = "100000")]
    pub max_iters: u32,

    ///absolute convergence tolerance
    #[builder(default = "1e-4")]
    pub eps_abs: f64,

    ///relative convergence tolerance
    #[builder(default = "1e-4")]
    pub eps_rel: f64,

    ///infeasibility detection tolerance
    #[builder(default = "1e-7")]
    pub eps_infeas: f64,

    ///relaxation parameter, in (0,2)
    #[builder(default = "1.5")]
    pub alpha: f64,

    ///primal regularization added to P
    #[builder(default = "1e-6")]
    pub rho_x: f64,

    ///initial dual scale factor
    #[builder(default = "0.1")]
    pub scale: f64,

    ///time limit in seconds, 0 for no limit
    #[builder(default = "0.")]
    pub time_limit_secs: f64,

    ///acceleration memory.  Positive selects type-II Anderson
    ///acceleration, negative selects type-I, zero disables it.
    #[builder(default = "10")]
    pub acceleration_lookback: i32,

    ///iterations between acceleration steps
    #[builder(default = "10")]
    pub acceleration_interval: u32,

    ///verbose printing
    #[builder(default = "true")]
    pub verbose: bool,

    ///rescale problem data before solving
    #[builder(default = "true")]
    pub normalize: bool,

    ///update the dual scale factor as the solve progresses
    #[builder(default = "true")]
    pub adaptive_scale: bool,

    ///use the conjugate gradient backend in place of the direct one
    #[builder(default = "false")]
    pub use_indirect: bool,

    ///write the problem data to this JSON file at initialization
    #[builder(default = "None")]
    pub write_data_filename: Option<String>,

    ///write per-iteration progress to this CSV file
    #[builder(default = "None")]
    pub log_csv_filename: Option<String>,
}

impl Default for Settings {
    fn default() -> Settings {
        SettingsBuilder::default().build().unwrap()
    }
}

impl Settings {
    /// Checks that all fields hold legal values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_scale(self.scale)?;
        check_time_limit(self.time_limit_secs)?;
        check_nonneg("eps_abs", self.eps_abs)?;
        check_nonneg("eps_rel", self.eps_rel)?;
        check_nonneg("eps_infeas", self.eps_infeas)?;
        check_alpha(self.alpha)?;
        check_rho_x(self.rho_x)?;
        Ok(())
    }

    /// acceleration interval, with 0 treated as 1
    pub fn acceleration_interval(&self) -> u32 {
        self.acceleration_interval.max(1)
    }

    /// time limit as a duration, or `None` when unlimited
    pub fn time_limit(&self) -> Option<std::time::Duration> {
        (self.time_limit_secs > 0.)
            .then(|| std::time::Duration::from_secs_f64(self.time_limit_secs.min(1e12)))
    }
}

impl From<SettingsError> for SettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        SettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl SettingsBuilder {
    /// check every field that has been explicitly set
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(v) = self.scale {
            check_scale(v)?;
        }
        if let Some(v) = self.time_limit_secs {
            check_time_limit(v)?;
        }
        if let Some(v) = self.eps_abs {
            check_nonneg("eps_abs", v)?;
        }
        if let Some(v) = self.eps_rel {
            check_nonneg("eps_rel", v)?;
        }
        if let Some(v) = self.eps_infeas {
            check_nonneg("eps_infeas", v)?;
        }
        if let Some(v) = self.alpha {
            check_alpha(v)?;
        }
        if let Some(v) = self.rho_x {
            check_rho_x(v)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

// NaN fails every check since comparisons with NaN are false

fn check_nonneg(name: &'static str, v: f64) -> Result<(), SettingsError> {
    if v >= 0. {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name,
            requirement: "non-negative",
        })
    }
}

fn check_scale(v: f64) -> Result<(), SettingsError> {
    if v > 0. && v.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name: "scale",
            requirement: "positive and finite",
        })
    }
}

fn check_time_limit(v: f64) -> Result<(), SettingsError> {
    check_nonneg("time_limit_secs", v)
}

fn check_alpha(v: f64) -> Result<(), SettingsError> {
    if v > 0. && v < 2. {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name: "alpha",
            requirement: "in the open interval (0, 2)",
        })
    }
}

fn check_rho_x(v: f64) -> Result<(), SettingsError> {
    if v > 0. && v.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name: "rho_x",
            requirement: "positive and finite",
        })
    }
}
