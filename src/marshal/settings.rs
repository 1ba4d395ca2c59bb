use super::{InterfaceError, Value};
use crate::solver::{Settings, SettingsBuilder, SettingsError};

// Caller supplied options, type checked but not yet range checked.
// Integers are held wide so that negative values survive to the
// range checks and are reported as such.
#[derive(Default)]
struct StagedSettings {
    max_iters: Option<i64>,
    eps_abs: Option<f64>,
    eps_rel: Option<f64>,
    eps_infeas: Option<f64>,
    alpha: Option<f64>,
    rho_x: Option<f64>,
    scale: Option<f64>,
    time_limit_secs: Option<f64>,
    acceleration_lookback: Option<i64>,
    acceleration_interval: Option<i64>,
    verbose: Option<bool>,
    normalize: Option<bool>,
    adaptive_scale: Option<bool>,
    use_indirect: Option<bool>,
    write_data_filename: Option<String>,
    log_csv_filename: Option<String>,
}

fn int_opt(key: &str, v: &Value) -> Result<i64, InterfaceError> {
    v.as_int()
        .ok_or_else(|| InterfaceError::type_err(key, format!("int, found {}", v.kind_name())))
}

fn float_opt(key: &str, v: &Value) -> Result<f64, InterfaceError> {
    v.as_float()
        .ok_or_else(|| InterfaceError::type_err(key, format!("number, found {}", v.kind_name())))
}

fn bool_opt(key: &str, v: &Value) -> Result<bool, InterfaceError> {
    v.as_bool()
        .ok_or_else(|| InterfaceError::type_err(key, format!("bool, found {}", v.kind_name())))
}

fn str_opt(key: &str, v: &Value) -> Result<String, InterfaceError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(InterfaceError::type_err(
            key,
            format!("str, found {}", v.kind_name()),
        )),
    }
}

impl StagedSettings {
    fn stage(opts: &Value) -> Result<Self, InterfaceError> {
        let mut staged = StagedSettings::default();
        let dict = match opts {
            Value::None => return Ok(staged),
            Value::Dict(d) => d,
            _ => {
                return Err(InterfaceError::type_err(
                    "settings",
                    format!("a dict, found {}", opts.kind_name()),
                ))
            }
        };

        for (key, v) in dict.iter().filter(|(_, v)| !v.is_none()) {
            let k = key.as_str();
            match k {
                "max_iters" => staged.max_iters = Some(int_opt(k, v)?),
                "eps_abs" => staged.eps_abs = Some(float_opt(k, v)?),
                "eps_rel" => staged.eps_rel = Some(float_opt(k, v)?),
                "eps_infeas" => staged.eps_infeas = Some(float_opt(k, v)?),
                "alpha" => staged.alpha = Some(float_opt(k, v)?),
                "rho_x" => staged.rho_x = Some(float_opt(k, v)?),
                "scale" => staged.scale = Some(float_opt(k, v)?),
                "time_limit_secs" => staged.time_limit_secs = Some(float_opt(k, v)?),
                "acceleration_lookback" => staged.acceleration_lookback = Some(int_opt(k, v)?),
                "acceleration_interval" => staged.acceleration_interval = Some(int_opt(k, v)?),
                "verbose" => staged.verbose = Some(bool_opt(k, v)?),
                "normalize" => staged.normalize = Some(bool_opt(k, v)?),
                "adaptive_scale" => staged.adaptive_scale = Some(bool_opt(k, v)?),
                "use_indirect" => staged.use_indirect = Some(bool_opt(k, v)?),
                "write_data_filename" => staged.write_data_filename = Some(str_opt(k, v)?),
                "log_csv_filename" => staged.log_csv_filename = Some(str_opt(k, v)?),
                _ => return Err(InterfaceError::type_err(k, "a known solver setting")),
            }
        }
        Ok(staged)
    }
}

fn to_u32(name: &'static str, v: i64) -> Result<u32, SettingsError> {
    u32::try_from(v).map_err(|_| SettingsError::OutOfRange {
        name,
        requirement: "a non-negative 32-bit integer",
    })
}

/// Overlay caller options on the default settings.
///
/// Every key is type checked first.  Range checks then run in a fixed
/// order (`max_iters`, `acceleration_interval`, `scale`,
/// `time_limit_secs`, `eps_abs`, `eps_rel`, `eps_infeas`, `alpha`,
/// `rho_x`) and the first failure is returned.  Passing `Value::None`
/// gives the defaults.
pub fn settings_from_value(opts: &Value) -> Result<Settings, InterfaceError> {
    let staged = StagedSettings::stage(opts)?;
    let mut builder = SettingsBuilder::default();

    if let Some(v) = staged.max_iters {
        builder.max_iters(to_u32("max_iters", v)?);
    }
    if let Some(v) = staged.acceleration_interval {
        builder.acceleration_interval(to_u32("acceleration_interval", v)?);
    }
    if let Some(v) = staged.acceleration_lookback {
        let v = i32::try_from(v).map_err(|_| SettingsError::OutOfRange {
            name: "acceleration_lookback",
            requirement: "a 32-bit integer",
        })?;
        builder.acceleration_lookback(v);
    }

    macro_rules! overlay {
        ($($field:ident),+) => {
            $(
                if let Some(v) = staged.$field {
                    builder.$field(v);
                }
            )+
        };
    }
    overlay!(scale, time_limit_secs, eps_abs, eps_rel, eps_infeas, alpha, rho_x);
    overlay!(verbose, normalize, adaptive_scale, use_indirect);

    if let Some(v) = staged.write_data_filename {
        builder.write_data_filename(Some(v));
    }
    if let Some(v) = staged.log_csv_filename {
        builder.log_csv_filename(Some(v));
    }

    builder.validate()?;
    builder
        .build()
        .map_err(|e| InterfaceError::type_err("settings", e.to_string()))
}
