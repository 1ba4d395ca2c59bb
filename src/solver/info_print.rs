use super::{Info, ProblemData, Settings};
use crate::io::PrintTarget;
use crate::marshal::ConeSpec;
use std::io::{Result, Write};
use std::time::Duration;

// iteration rows are printed at this interval, plus the final one
pub(crate) const PRINT_INTERVAL: u32 = 25;

const RULE: &str =
    "------------------------------------------------------------------------------";

macro_rules! expformat {
    ($fmt:expr,$val:expr) => {
        if $val.is_finite() {
            _exp_str_reformat(format!($fmt, $val))
        } else {
            format!($fmt, $val)
        }
    };
}

pub(crate) fn print_configuration(
    out: &mut PrintTarget,
    settings: &Settings,
    data: &ProblemData,
    method: &str,
) -> Result<()> {
    if !settings.verbose {
        return Ok(());
    }

    writeln!(out, "{RULE}")?;
    writeln!(out, "  splitcone v{}", crate::VERSION)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "problem:")?;
    writeln!(out, "  variables     = {}", data.n())?;
    writeln!(out, "  constraints   = {}", data.m())?;
    writeln!(out, "  nnz(P)        = {}", data.P.nnz())?;
    writeln!(out, "  nnz(A)        = {}", data.A.nnz())?;
    print_cones(out, &data.cones)?;

    writeln!(out, "settings:")?;
    writeln!(out, "  linear system: {method}")?;
    writeln!(
        out,
        "  eps_abs = {:.1e}, eps_rel = {:.1e}, eps_infeas = {:.1e}",
        settings.eps_abs, settings.eps_rel, settings.eps_infeas
    )?;
    writeln!(
        out,
        "  alpha = {:.2}, scale = {:.2e}, adaptive_scale = {}",
        settings.alpha,
        settings.scale,
        _bool_on_off(settings.adaptive_scale)
    )?;
    let time_lim_str = match settings.time_limit() {
        Some(t) => format!("{t:?}"),
        None => "none".to_string(),
    };
    writeln!(
        out,
        "  max_iters = {}, normalize = {}, rho_x = {:.2e}, time limit = {}",
        settings.max_iters,
        _bool_on_off(settings.normalize),
        settings.rho_x,
        time_lim_str
    )?;
    writeln!(
        out,
        "  acceleration_lookback = {}, acceleration_interval = {}",
        settings.acceleration_lookback, settings.acceleration_interval
    )?;
    writeln!(out)?;
    Ok(())
}

fn print_cones(out: &mut PrintTarget, cones: &ConeSpec) -> Result<()> {
    writeln!(out, "  cones         = {}", cones.total_dim())?;
    if cones.zero > 0 {
        writeln!(out, "    : zero      = {}", cones.zero)?;
    }
    if cones.linear > 0 {
        writeln!(out, "    : linear    = {}", cones.linear)?;
    }
    if cones.box_dim() > 0 {
        writeln!(out, "    : box       = {}", cones.box_dim())?;
    }
    print_sizes(out, "soc", &cones.soc)?;
    print_sizes(out, "psd", &cones.psd)?;
    if cones.exp_primal > 0 {
        writeln!(out, "    : exp       = {}", cones.exp_primal)?;
    }
    if cones.exp_dual > 0 {
        writeln!(out, "    : dual exp  = {}", cones.exp_dual)?;
    }
    if !cones.power.is_empty() {
        writeln!(out, "    : power     = {}", cones.power.len())?;
    }
    Ok(())
}

fn print_sizes(out: &mut PrintTarget, name: &str, sizes: &[usize]) -> Result<()> {
    let maxlistlen = 5;
    let count = sizes.len();

    //skip if there are none of this type
    if count == 0 {
        return Ok(());
    }

    write!(out, "    : {name:<9} = {count}, ")?;
    if count == 1 {
        write!(out, " sizes = {}", sizes[0])?;
    } else if count <= maxlistlen {
        let list: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
        write!(out, " sizes = ({})", list.join(","))?;
    } else {
        // print first (maxlistlen-1) and the final one
        let list: Vec<String> = sizes[..maxlistlen - 1].iter().map(|s| s.to_string()).collect();
        write!(out, " sizes = ({},...,{})", list.join(","), sizes[count - 1])?;
    }
    writeln!(out)?;
    Ok(())
}

impl Info {
    pub(crate) fn print_status_header(&self, out: &mut PrintTarget, settings: &Settings) -> Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        write!(out, " iter  ")?;
        write!(out, "pri res    ")?;
        write!(out, "dua res    ")?;
        write!(out, "gap        ")?;
        write!(out, "pobj        ")?;
        write!(out, "dobj        ")?;
        write!(out, "scale     ")?;
        write!(out, "time (s)")?;
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        out.flush()?;
        Ok(())
    }

    pub(crate) fn print_status(&self, out: &mut PrintTarget, settings: &Settings, elapsed: f64) -> Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        write!(out, "{:>5}  ", self.iter)?;
        write!(out, "{}  ", expformat!("{:.2e}", self.res_pri))?;
        write!(out, "{}  ", expformat!("{:.2e}", self.res_dual))?;
        write!(out, "{}  ", expformat!("{:.2e}", self.gap))?;
        write!(out, "{}  ", expformat!("{:+.3e}", self.pobj))?;
        write!(out, "{}  ", expformat!("{:+.3e}", self.dobj))?;
        write!(out, "{}  ", expformat!("{:.2e}", self.scale))?;
        write!(out, "{}", expformat!("{:.2e}", elapsed))?;
        writeln!(out)?;
        Ok(())
    }

    pub(crate) fn print_footer(&self, out: &mut PrintTarget, settings: &Settings) -> Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        writeln!(out, "{RULE}")?;
        writeln!(out, "status: {}", self.status)?;
        writeln!(
            out,
            "timings: total = {:?}, setup = {:?}, lin-sys = {:?}, cones = {:?}, accel = {:?}",
            Duration::from_secs_f64(self.solve_time),
            Duration::from_secs_f64(self.setup_time),
            Duration::from_secs_f64(self.lin_sys_time),
            Duration::from_secs_f64(self.cone_time),
            Duration::from_secs_f64(self.accel_time),
        )?;
        writeln!(
            out,
            "acceleration: accepted = {}, rejected = {}, scale updates = {}",
            self.accepted_accel_steps, self.rejected_accel_steps, self.scale_updates
        )?;
        if !(self.status.is_infeasible() || self.status.is_unbounded()) {
            writeln!(out, "objective = {}", expformat!("{:+.6e}", self.pobj))?;
        }
        writeln!(out, "{RULE}")?;
        out.flush()?;
        Ok(())
    }
}

fn _bool_on_off(v: bool) -> &'static str {
    match v {
        true => "on",
        false => "off",
    }
}

// convert a string in LowerExp display format into one that
// 1) always has a sign after the exponent, and
// 2) has at least two digits in the exponent.
fn _exp_str_reformat(mut thestr: String) -> String {
    let Some(eidx) = thestr.find('e') else {
        return thestr;
    };
    let has_sign = thestr[eidx + 1..].starts_with('-');

    let has_short_exp = {
        if !has_sign {
            thestr.len() == eidx + 2
        } else {
            thestr.len() == eidx + 3
        }
    };

    let chars = match (has_sign, has_short_exp) {
        (false, true) => "+0",
        (false, false) => "+",
        (true, true) => "0",
        (true, false) => "",
    };

    let shift = if has_sign { 2 } else { 1 };
    thestr.insert_str(eidx + shift, chars);
    thestr
}
