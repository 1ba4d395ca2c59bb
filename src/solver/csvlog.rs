use crate::marshal::Diagnostic;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Per-iteration progress log in CSV format.
///
/// Write failures are reported once as a diagnostic, after which the log
/// is silently disabled.
pub(crate) struct CsvLog {
    path: String,
    out: Option<BufWriter<File>>,
}

pub(crate) struct CsvRow {
    pub iter: u32,
    pub res_pri: f64,
    pub res_dual: f64,
    pub gap: f64,
    pub pobj: f64,
    pub dobj: f64,
    pub scale: f64,
    pub time: f64,
}

impl CsvLog {
    pub(crate) fn create(path: &str, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut log = Self {
            path: path.to_string(),
            out: None,
        };
        match File::create(path) {
            Ok(file) => {
                log.out = Some(BufWriter::new(file));
                let header = "iter,res_pri,res_dual,gap,pobj,dobj,scale,time";
                log.write_line(header, diagnostics);
            }
            Err(e) => log.fail(e, diagnostics),
        }
        log
    }

    fn fail(&mut self, e: std::io::Error, diagnostics: &mut Vec<Diagnostic>) {
        self.out = None;
        Diagnostic::OutputFile {
            path: self.path.clone(),
            message: e.to_string(),
        }
        .emit(diagnostics);
    }

    fn write_line(&mut self, line: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(out) = self.out.as_mut() {
            if let Err(e) = writeln!(out, "{line}") {
                self.fail(e, diagnostics);
            }
        }
    }

    pub(crate) fn row(&mut self, row: &CsvRow, diagnostics: &mut Vec<Diagnostic>) {
        if self.out.is_none() {
            return;
        }
        let line = format!(
            "{},{:e},{:e},{:e},{:e},{:e},{:e},{:e}",
            row.iter, row.res_pri, row.res_dual, row.gap, row.pobj, row.dobj, row.scale, row.time
        );
        self.write_line(&line, diagnostics);
    }

    pub(crate) fn finish(mut self, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(out) = self.out.as_mut() {
            if let Err(e) = out.flush() {
                self.fail(e, diagnostics);
            }
        }
    }
}
