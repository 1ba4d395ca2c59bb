#![allow(non_snake_case)]

use super::{ProblemData, Settings};
use crate::algebra::*;
use crate::marshal::{Buffer, ConeSpec};

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

// A flat version of the cone description using the dictionary keys
// accepted by the marshaling layer.

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct JsonCone {
    z: usize,
    l: usize,
    bl: Vec<f64>,
    bu: Vec<f64>,
    q: Vec<usize>,
    s: Vec<usize>,
    ep: usize,
    ed: usize,
    p: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct JsonProblemData {
    pub P: CscMatrix<f64>,
    pub A: CscMatrix<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub cone: JsonCone,
    pub settings: Settings,
}

/// Write problem data and settings to `file` as JSON.
pub fn write_problem_json(file: &mut File, data: &ProblemData, settings: &Settings) -> io::Result<()> {
    let cones = &data.cones;
    let json_data = JsonProblemData {
        P: data.P.clone(),
        A: data.A.clone(),
        b: data.b.clone(),
        c: data.c.clone(),
        cone: JsonCone {
            z: cones.zero,
            l: cones.linear,
            bl: cones.box_lower.to_vec(),
            bu: cones.box_upper.to_vec(),
            q: cones.soc.to_vec(),
            s: cones.psd.to_vec(),
            ep: cones.exp_primal,
            ed: cones.exp_dual,
            p: cones.power.to_vec(),
        },
        settings: settings.clone(),
    };

    let json = serde_json::to_string(&json_data)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Read problem data and settings written by [`write_problem_json`].
pub fn read_problem_json(file: &mut File) -> io::Result<(ProblemData, Settings)> {
    let mut buffer = String::new();
    file.read_to_string(&mut buffer)?;
    let json_data: JsonProblemData = serde_json::from_str(&buffer)?;

    for M in [&json_data.P, &json_data.A] {
        M.check_format()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    }

    let cone = json_data.cone;
    let cones = ConeSpec {
        zero: cone.z,
        linear: cone.l,
        box_lower: Buffer::Owned(cone.bl),
        box_upper: Buffer::Owned(cone.bu),
        soc: Buffer::Owned(cone.q),
        psd: Buffer::Owned(cone.s),
        exp_primal: cone.ep,
        exp_dual: cone.ed,
        power: Buffer::Owned(cone.p),
    };
    let data = ProblemData {
        P: json_data.P,
        A: json_data.A,
        b: json_data.b,
        c: json_data.c,
        cones,
    };
    Ok((data, json_data.settings))
}

#[test]
fn test_json_io() {
    use std::io::{Seek, SeekFrom};

    let data = ProblemData {
        P: CscMatrix::from(&[[2.0]]),
        A: CscMatrix::from(&[[-1.0], [1.0]]),
        b: vec![-2.0, 4.0],
        c: vec![1.0],
        cones: ConeSpec {
            linear: 2,
            ..ConeSpec::default()
        },
    };
    let settings = crate::solver::SettingsBuilder::default()
        .eps_abs(1e-7)
        .build()
        .unwrap();

    let mut file = tempfile::tempfile().unwrap();
    write_problem_json(&mut file, &data, &settings).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let (data2, settings2) = read_problem_json(&mut file).unwrap();
    assert_eq!(data2.A, data.A);
    assert_eq!(data2.P, data.P);
    assert_eq!(data2.b, data.b);
    assert_eq!(data2.cones.linear, 2);
    assert_eq!(settings2, settings);
}
