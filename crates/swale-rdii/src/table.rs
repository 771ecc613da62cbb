//! Reader for unit-hydrograph tables in `[HYDROGRAPHS]` text form.
//!
//! ```text
//! [HYDROGRAPHS]
//! ;;Name  Month/Gage  Response  R     T    K
//! UH1     RG1
//! UH1     All         Short     0.05  1.0  2.0
//! UH1     Jul         Medium    0.10  3.0  4.0
//! ```
//!
//! The first line of a hydrograph names its gage. Later lines assign one
//! response term for one month or for `All` months; lines apply in order.
//! A term line may end with an initial-abstraction triple (maximum depth,
//! recovery rate, initial depth). It is kept on the parsed hydrograph but
//! does not enter the kernels. Values are not validated here.

use std::path::Path;

use indexmap::IndexMap;
use swale_core::{LoadError, ObjectKind, Project, Rtk, RtkTable, UnitHydDef, MONTH_GROUPS, RESPONSE_TERMS};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const RESPONSES: [&str; 3] = ["SHORT", "MEDIUM", "LONG"];

/// Initial abstraction of one response term, in rainfall depth units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InitialAbstraction {
    /// Maximum depth.
    pub max_depth: f64,
    /// Recovery rate per day.
    pub recovery: f64,
    /// Depth already used at the start.
    pub initial: f64,
}

/// One hydrograph read from a table.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedHydrograph {
    /// Hydrograph id.
    pub name: String,
    /// Id of the gage feeding it.
    pub gage: String,
    /// Response terms.
    pub rtk: RtkTable,
    /// Initial abstraction per month group and term, where given.
    pub abstraction: [[Option<InitialAbstraction>; RESPONSE_TERMS]; MONTH_GROUPS],
}

impl ParsedHydrograph {
    fn new(name: &str, gage: &str) -> Self {
        Self {
            name: name.to_string(),
            gage: gage.to_string(),
            rtk: RtkTable::default(),
            abstraction: [[None; RESPONSE_TERMS]; MONTH_GROUPS],
        }
    }
}

/// Parse hydrographs from text.
///
/// If the text contains section headers, only the `[HYDROGRAPHS]` section
/// is read; otherwise every line is.
pub fn parse_hydrographs(text: &str) -> Result<Vec<ParsedHydrograph>, LoadError> {
    let sectioned = text.lines().any(|l| l.trim_start().starts_with('['));
    let mut in_section = !sectioned;
    let mut parsed: IndexMap<String, ParsedHydrograph> = IndexMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            in_section = line.eq_ignore_ascii_case("[HYDROGRAPHS]");
            continue;
        }
        if !in_section {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.len() {
            2 => {
                parsed
                    .entry(tokens[0].to_string())
                    .and_modify(|h| h.gage = tokens[1].to_string())
                    .or_insert_with(|| ParsedHydrograph::new(tokens[0], tokens[1]));
            }
            6 | 9 => {
                let hydrograph = parsed.get_mut(tokens[0]).ok_or_else(|| LoadError::Parse {
                    line: line_no,
                    reason: format!("hydrograph '{}' used before its gage line", tokens[0]),
                })?;
                let months = parse_months(tokens[1], line_no)?;
                let term = parse_response(tokens[2], line_no)?;
                let r = parse_number(tokens[3], line_no)?;
                let t = parse_number(tokens[4], line_no)?;
                let k = parse_number(tokens[5], line_no)?;
                let abstraction = match tokens.get(6..9) {
                    Some(ia) => Some(InitialAbstraction {
                        max_depth: parse_number(ia[0], line_no)?,
                        recovery: parse_number(ia[1], line_no)?,
                        initial: parse_number(ia[2], line_no)?,
                    }),
                    None => None,
                };
                for month in months {
                    hydrograph.rtk.set(month, term, Rtk::new(r, t, k));
                    hydrograph.abstraction[month][term] = abstraction;
                }
            }
            _ => {
                return Err(LoadError::Parse {
                    line: line_no,
                    reason: "expected 'name gage', 'name month response R T K' \
                             or 'name month response R T K Dmax Drecov Dinit'"
                        .into(),
                })
            }
        }
    }
    Ok(parsed.into_values().collect())
}

/// Read and parse a table file.
pub fn read_hydrographs(path: &Path) -> Result<Vec<ParsedHydrograph>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_hydrographs(&text)
}

/// Add (or replace) parsed hydrographs in a project, resolving gage ids.
pub fn merge_into(project: &mut Project, hydrographs: Vec<ParsedHydrograph>) -> Result<(), LoadError> {
    for h in hydrographs {
        let gage = project
            .index_of(ObjectKind::Gage, &h.gage)
            .ok_or_else(|| LoadError::Rejected {
                reason: format!("hydrograph '{}' references unknown gage '{}'", h.name, h.gage),
            })?;
        project.add_unit_hydrograph(
            h.name,
            UnitHydDef {
                gage: gage.into(),
                rtk: h.rtk,
            },
        );
    }
    Ok(())
}

fn parse_months(token: &str, line: usize) -> Result<Vec<usize>, LoadError> {
    let upper = token.to_ascii_uppercase();
    if upper == "ALL" {
        return Ok((0..MONTHS.len()).collect());
    }
    MONTHS
        .iter()
        .position(|m| *m == upper)
        .map(|m| vec![m])
        .ok_or_else(|| LoadError::Parse {
            line,
            reason: format!("unknown month '{token}'"),
        })
}

fn parse_response(token: &str, line: usize) -> Result<usize, LoadError> {
    let upper = token.to_ascii_uppercase();
    RESPONSES
        .iter()
        .position(|r| *r == upper)
        .ok_or_else(|| LoadError::Parse {
            line,
            reason: format!("unknown response '{token}'"),
        })
}

fn parse_number(token: &str, line: usize) -> Result<f64, LoadError> {
    token.parse().map_err(|_| LoadError::Parse {
        line,
        reason: format!("'{token}' is not a number"),
    })
}
