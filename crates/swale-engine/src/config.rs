//! Project validation and its error type.
//!
//! [`validate`] checks the options and every cross-reference of a
//! [`Project`] before a run is opened, and again before it starts, since
//! RTK tables and RDII assignments may be edited in between.

use std::error::Error;
use std::fmt;

use swale_core::{NodeId, NodeKind, ObjectKind, ParameterError, Project, UnitHydId};

use crate::clock::SimClock;

// ── ConfigError ────────────────────────────────────────────────

/// Errors detected by [`validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Step is NaN, infinite, zero or negative.
    InvalidStep {
        /// The invalid value.
        value: f64,
    },
    /// Duration is NaN, infinite, zero or negative.
    InvalidDuration {
        /// The invalid value.
        value: f64,
    },
    /// Step longer than the whole run.
    StepExceedsDuration {
        /// Step, seconds.
        step: f64,
        /// Duration, seconds.
        duration: f64,
    },
    /// The start date is not a calendar date.
    InvalidStartDate {
        /// Year.
        year: i32,
        /// Month.
        month: u32,
        /// Day.
        day: u32,
    },
    /// An entity references an entity that does not exist.
    DanglingReference {
        /// Kind of the referring entity.
        kind: ObjectKind,
        /// Index of the referring entity.
        index: usize,
        /// Kind of the missing target.
        target_kind: ObjectKind,
        /// Index of the missing target.
        target: u32,
    },
    /// A numeric attribute is negative or not finite.
    InvalidValue {
        /// Kind of the entity.
        kind: ObjectKind,
        /// Index of the entity.
        index: usize,
        /// Attribute name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A gage series is not in ascending time order.
    UnorderedSeries {
        /// Gage index.
        gage: usize,
    },
    /// An RTK table violates its constraints.
    InvalidRtk {
        /// The unit hydrograph.
        unit_hyd: UnitHydId,
        /// The violation.
        reason: ParameterError,
    },
    /// The link graph has a cycle.
    CyclicNetwork {
        /// A node on the cycle.
        node: NodeId,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStep { value } => {
                write!(f, "step must be finite and positive, got {value}")
            }
            Self::InvalidDuration { value } => {
                write!(f, "duration must be finite and positive, got {value}")
            }
            Self::StepExceedsDuration { step, duration } => {
                write!(f, "step {step}s exceeds duration {duration}s")
            }
            Self::InvalidStartDate { year, month, day } => {
                write!(f, "{year:04}-{month:02}-{day:02} is not a date")
            }
            Self::DanglingReference {
                kind,
                index,
                target_kind,
                target,
            } => write!(f, "{kind} {index} references missing {target_kind} {target}"),
            Self::InvalidValue {
                kind,
                index,
                name,
                value,
            } => write!(f, "{kind} {index}: invalid {name} {value}"),
            Self::UnorderedSeries { gage } => {
                write!(f, "gage {gage}: series is not in time order")
            }
            Self::InvalidRtk { unit_hyd, reason } => {
                write!(f, "unit hydrograph {unit_hyd}: {reason}")
            }
            Self::CyclicNetwork { node } => write!(f, "link graph has a cycle through node {node}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRtk { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// ── validate ───────────────────────────────────────────────────

fn non_negative(
    kind: ObjectKind,
    index: usize,
    name: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            kind,
            index,
            name,
            value,
        })
    }
}

fn in_range(
    kind: ObjectKind,
    index: usize,
    target_kind: ObjectKind,
    target: u32,
    count: usize,
) -> Result<(), ConfigError> {
    if (target as usize) < count {
        Ok(())
    } else {
        Err(ConfigError::DanglingReference {
            kind,
            index,
            target_kind,
            target,
        })
    }
}

/// Validate the options and topology of a project.
pub fn validate(project: &Project) -> Result<(), ConfigError> {
    let opts = &project.options;
    // 1. Step and duration must be finite and positive.
    if !opts.step_secs.is_finite() || opts.step_secs <= 0.0 {
        return Err(ConfigError::InvalidStep {
            value: opts.step_secs,
        });
    }
    if !opts.duration_secs.is_finite() || opts.duration_secs <= 0.0 {
        return Err(ConfigError::InvalidDuration {
            value: opts.duration_secs,
        });
    }
    // 2. At least one whole step must fit.
    if opts.step_secs > opts.duration_secs {
        return Err(ConfigError::StepExceedsDuration {
            step: opts.step_secs,
            duration: opts.duration_secs,
        });
    }
    // 3. Start date must exist.
    SimClock::new(opts)?;

    let gages = project.gages.len();
    let nodes = project.nodes.len();
    let pollutants = project.pollutants.len();
    let unit_hyds = project.unit_hydrographs.len();

    // 4. Gage series ascending with admissible rates.
    for (i, gage) in project.gages.values().enumerate() {
        let mut last = f64::NEG_INFINITY;
        for sample in &gage.series {
            if !sample.time_secs.is_finite() || sample.time_secs < last {
                return Err(ConfigError::UnorderedSeries { gage: i });
            }
            last = sample.time_secs;
            non_negative(ObjectKind::Gage, i, "rainfall", sample.rain)?;
            non_negative(ObjectKind::Gage, i, "snowfall", sample.snow)?;
        }
    }
    // 5. Subcatchments.
    for (i, sc) in project.subcatchments.values().enumerate() {
        let kind = ObjectKind::Subcatchment;
        in_range(kind, i, ObjectKind::Gage, sc.gage.0, gages)?;
        in_range(kind, i, ObjectKind::Node, sc.outlet.0, nodes)?;
        non_negative(kind, i, "area", sc.area)?;
        non_negative(kind, i, "depression storage", sc.depression_storage)?;
        non_negative(kind, i, "reservoir coefficient", sc.reservoir_coeff)?;
        for land in &sc.pollutants {
            non_negative(kind, i, "buildup max", land.buildup_max)?;
            non_negative(kind, i, "buildup rate", land.buildup_rate)?;
            non_negative(kind, i, "initial buildup", land.initial_buildup)?;
            non_negative(kind, i, "washoff coefficient", land.washoff_coeff)?;
            non_negative(kind, i, "washoff exponent", land.washoff_exp)?;
        }
    }
    // 6. Nodes.
    for (i, node) in project.nodes.values().enumerate() {
        let kind = ObjectKind::Node;
        if let Some(rdii) = node.rdii {
            in_range(kind, i, ObjectKind::UnitHydrograph, rdii.unit_hyd.0, unit_hyds)?;
            non_negative(kind, i, "rdii area", rdii.area)?;
        }
        if let Some(direct) = &node.direct {
            non_negative(kind, i, "direct inflow", direct.flow)?;
            if direct.conc.len() > pollutants {
                return Err(ConfigError::DanglingReference {
                    kind,
                    index: i,
                    target_kind: ObjectKind::Pollutant,
                    target: pollutants as u32,
                });
            }
            for &c in &direct.conc {
                non_negative(kind, i, "direct inflow concentration", c)?;
            }
        }
        if let NodeKind::Storage { detention_hours } = node.kind {
            non_negative(kind, i, "detention time", detention_hours)?;
        }
    }
    // 7. Links.
    for (i, link) in project.links.values().enumerate() {
        let kind = ObjectKind::Link;
        in_range(kind, i, ObjectKind::Node, link.from.0, nodes)?;
        in_range(kind, i, ObjectKind::Node, link.to.0, nodes)?;
        non_negative(kind, i, "length", link.length)?;
        non_negative(kind, i, "velocity", link.velocity)?;
    }
    // 8. Pollutants.
    for (i, p) in project.pollutants.values().enumerate() {
        non_negative(ObjectKind::Pollutant, i, "rain concentration", p.rain_conc)?;
        non_negative(ObjectKind::Pollutant, i, "decay", p.decay)?;
    }
    // 9. Unit hydrographs; kernels must fit the run's step.
    for (i, uh) in project.unit_hydrographs.values().enumerate() {
        in_range(ObjectKind::UnitHydrograph, i, ObjectKind::Gage, uh.gage.0, gages)?;
        uh.rtk
            .validate()
            .and_then(|()| uh.rtk.check_window(project.options.step_secs))
            .map_err(|reason| ConfigError::InvalidRtk {
            unit_hyd: UnitHydId(i as u32),
            reason,
        })?;
    }
    // 10. Link graph must be acyclic.
    project
        .node_order()
        .map_err(|node| ConfigError::CyclicNetwork { node })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swale_core::{Rtk, RtkTable, StartDate};
    use swale_test_utils::fixtures;

    #[test]
    fn fixture_networks_are_valid() {
        assert_eq!(validate(&fixtures::gage_network()), Ok(()));
        assert_eq!(validate(&fixtures::rdii_network(fixtures::typical_rtk())), Ok(()));
        assert_eq!(validate(&fixtures::pollutant_network()), Ok(()));
    }

    #[test]
    fn zero_step_rejected() {
        let mut p = fixtures::gage_network();
        p.options.step_secs = 0.0;
        assert_eq!(validate(&p), Err(ConfigError::InvalidStep { value: 0.0 }));
    }

    #[test]
    fn nan_duration_rejected() {
        let mut p = fixtures::gage_network();
        p.options.duration_secs = f64::NAN;
        assert!(matches!(validate(&p), Err(ConfigError::InvalidDuration { .. })));
    }

    #[test]
    fn step_longer_than_run_rejected() {
        let mut p = fixtures::gage_network();
        p.options.step_secs = p.options.duration_secs * 2.0;
        assert!(matches!(
            validate(&p),
            Err(ConfigError::StepExceedsDuration { .. })
        ));
    }

    #[test]
    fn february_thirtieth_rejected() {
        let mut p = fixtures::gage_network();
        p.options.start = StartDate {
            year: 2021,
            month: 2,
            day: 30,
        };
        assert!(matches!(
            validate(&p),
            Err(ConfigError::InvalidStartDate { .. })
        ));
    }

    #[test]
    fn dangling_outlet_rejected() {
        let mut p = fixtures::gage_network();
        p.subcatchments[0].outlet = NodeId(99);
        match validate(&p) {
            Err(ConfigError::DanglingReference {
                kind: ObjectKind::Subcatchment,
                target_kind: ObjectKind::Node,
                target: 99,
                ..
            }) => {}
            other => panic!("expected DanglingReference, got {other:?}"),
        }
    }

    #[test]
    fn invalid_rtk_rejected() {
        let mut p = fixtures::rdii_network(fixtures::typical_rtk());
        p.unit_hydrographs[0].rtk = RtkTable::uniform([Rtk::new(0.6, 1.0, 1.0); 3]);
        match validate(&p) {
            Err(ConfigError::InvalidRtk { reason, .. }) => assert!(reason.is_ratio_violation()),
            other => panic!("expected InvalidRtk, got {other:?}"),
        }
    }

    #[test]
    fn decimal_ratio_sum_of_one_accepted() {
        let mut p = fixtures::rdii_network(fixtures::typical_rtk());
        p.unit_hydrographs[0].rtk = RtkTable::uniform([
            Rtk::new(0.33, 1.0, 2.0),
            Rtk::new(0.56, 4.0, 3.0),
            Rtk::new(0.11, 8.0, 5.0),
        ]);
        assert_eq!(validate(&p), Ok(()));
    }

    #[test]
    fn rtk_beyond_kernel_limit_rejected() {
        let mut p = fixtures::rdii_network(fixtures::typical_rtk());
        p.unit_hydrographs[0].rtk.set(2, 2, Rtk::new(0.1, 1e300, 1.0));
        match validate(&p) {
            Err(ConfigError::InvalidRtk {
                unit_hyd: UnitHydId(0),
                reason: ParameterError::KernelTooLong { month: 2, term: 2, .. },
            }) => {}
            other => panic!("expected KernelTooLong, got {other:?}"),
        }
    }
}
