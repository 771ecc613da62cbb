//! Per-entity pollutant state and external overrides.

use smallvec::{smallvec, SmallVec};
use swale_core::{OverrideMode, PollutantVec, Project};

/// An externally forced concentration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Override {
    /// Forced concentration, mg/L.
    pub value: f64,
    /// How long the override lasts.
    pub mode: OverrideMode,
}

/// Override slots, one per pollutant.
pub type OverrideVec = SmallVec<[Option<Override>; 4]>;

/// Pollutant state of a subcatchment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubcatchQuality {
    /// Concentration in ponded water.
    pub ponded: PollutantVec,
    /// Concentration in runoff.
    pub runoff: PollutantVec,
    /// Cumulative washed-off load.
    pub total_load: PollutantVec,
}

/// Pollutant state of a node or a link.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConveyanceQuality {
    /// Inflow concentration before reaction.
    pub cin: PollutantVec,
    /// Resident concentration.
    pub qual: PollutantVec,
    /// Cumulative transported load.
    pub total_load: PollutantVec,
    /// Active overrides.
    pub overrides: OverrideVec,
}

impl ConveyanceQuality {
    fn new(pollutants: usize) -> Self {
        Self {
            cin: smallvec![0.0; pollutants],
            qual: smallvec![0.0; pollutants],
            total_load: smallvec![0.0; pollutants],
            overrides: smallvec![None; pollutants],
        }
    }

    /// Install an override and make it visible immediately.
    pub fn force(&mut self, pollutant: usize, value: f64, mode: OverrideMode) {
        self.overrides[pollutant] = Some(Override { value, mode });
        self.cin[pollutant] = value;
        self.qual[pollutant] = value;
    }

    /// Drop any override of one pollutant.
    pub fn release(&mut self, pollutant: usize) {
        self.overrides[pollutant] = None;
    }

    /// The override in force for a pollutant, if any.
    pub fn active(&self, pollutant: usize) -> Option<f64> {
        self.overrides[pollutant].map(|o| o.value)
    }

    pub(crate) fn expire_one_step(&mut self) {
        for slot in self.overrides.iter_mut() {
            if matches!(slot, Some(o) if o.mode == OverrideMode::OneStep) {
                *slot = None;
            }
        }
    }
}

/// Pollutant state of a whole network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualityState {
    /// Per subcatchment.
    pub subcatchments: Vec<SubcatchQuality>,
    /// Per node.
    pub nodes: Vec<ConveyanceQuality>,
    /// Per link.
    pub links: Vec<ConveyanceQuality>,
}

impl QualityState {
    /// Clean state sized to a project.
    pub fn new(project: &Project) -> Self {
        let n = project.pollutants.len();
        Self {
            subcatchments: vec![
                SubcatchQuality {
                    ponded: smallvec![0.0; n],
                    runoff: smallvec![0.0; n],
                    total_load: smallvec![0.0; n],
                };
                project.subcatchments.len()
            ],
            nodes: vec![ConveyanceQuality::new(n); project.nodes.len()],
            links: vec![ConveyanceQuality::new(n); project.links.len()],
        }
    }
}
