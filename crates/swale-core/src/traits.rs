//! Collaborator traits: project loading, runoff generation and routing.
//!
//! The kernel owns lifecycle, stepping, RDII and pollutant transport. The
//! physics of surface runoff and of flow through the network are supplied
//! by implementations of [`RunoffModel`] and [`RoutingModel`], and the
//! project itself by a [`ProjectLoader`].

use std::path::Path;

use crate::error::{LoadError, ModelError};
use crate::project::Project;
use crate::state::{LinkHydraulics, NodeHydraulics, SurfaceState};

// ── ProjectLoader ──────────────────────────────────────────────

/// Produces the static project for an input path.
pub trait ProjectLoader: Send {
    /// Load the project named by `input`.
    fn load(&self, input: &Path) -> Result<Project, LoadError>;
}

impl<F> ProjectLoader for F
where
    F: Fn(&Path) -> Result<Project, LoadError> + Send,
{
    fn load(&self, input: &Path) -> Result<Project, LoadError> {
        self(input)
    }
}

// ── RunoffModel ────────────────────────────────────────────────

/// Inputs and staged outputs of one runoff step.
///
/// `surfaces` is seeded with the previous step's state; the model updates
/// it in place. `previous` stays frozen at the state the step started from.
pub struct RunoffContext<'a> {
    project: &'a Project,
    precip: &'a [f64],
    previous: &'a [SurfaceState],
    surfaces: &'a mut [SurfaceState],
    dt: f64,
}

impl<'a> RunoffContext<'a> {
    /// Construct a context. Typically called by the engine.
    pub fn new(
        project: &'a Project,
        precip: &'a [f64],
        previous: &'a [SurfaceState],
        surfaces: &'a mut [SurfaceState],
        dt: f64,
    ) -> Self {
        Self {
            project,
            precip,
            previous,
            surfaces,
            dt,
        }
    }

    /// The project being simulated.
    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// Precipitation rate per subcatchment for this step.
    pub fn precip(&self) -> &'a [f64] {
        self.precip
    }

    /// Surface state at the start of the step.
    pub fn previous(&self) -> &'a [SurfaceState] {
        self.previous
    }

    /// Staged surface state to update.
    pub fn surfaces_mut(&mut self) -> &mut [SurfaceState] {
        self.surfaces
    }

    /// Step length, seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

/// Non-RDII hydrology: runoff, buildup and washoff per subcatchment.
///
/// Implementations must be deterministic and keep no per-run state of
/// their own; everything that evolves lives in [`SurfaceState`].
pub trait RunoffModel: Send + 'static {
    /// Name used in error reports.
    fn name(&self) -> &str;

    /// Advance every subcatchment by one step.
    fn step(&self, ctx: &mut RunoffContext<'_>) -> Result<(), ModelError>;
}

// ── RoutingModel ───────────────────────────────────────────────

/// Inputs and staged outputs of one routing step.
pub struct RoutingContext<'a> {
    project: &'a Project,
    lateral: &'a [f64],
    nodes: &'a mut [NodeHydraulics],
    links: &'a mut [LinkHydraulics],
    dt: f64,
}

impl<'a> RoutingContext<'a> {
    /// Construct a context. Typically called by the engine.
    pub fn new(
        project: &'a Project,
        lateral: &'a [f64],
        nodes: &'a mut [NodeHydraulics],
        links: &'a mut [LinkHydraulics],
        dt: f64,
    ) -> Self {
        Self {
            project,
            lateral,
            nodes,
            links,
            dt,
        }
    }

    /// The project being simulated.
    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// Lateral inflow per node for this step.
    pub fn lateral(&self) -> &'a [f64] {
        self.lateral
    }

    /// Staged node and link state, seeded from the previous step.
    pub fn state_mut(&mut self) -> (&mut [NodeHydraulics], &mut [LinkHydraulics]) {
        (self.nodes, self.links)
    }

    /// Step length, seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

/// Network routing: flow, depth and volume per node and link given the
/// lateral inflow injected at each node.
pub trait RoutingModel: Send + 'static {
    /// Name used in error reports.
    fn name(&self) -> &str;

    /// Advance the network by one step.
    fn step(&self, ctx: &mut RoutingContext<'_>) -> Result<(), ModelError>;
}
