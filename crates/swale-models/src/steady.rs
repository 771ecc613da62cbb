//! Steady-flow routing.
//!
//! Nodes are visited upstream first. A node's inflow is its lateral inflow
//! plus the flow of every incoming link. Junctions and outfalls pass their
//! inflow straight through; storage units drain as linear reservoirs with
//! the configured detention time. Outflow is split evenly over outgoing
//! links, and each link holds `flow × travel time` in transit.

use swale_core::{ModelError, NodeKind, RoutingContext, RoutingModel};

/// Reference routing model.
#[derive(Clone, Debug, Default)]
pub struct SteadyFlowRouting {
    _private: (),
}

impl SteadyFlowRouting {
    /// Create the model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoutingModel for SteadyFlowRouting {
    fn name(&self) -> &str {
        "steady_flow"
    }

    fn step(&self, ctx: &mut RoutingContext<'_>) -> Result<(), ModelError> {
        let dt = ctx.dt();
        let project = ctx.project();
        let lateral = ctx.lateral();
        let order = project
            .node_order()
            .map_err(|node| ModelError::ExecutionFailed {
                reason: format!("link graph has a cycle through node {node}"),
            })?;
        let outgoing = project.outgoing_links();
        let (nodes, links) = ctx.state_mut();

        let mut inflow: Vec<f64> = lateral.iter().map(|q| q.max(0.0)).collect();
        for node in order {
            let n = node.index();
            let state = &mut nodes[n];
            state.lateral_inflow = lateral[n];
            state.inflow = inflow[n];

            match project.nodes[n].kind {
                NodeKind::Storage { detention_hours } if detention_hours > 0.0 => {
                    let tau = detention_hours * 3_600.0;
                    state.volume = (state.volume + inflow[n] * dt) / (1.0 + dt / tau);
                    state.outflow = state.volume / tau;
                }
                _ => {
                    state.volume = 0.0;
                    state.outflow = inflow[n];
                }
            }

            let out = &outgoing[n];
            if out.is_empty() {
                continue;
            }
            let share = state.outflow / out.len() as f64;
            for link in out {
                let def = &project.links[link.index()];
                let l = &mut links[link.index()];
                l.flow = share;
                l.volume = share * def.travel_secs();
                inflow[def.to.index()] += share;
            }
        }
        Ok(())
    }
}
