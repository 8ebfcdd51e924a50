//! Force-directed layout for the span graph.
//!
//! The simulation is an explicit context object owned by the caller: it
//! advances one tick per `step()`, can be stopped at any time, and supports
//! pinning nodes (drag) that override the simulated position until released.
//!
//! Forces per tick, in order:
//! 1. link attraction toward `link_distance` between connected nodes
//! 2. pairwise charge (negative = repulsion), exact O(n^2)
//! 3. collision, keeping centers at least `collision_distance` apart
//! 4. centering of the mean position on the viewport center
//!
//! Layouts are only locally stable; do not rely on exact coordinates.

use super::builder::SpanGraph;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alpha the simulation is pulled toward while a node is being dragged
const DRAG_ALPHA_TARGET: f64 = 0.3;

// Phyllotaxis seeding, as in d3-force
const INITIAL_RADIUS: f64 = 10.0;
const MIN_CHARGE_DISTANCE_SQ: f64 = 1.0;

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: f64,
    pub height: f64,
    pub link_distance: f64,
    pub charge_strength: f64,
    pub collision_distance: f64,

    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,

    /// Upper bound on ticks when the caller runs the simulation to rest
    pub max_ticks: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            width: 800.0,
            height: 600.0,
            link_distance: 100.0,
            charge_strength: -300.0,
            collision_distance: 40.0,
            velocity_decay: 0.4,
            alpha_min,
            // Reaches alpha_min from 1.0 in ~300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            max_ticks: 300,
            seed: 0x5eed,
        }
    }
}

/// Lifecycle of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationState {
    Running,
    /// Alpha dropped below `alpha_min`
    Settled,
    /// Cancelled by the caller
    Stopped,
}

#[derive(Debug, Clone)]
struct SimNode {
    id: String,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    fx: Option<f64>,
    fy: Option<f64>,
}

/// Position of one node, as handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub pinned: bool,
}

/// Live force simulation over a span graph
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: SimulationConfig,
    nodes: Vec<SimNode>,
    index: HashMap<String, usize>,
    links: Vec<(usize, usize)>,
    link_strength: Vec<f64>,
    link_bias: Vec<f64>,
    alpha: f64,
    alpha_target: f64,
    state: SimulationState,
    ticks: usize,
    rng: StdRng,
}

impl ForceSimulation {
    /// Seed every node on a phyllotaxis spiral around the viewport center
    pub fn new(graph: &SpanGraph, config: SimulationConfig) -> Self {
        let (cx, cy) = (config.width / 2.0, config.height / 2.0);
        let angle_step = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());

        let nodes: Vec<SimNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * angle_step;
                SimNode {
                    id: node.id.clone(),
                    x: cx + radius * angle.cos(),
                    y: cy + radius * angle.sin(),
                    vx: 0.0,
                    vy: 0.0,
                    fx: None,
                    fy: None,
                }
            })
            .collect();

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }

        // Degree-based link strength and bias, so hubs are not dragged around
        let mut degree = vec![0usize; nodes.len()];
        for &(s, t) in &graph.links {
            degree[s] += 1;
            degree[t] += 1;
        }
        let link_strength = graph
            .links
            .iter()
            .map(|&(s, t)| 1.0 / degree[s].min(degree[t]) as f64)
            .collect();
        let link_bias = graph
            .links
            .iter()
            .map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]) as f64)
            .collect();

        debug!(
            "Force simulation seeded: {} nodes, {} links",
            nodes.len(),
            graph.links.len()
        );

        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            nodes,
            index,
            links: graph.links.clone(),
            link_strength,
            link_bias,
            alpha: 1.0,
            alpha_target: 0.0,
            state: SimulationState::Running,
            ticks: 0,
            rng,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Advance one tick
    ///
    /// Returns whether the simulation is still running afterwards. A stopped
    /// or settled simulation does nothing.
    pub fn step(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_collision();
        self.apply_center();
        self.integrate();

        self.ticks += 1;

        if self.alpha < self.config.alpha_min {
            debug!("Force simulation settled after {} ticks", self.ticks);
            self.state = SimulationState::Settled;
        }

        self.is_running()
    }

    /// Step until settled, stopped, or `max_ticks` more ticks have run
    ///
    /// Returns the number of ticks executed by this call.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut executed = 0;
        while executed < max_ticks && self.is_running() {
            self.step();
            executed += 1;
        }
        executed
    }

    /// Cancel the simulation; node state is left as of the last completed tick
    pub fn stop(&mut self) {
        self.state = SimulationState::Stopped;
    }

    /// Reheat to full alpha and resume a settled or stopped simulation
    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.resume();
    }

    fn resume(&mut self) {
        self.state = SimulationState::Running;
    }

    /// Fix a node at `(x, y)` and reheat the simulation, as on drag start/move
    ///
    /// Returns `false` for an unknown node id.
    pub fn pin(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(node_id) else {
            return false;
        };

        let node = &mut self.nodes[i];
        node.fx = Some(x);
        node.fy = Some(y);
        node.x = x;
        node.y = y;
        node.vx = 0.0;
        node.vy = 0.0;

        if self.state != SimulationState::Stopped {
            self.alpha_target = DRAG_ALPHA_TARGET;
            self.resume();
        }
        true
    }

    /// Release a pinned node back into the simulation, as on drag end
    pub fn unpin(&mut self, node_id: &str) -> bool {
        let Some(&i) = self.index.get(node_id) else {
            return false;
        };

        self.nodes[i].fx = None;
        self.nodes[i].fy = None;

        if !self.nodes.iter().any(|n| n.fx.is_some()) {
            self.alpha_target = 0.0;
        }
        true
    }

    pub fn is_pinned(&self, node_id: &str) -> bool {
        self.index
            .get(node_id)
            .map(|&i| self.nodes[i].fx.is_some())
            .unwrap_or(false)
    }

    pub fn position(&self, node_id: &str) -> Option<(f64, f64)> {
        self.index
            .get(node_id)
            .map(|&i| (self.nodes[i].x, self.nodes[i].y))
    }

    /// Current positions in graph node order
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|n| NodePosition {
                id: n.id.clone(),
                x: n.x,
                y: n.y,
                pinned: n.fx.is_some(),
            })
            .collect()
    }

    /// Tiny random offset used to separate coincident nodes
    fn jiggle(&mut self) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * 1e-6
    }

    fn apply_links(&mut self) {
        let distance = self.config.link_distance;
        for k in 0..self.links.len() {
            let (s, t) = self.links[k];
            let (source, target) = (&self.nodes[s], &self.nodes[t]);

            let mut x = target.x + target.vx - source.x - source.vx;
            let mut y = target.y + target.vy - source.y - source.vy;
            if x == 0.0 {
                x = self.jiggle();
            }
            if y == 0.0 {
                y = self.jiggle();
            }

            let l = (x * x + y * y).sqrt();
            let l = (l - distance) / l * self.alpha * self.link_strength[k];
            let (x, y) = (x * l, y * l);
            let bias = self.link_bias[k];

            self.nodes[t].vx -= x * bias;
            self.nodes[t].vy -= y * bias;
            self.nodes[s].vx += x * (1.0 - bias);
            self.nodes[s].vy += y * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self) {
        let strength = self.config.charge_strength * self.alpha;
        let positions: Vec<(f64, f64)> = self.nodes.iter().map(|n| (n.x, n.y)).collect();

        for i in 0..positions.len() {
            let (xi, yi) = positions[i];
            let (mut dvx, mut dvy) = (0.0, 0.0);

            for (j, &(xj, yj)) in positions.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut x = xj - xi;
                let mut y = yj - yi;
                if x == 0.0 {
                    x = self.jiggle();
                }
                if y == 0.0 {
                    y = self.jiggle();
                }

                let mut l = x * x + y * y;
                if l < MIN_CHARGE_DISTANCE_SQ {
                    l = (MIN_CHARGE_DISTANCE_SQ * l).sqrt();
                }
                dvx += x * strength / l;
                dvy += y * strength / l;
            }

            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    fn apply_collision(&mut self) {
        let r = self.config.collision_distance;
        if r <= 0.0 {
            return;
        }

        let predicted: Vec<(f64, f64)> = self
            .nodes
            .iter()
            .map(|n| (n.x + n.vx, n.y + n.vy))
            .collect();

        for i in 0..predicted.len() {
            for j in (i + 1)..predicted.len() {
                let mut x = predicted[i].0 - predicted[j].0;
                let mut y = predicted[i].1 - predicted[j].1;
                if x * x + y * y >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.jiggle();
                }
                if y == 0.0 {
                    y = self.jiggle();
                }

                let l = (x * x + y * y).sqrt();
                let l = (r - l) / l;
                let (x, y) = (x * l * 0.5, y * l * 0.5);

                self.nodes[i].vx += x;
                self.nodes[i].vy += y;
                self.nodes[j].vx -= x;
                self.nodes[j].vy -= y;
            }
        }
    }

    fn apply_center(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let sx = self.nodes.iter().map(|n| n.x).sum::<f64>() / n;
        let sy = self.nodes.iter().map(|n| n.y).sum::<f64>() / n;
        let (dx, dy) = (sx - self.config.width / 2.0, sy - self.config.height / 2.0);

        for node in &mut self.nodes {
            node.x -= dx;
            node.y -= dy;
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }
    }
}

/// Run a fresh simulation to rest, bounded by `config.max_ticks`
///
/// Returns the final positions and the number of ticks executed.
pub fn settle_layout(graph: &SpanGraph, config: &SimulationConfig) -> (Vec<NodePosition>, usize) {
    let mut simulation = ForceSimulation::new(graph, config.clone());
    let ticks = simulation.run(config.max_ticks);
    debug!(
        "Graph layout: {} ticks, state {:?}",
        ticks,
        simulation.state()
    );
    (simulation.positions(), ticks)
}
