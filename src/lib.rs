//! Hexshock is an explicit Lagrangian shock hydrodynamics solver on a
//! structured hexahedral mesh. It advances a staggered leapfrog scheme,
//! velocities and positions at the nodes, thermodynamics at the element
//! centers, with an adaptive timestep, Flanagan-Belytschko anti-hourglass
//! stabilization, a monotonic flux-limited artificial viscosity, and an
//! iterative gamma-law equation of state solved region by region so that
//! expensive materials can be modeled by replicating their solve. All bulk
//! loops are data-parallel; corner-force scatter goes through per-element
//! scratch slots and a precomputed node-to-corner adjacency, so no two
//! workers ever write the same location.

pub mod domain;
pub mod eos;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod kinematics;
pub mod mesh;
pub mod scratch;
pub mod step;
pub mod timestep;
pub mod viscosity;
