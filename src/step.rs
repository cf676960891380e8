use crate::domain::Domain;
use crate::eos;
use crate::error::Error;
use crate::forces;
use crate::kinematics;
use crate::scratch::Scratch;
use crate::timestep;
use crate::viscosity;

/**
 * One leapfrog cycle: pick the timestep, advance the nodes under the
 * current forces, then advance the elements on the new geometry. A stage
 * that detects an invariant violation stops the cycle immediately; no
 * later stage sees the broken state.
 */
pub fn advance(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    timestep::time_increment(domain);

    forces::lagrange_nodal(domain, scratch)?;

    kinematics::calc_lagrange_elements(domain, scratch)?;
    viscosity::calc_q(domain, scratch)?;
    eos::apply_material_properties(domain, scratch)?;
    eos::update_volumes(domain);

    timestep::calc_time_constraints(domain);

    Ok(())
}
