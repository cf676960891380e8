use rayon::prelude::*;

use crate::domain::{Domain, Params};
use crate::error::Error;
use crate::scratch::{RegionScratch, Scratch};

/**
 * Material response: a predictor-corrector solve for energy, pressure and
 * artificial viscosity on the new volumes, followed by the sound speed and
 * the final volume commit. The solve runs region by region over dense
 * gathered arrays; a region's `rep` count repeats the whole gather-solve
 * sequence to model more expensive materials, and must not change the
 * answer. Elements of one region are disjoint from every other region, so
 * the scatter back is race-free by construction.
 */




/* squared sound speed below this floor snaps to a fixed tiny value
 * instead of taking the square root */
fn sound_speed(ssc2: f64) -> f64 {
    if ssc2 <= 1.111111e-37 {
        3.333333e-19
    } else {
        ssc2.sqrt()
    }
}




// ============================================================================
/// Gamma-law pressure from energy and compression, with the small-pressure
/// snap, the upper-volume-bound zeroing and the pmin floor.
#[allow(clippy::too_many_arguments)]
fn calc_pressure(
    p_new: &mut [f64], bvc: &mut [f64], pbvc: &mut [f64],
    e: &[f64], compression: &[f64],
    vnewc: &[f64], elems: &[usize], params: &Params) {
    let c1s = 2.0 / 3.0;

    for (i, &elem) in elems.iter().enumerate() {
        bvc[i] = c1s * (compression[i] + 1.0);
        pbvc[i] = c1s;

        let mut p = bvc[i] * e[i];
        if p.abs() < params.p_cut {
            p = 0.0;
        }
        if vnewc[elem] >= params.eosvmax {
            p = 0.0;
        }
        if p < params.pmin {
            p = params.pmin;
        }
        p_new[i] = p;
    }
}




// ============================================================================
/// Half-step predictor, two correctors, and the final q, each re-deriving
/// pressure from the running energy.
fn calc_energy(rs: &mut RegionScratch, vnewc: &[f64], elems: &[usize], params: &Params) {
    let RegionScratch {
        e_old, delvc, p_old, q_old, qq_old, ql_old,
        compression, comp_half_step, work,
        p_new, e_new, q_new, p_half_step, bvc, pbvc,
    } = rs;
    let n = elems.len();

    for i in 0..n {
        e_new[i] =
            (e_old[i] - 0.5 * delvc[i] * (p_old[i] + q_old[i]) + 0.5 * work[i]).max(params.emin);
    }

    calc_pressure(p_half_step, bvc, pbvc, e_new, comp_half_step, vnewc, elems, params);

    for i in 0..n {
        let vhalf = 1.0 / (1.0 + comp_half_step[i]);

        if delvc[i] > 0.0 {
            q_new[i] = 0.0;
        } else {
            let ssc2 = (pbvc[i] * e_new[i] + vhalf * vhalf * bvc[i] * p_half_step[i])
                / params.refdens;
            q_new[i] = sound_speed(ssc2) * ql_old[i] + qq_old[i];
        }

        e_new[i] += 0.5
            * delvc[i]
            * (3.0 * (p_old[i] + q_old[i]) - 4.0 * (p_half_step[i] + q_new[i]));
    }

    for i in 0..n {
        e_new[i] += 0.5 * work[i];
        if e_new[i].abs() < params.e_cut {
            e_new[i] = 0.0;
        }
        if e_new[i] < params.emin {
            e_new[i] = params.emin;
        }
    }

    calc_pressure(p_new, bvc, pbvc, e_new, compression, vnewc, elems, params);

    for (i, &elem) in elems.iter().enumerate() {
        let q_tilde = if delvc[i] > 0.0 {
            0.0
        } else {
            let ssc2 = (pbvc[i] * e_new[i] + vnewc[elem] * vnewc[elem] * bvc[i] * p_new[i])
                / params.refdens;
            sound_speed(ssc2) * ql_old[i] + qq_old[i]
        };

        e_new[i] -= (7.0 * (p_old[i] + q_old[i])
            - 8.0 * (p_half_step[i] + q_new[i])
            + (p_new[i] + q_tilde))
            * delvc[i]
            / 6.0;

        if e_new[i].abs() < params.e_cut {
            e_new[i] = 0.0;
        }
        if e_new[i] < params.emin {
            e_new[i] = params.emin;
        }
    }

    calc_pressure(p_new, bvc, pbvc, e_new, compression, vnewc, elems, params);

    for (i, &elem) in elems.iter().enumerate() {
        if delvc[i] <= 0.0 {
            let ssc2 = (pbvc[i] * e_new[i] + vnewc[elem] * vnewc[elem] * bvc[i] * p_new[i])
                / params.refdens;
            q_new[i] = sound_speed(ssc2) * ql_old[i] + qq_old[i];
            if q_new[i].abs() < params.q_cut {
                q_new[i] = 0.0;
            }
        }
    }
}




// ============================================================================
#[allow(clippy::too_many_arguments)]
fn eval_eos(
    e: &mut [f64], p: &mut [f64], q: &mut [f64], ss: &mut [f64],
    delv: &[f64], qq: &[f64], ql: &[f64],
    vnewc: &[f64], elems: &[usize], rep: usize,
    rs: &mut RegionScratch, params: &Params) {
    /* each repetition re-gathers from the untouched domain state, so the
     * final scatter is identical no matter how many passes ran */
    for _ in 0..rep {
        for (i, &elem) in elems.iter().enumerate() {
            rs.e_old[i] = e[elem];
            rs.delvc[i] = delv[elem];
            rs.p_old[i] = p[elem];
            rs.q_old[i] = q[elem];
            rs.qq_old[i] = qq[elem];
            rs.ql_old[i] = ql[elem];
            rs.work[i] = 0.0;

            rs.compression[i] = 1.0 / vnewc[elem] - 1.0;
            let vchalf = vnewc[elem] - rs.delvc[i] * 0.5;
            rs.comp_half_step[i] = 1.0 / vchalf - 1.0;

            if params.eosvmin != 0.0 && vnewc[elem] <= params.eosvmin {
                rs.comp_half_step[i] = rs.compression[i];
            }
            if params.eosvmax != 0.0 && vnewc[elem] >= params.eosvmax {
                rs.p_old[i] = 0.0;
                rs.compression[i] = 0.0;
                rs.comp_half_step[i] = 0.0;
            }
        }

        calc_energy(rs, vnewc, elems, params);
    }

    for (i, &elem) in elems.iter().enumerate() {
        p[elem] = rs.p_new[i];
        e[elem] = rs.e_new[i];
        q[elem] = rs.q_new[i];
    }

    for (i, &elem) in elems.iter().enumerate() {
        let ssc2 = (rs.pbvc[i] * rs.e_new[i]
            + vnewc[elem] * vnewc[elem] * rs.bvc[i] * rs.p_new[i])
            / params.refdens;
        ss[elem] = sound_speed(ssc2);
    }
}




// ============================================================================
/// EOS update for every region. Fails if any element volume sits outside
/// the representable range after the eos clamps.
pub fn apply_material_properties(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    let Domain {
        regions, e, p, q, qq, ql, delv, ss, v, vnew, params, ..
    } = domain;
    let Scratch { vnewc, region: rs, .. } = scratch;

    let eosvmin = params.eosvmin;
    let eosvmax = params.eosvmax;

    vnewc
        .par_iter_mut()
        .zip_eq(vnew.par_iter())
        .for_each(|(vc, &vol)| {
            let mut vol = vol;
            if eosvmin != 0.0 && vol < eosvmin {
                vol = eosvmin;
            }
            if eosvmax != 0.0 && vol > eosvmax {
                vol = eosvmax;
            }
            *vc = vol;
        });

    for (elem, &vol) in v.iter().enumerate() {
        let mut vc = vol;
        if eosvmin != 0.0 && vc < eosvmin {
            vc = eosvmin;
        }
        if eosvmax != 0.0 && vc > eosvmax {
            vc = eosvmax;
        }
        if vc <= 0.0 {
            return Err(Error::Volume { elem });
        }
    }

    for region in regions.iter() {
        eval_eos(e, p, q, ss, delv, qq, ql, vnewc, &region.elems, region.rep, rs, params);
    }

    Ok(())
}


/// Commit the new relative volumes, snapping values within v_cut of 1 to
/// exactly 1.
pub fn update_volumes(domain: &mut Domain) {
    let v_cut = domain.params.v_cut;
    let Domain { v, vnew, .. } = domain;

    v.par_iter_mut().zip_eq(vnew.par_iter()).for_each(|(v, &vn)| {
        *v = if (vn - 1.0).abs() < v_cut { 1.0 } else { vn };
    });
}
