use log::debug;
use rayon::prelude::*;

use crate::domain::Domain;

/**
 * Adaptive timestep control. `calc_time_constraints` runs at the end of a
 * cycle and derives the Courant and hydro limits from the element state;
 * `time_increment` runs at the top of the next cycle and picks the new dt,
 * damped so it never grows faster than the configured band and clipped
 * against dtmax and the remaining simulation time.
 */




// ============================================================================
/// Choose the timestep for the cycle about to run, then advance the clock.
pub fn time_increment(domain: &mut Domain) {
    let params = &domain.params;
    let mut targetdt = params.stoptime - domain.time;

    if params.dtfixed <= 0.0 && domain.cycle != 0 {
        let olddt = domain.deltatime;

        /* largest step the stability limits allow */
        let mut gnewdt = 1.0e+20;
        if domain.dtcourant < gnewdt {
            gnewdt = domain.dtcourant / 2.0;
        }
        if domain.dthydro < gnewdt {
            gnewdt = domain.dthydro * 2.0 / 3.0;
        }

        let mut newdt = gnewdt;
        let ratio = newdt / olddt;
        if ratio >= 1.0 {
            if ratio < params.deltatimemultlb {
                newdt = olddt;
            } else if ratio > params.deltatimemultub {
                newdt = olddt * params.deltatimemultub;
            }
        }
        if newdt > params.dtmax {
            newdt = params.dtmax;
        }
        domain.deltatime = newdt;
    }

    /* avoid leaving a sliver of a step for the next cycle */
    if targetdt > domain.deltatime && targetdt < 4.0 * domain.deltatime / 3.0 {
        targetdt = 2.0 * domain.deltatime / 3.0;
    }
    if targetdt < domain.deltatime {
        domain.deltatime = targetdt;
    }

    domain.time += domain.deltatime;
    domain.cycle += 1;

    debug!(
        "cycle {} dt {:e} (courant {:e}, hydro {:e})",
        domain.cycle, domain.deltatime, domain.dtcourant, domain.dthydro
    );
}




// ============================================================================
/// Recompute the Courant and hydro timestep limits from the element state.
/// Elements with zero volume-change rate impose no constraint.
pub fn calc_time_constraints(domain: &mut Domain) {
    let qqc2 = 64.0 * domain.params.qqc * domain.params.qqc;
    let dvovmax = domain.params.dvovmax;

    domain.dtcourant = domain
        .vdov
        .par_iter()
        .zip_eq(domain.ss.par_iter())
        .zip_eq(domain.arealg.par_iter())
        .map(|((&vdov, &ss), &arealg)| {
            if vdov == 0.0 {
                return 1.0e+20;
            }
            let mut dtf = ss * ss;
            if vdov < 0.0 {
                dtf += qqc2 * arealg * arealg * vdov * vdov;
            }
            arealg / dtf.sqrt()
        })
        .reduce(|| 1.0e+20, f64::min);

    domain.dthydro = domain
        .vdov
        .par_iter()
        .map(|&vdov| {
            if vdov == 0.0 {
                1.0e+20
            } else {
                dvovmax / (vdov.abs() + 1.0e-20)
            }
        })
        .reduce(|| 1.0e+20, f64::min);
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::domain::Params;
    use crate::mesh;

    fn adaptive_domain(olddt: f64, dtcourant: f64, dthydro: f64) -> Domain {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        domain.cycle = 5;
        domain.time = 1e-4;
        domain.deltatime = olddt;
        domain.dtcourant = dtcourant;
        domain.dthydro = dthydro;
        domain
    }


    #[test]
    fn small_growth_keeps_the_old_dt() {
        // candidate dt 1.05e-5, ratio 1.05 inside [1, 1.1)
        let mut domain = adaptive_domain(1e-5, 2.1e-5, 1e20);
        time_increment(&mut domain);
        assert!((domain.deltatime - 1e-5).abs() < 1e-20);
    }


    #[test]
    fn fast_growth_is_capped_at_the_upper_band() {
        // candidate dt 2e-5, ratio 2 above 1.2
        let mut domain = adaptive_domain(1e-5, 4e-5, 1e20);
        time_increment(&mut domain);
        assert!((domain.deltatime - 1.2e-5).abs() < 1e-20);
    }


    #[test]
    fn shrinking_constraint_is_taken_immediately() {
        let mut domain = adaptive_domain(1e-5, 1e-5, 1e20);
        time_increment(&mut domain);
        assert!((domain.deltatime - 5e-6).abs() < 1e-20);
    }


    #[test]
    fn hydro_constraint_applies_its_two_thirds_factor() {
        let mut domain = adaptive_domain(1e-5, 1e20, 9e-6);
        time_increment(&mut domain);
        assert!((domain.deltatime - 6e-6).abs() < 1e-20);
    }


    #[test]
    fn dt_never_exceeds_dtmax() {
        let mut domain = adaptive_domain(9.9e-3, 2.3e-2, 1e20);
        domain.params.stoptime = 1.0;
        time_increment(&mut domain);
        assert!((domain.deltatime - domain.params.dtmax).abs() < 1e-18);
    }


    #[test]
    fn trailing_sliver_splits_into_two_even_steps() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        domain.params.dtfixed = 1.0;
        domain.deltatime = 1e-5;
        domain.cycle = 5;
        // 1.2 dt remaining: inside (dt, 4/3 dt)
        domain.time = domain.params.stoptime - 1.2e-5;

        time_increment(&mut domain);
        assert!((domain.deltatime - 2.0 / 3.0 * 1e-5).abs() < 1e-20);
    }


    #[test]
    fn first_cycle_uses_the_seeded_dt() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        let seeded = domain.deltatime;
        domain.dtcourant = 1e-9;

        time_increment(&mut domain);

        assert_eq!(domain.deltatime, seeded);
        assert_eq!(domain.cycle, 1);
        assert!((domain.time - seeded).abs() < 1e-20);
    }


    #[test]
    fn static_state_imposes_no_constraints() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        calc_time_constraints(&mut domain);
        assert_eq!(domain.dtcourant, 1e20);
        assert_eq!(domain.dthydro, 1e20);
    }


    #[test]
    fn hydro_limit_tracks_the_fastest_volume_change() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        domain.vdov[0] = -0.5;
        domain.vdov[3] = 0.2;
        for elem in 0..domain.num_elem() {
            domain.ss[elem] = 1.0;
            domain.arealg[elem] = 0.5;
        }

        calc_time_constraints(&mut domain);

        let expect = domain.params.dvovmax / (0.5 + 1e-20);
        assert!((domain.dthydro - expect).abs() < 1e-15);
        assert!(domain.dtcourant < 1e20);
        assert!(domain.dtcourant > 0.0);
    }
}
