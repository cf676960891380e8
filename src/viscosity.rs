use rayon::prelude::*;

use crate::domain::{gather, Domain, FaceBc};
use crate::error::Error;
use crate::scratch::Scratch;

/**
 * Monotonic artificial viscosity. A first element-parallel pass builds
 * velocity and position gradients along the three logical mesh axes; a
 * second pass limits each element's gradient against its face neighbors
 * and turns the result into the linear and quadratic q terms the EOS
 * consumes. Face couplings are carried as `FaceBc`, so the ghost cases
 * (symmetry mirror, free surface) are explicit matches rather than
 * decoded masks.
 */


const PTINY: f64 = 1.0e-36;




// ============================================================================
fn calc_monotonic_gradients(domain: &Domain, scratch: &mut Scratch) {
    let Scratch {
        delv_xi, delv_eta, delv_zeta, delx_xi, delx_eta, delx_zeta, ..
    } = scratch;

    let nodelist = &domain.nodelist;
    let (x, y, z) = (&domain.x, &domain.y, &domain.z);
    let (xd, yd, zd) = (&domain.xd, &domain.yd, &domain.zd);
    let (volo, vnew) = (&domain.volo, &domain.vnew);

    delv_xi
        .par_iter_mut()
        .zip_eq(delv_eta.par_iter_mut())
        .zip_eq(delv_zeta.par_iter_mut())
        .zip_eq(delx_xi.par_iter_mut())
        .zip_eq(delx_eta.par_iter_mut())
        .zip_eq(delx_zeta.par_iter_mut())
        .enumerate()
        .for_each(|(elem, (((((dv_xi, dv_eta), dv_zeta), dx_xi), dx_eta), dx_zeta))| {
            let corners = &nodelist[elem];
            let xl = gather(x, corners);
            let yl = gather(y, corners);
            let zl = gather(z, corners);
            let xv = gather(xd, corners);
            let yv = gather(yd, corners);
            let zv = gather(zd, corners);

            let vol = volo[elem] * vnew[elem];
            let norm = 1.0 / (vol + PTINY);

            let quad = |f: &[f64; 8], a: usize, b: usize, c: usize, d: usize| {
                0.25 * (f[a] + f[b] + f[c] + f[d])
            };

            let dxj = -(quad(&xl, 0, 1, 5, 4) - quad(&xl, 3, 2, 6, 7));
            let dyj = -(quad(&yl, 0, 1, 5, 4) - quad(&yl, 3, 2, 6, 7));
            let dzj = -(quad(&zl, 0, 1, 5, 4) - quad(&zl, 3, 2, 6, 7));

            let dxi = quad(&xl, 1, 2, 6, 5) - quad(&xl, 0, 3, 7, 4);
            let dyi = quad(&yl, 1, 2, 6, 5) - quad(&yl, 0, 3, 7, 4);
            let dzi = quad(&zl, 1, 2, 6, 5) - quad(&zl, 0, 3, 7, 4);

            let dxk = quad(&xl, 4, 5, 6, 7) - quad(&xl, 0, 1, 2, 3);
            let dyk = quad(&yl, 4, 5, 6, 7) - quad(&yl, 0, 1, 2, 3);
            let dzk = quad(&zl, 4, 5, 6, 7) - quad(&zl, 0, 1, 2, 3);

            /* zeta: i cross j */
            let ax = dyi * dzj - dzi * dyj;
            let ay = dzi * dxj - dxi * dzj;
            let az = dxi * dyj - dyi * dxj;
            *dx_zeta = vol / (ax * ax + ay * ay + az * az + PTINY).sqrt();
            let dxv = quad(&xv, 4, 5, 6, 7) - quad(&xv, 0, 1, 2, 3);
            let dyv = quad(&yv, 4, 5, 6, 7) - quad(&yv, 0, 1, 2, 3);
            let dzv = quad(&zv, 4, 5, 6, 7) - quad(&zv, 0, 1, 2, 3);
            *dv_zeta = norm * (ax * dxv + ay * dyv + az * dzv);

            /* xi: j cross k */
            let ax = dyj * dzk - dzj * dyk;
            let ay = dzj * dxk - dxj * dzk;
            let az = dxj * dyk - dyj * dxk;
            *dx_xi = vol / (ax * ax + ay * ay + az * az + PTINY).sqrt();
            let dxv = quad(&xv, 1, 2, 6, 5) - quad(&xv, 0, 3, 7, 4);
            let dyv = quad(&yv, 1, 2, 6, 5) - quad(&yv, 0, 3, 7, 4);
            let dzv = quad(&zv, 1, 2, 6, 5) - quad(&zv, 0, 3, 7, 4);
            *dv_xi = norm * (ax * dxv + ay * dyv + az * dzv);

            /* eta: k cross i */
            let ax = dyk * dzi - dzk * dyi;
            let ay = dzk * dxi - dxk * dzi;
            let az = dxk * dyi - dyk * dxi;
            *dx_eta = vol / (ax * ax + ay * ay + az * az + PTINY).sqrt();
            let dxv = -(quad(&xv, 0, 1, 5, 4) - quad(&xv, 3, 2, 6, 7));
            let dyv = -(quad(&yv, 0, 1, 5, 4) - quad(&yv, 3, 2, 6, 7));
            let dzv = -(quad(&zv, 0, 1, 5, 4) - quad(&zv, 3, 2, 6, 7));
            *dv_eta = norm * (ax * dxv + ay * dyv + az * dzv);
        });
}




// ============================================================================
/* slope-limited gradient ratio along one axis */
fn limit_phi(
    delv: &[f64], elem: usize, faces: &[FaceBc; 2],
    limiter_mult: f64, max_slope: f64) -> f64 {
    let norm = 1.0 / (delv[elem] + PTINY);

    let side = |bc: FaceBc| match bc {
        FaceBc::Neighbor(n) => delv[n] * norm,
        FaceBc::Symm => delv[elem] * norm,
        FaceBc::Free => 0.0,
    };

    let delvm = side(faces[0]);
    let delvp = side(faces[1]);

    let mut phi = 0.5 * (delvm + delvp);
    phi = phi.min(delvm * limiter_mult);
    phi = phi.min(delvp * limiter_mult);
    phi = phi.max(0.0);
    phi.min(max_slope)
}


fn calc_monotonic_q(domain: &mut Domain, scratch: &Scratch) {
    let params = &domain.params;
    let limiter_mult = params.monoq_limiter_mult;
    let max_slope = params.monoq_max_slope;
    let qlc = params.qlc_monoq;
    let qqc = params.qqc_monoq;

    let faces = &domain.faces;
    let (vdov, elem_mass, volo, vnew) =
        (&domain.vdov, &domain.elem_mass, &domain.volo, &domain.vnew);
    let (delv_xi, delv_eta, delv_zeta) =
        (&scratch.delv_xi, &scratch.delv_eta, &scratch.delv_zeta);
    let (delx_xi, delx_eta, delx_zeta) =
        (&scratch.delx_xi, &scratch.delx_eta, &scratch.delx_zeta);

    domain
        .ql
        .par_iter_mut()
        .zip_eq(domain.qq.par_iter_mut())
        .enumerate()
        .for_each(|(elem, (ql, qq))| {
            /* elements in expansion take no artificial viscosity */
            if vdov[elem] > 0.0 {
                *ql = 0.0;
                *qq = 0.0;
                return;
            }

            let phixi = limit_phi(delv_xi, elem, &faces[elem].xi, limiter_mult, max_slope);
            let phieta = limit_phi(delv_eta, elem, &faces[elem].eta, limiter_mult, max_slope);
            let phizeta =
                limit_phi(delv_zeta, elem, &faces[elem].zeta, limiter_mult, max_slope);

            let dvx = (delv_xi[elem] * delx_xi[elem]).min(0.0);
            let dve = (delv_eta[elem] * delx_eta[elem]).min(0.0);
            let dvz = (delv_zeta[elem] * delx_zeta[elem]).min(0.0);

            let rho = elem_mass[elem] / (volo[elem] * vnew[elem]);

            *ql = -qlc
                * rho
                * (dvx * (1.0 - phixi) + dve * (1.0 - phieta) + dvz * (1.0 - phizeta));
            *qq = qqc
                * rho
                * (dvx * dvx * (1.0 - phixi * phixi)
                    + dve * dve * (1.0 - phieta * phieta)
                    + dvz * dvz * (1.0 - phizeta * phizeta));
        });
}




// ============================================================================
/// Gradient build, flux-limited q terms, and the runaway-viscosity check.
pub fn calc_q(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    calc_monotonic_gradients(domain, scratch);
    calc_monotonic_q(domain, scratch);

    if let Some(elem) = domain
        .q
        .iter()
        .position(|&q| q > domain.params.qstop)
    {
        return Err(Error::QStop { elem, q: domain.q[elem] });
    }

    Ok(())
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::domain::Params;
    use crate::kinematics;
    use crate::mesh;


    #[test]
    fn expanding_elements_take_no_viscosity() {
        let mut domain = mesh::build(3, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        domain.deltatime = 1e-8;
        for n in 0..domain.num_node() {
            domain.xd[n] = 0.1 * domain.x[n];
            domain.yd[n] = 0.1 * domain.y[n];
            domain.zd[n] = 0.1 * domain.z[n];
        }
        kinematics::calc_lagrange_elements(&mut domain, &mut scratch).unwrap();

        calc_q(&mut domain, &mut scratch).unwrap();

        assert!(domain.ql.iter().all(|&q| q == 0.0));
        assert!(domain.qq.iter().all(|&q| q == 0.0));
    }


    #[test]
    fn uniform_compression_takes_nonnegative_viscosity() {
        let mut domain = mesh::build(3, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        domain.deltatime = 1e-8;
        for n in 0..domain.num_node() {
            domain.xd[n] = -0.1 * domain.x[n];
            domain.yd[n] = -0.1 * domain.y[n];
            domain.zd[n] = -0.1 * domain.z[n];
        }
        kinematics::calc_lagrange_elements(&mut domain, &mut scratch).unwrap();

        calc_q(&mut domain, &mut scratch).unwrap();

        assert!(domain.ql.iter().all(|&q| q >= 0.0));
        assert!(domain.qq.iter().all(|&q| q >= 0.0));
        assert!(domain.ql.iter().any(|&q| q > 0.0));
    }


    #[test]
    fn limiter_slope_stays_between_zero_and_the_max() {
        let limiter_mult = 2.0;
        let max_slope = 1.0;
        let faces = [FaceBc::Neighbor(0), FaceBc::Neighbor(2)];

        // steep monotone jumps on both sides: the raw average is 4.0,
        // clamped down to the configured slope bound
        let delv = [4.0, 1.0, 4.0];
        assert_eq!(limit_phi(&delv, 1, &faces, limiter_mult, max_slope), max_slope);

        // jumps of opposite sign: the raw average is negative, floored at zero
        let delv = [-4.0, 1.0, -2.0];
        assert_eq!(limit_phi(&delv, 1, &faces, limiter_mult, max_slope), 0.0);

        // a free surface carries no jump and pins the limiter at zero
        let delv = [9.0, 1.0, 4.0];
        let faces = [FaceBc::Free, FaceBc::Neighbor(2)];
        assert_eq!(limit_phi(&delv, 1, &faces, limiter_mult, max_slope), 0.0);
    }


    #[test]
    fn runaway_viscosity_is_fatal() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        kinematics::calc_lagrange_elements(&mut domain, &mut scratch).unwrap();
        domain.q[2] = domain.params.qstop * 2.0;

        match calc_q(&mut domain, &mut scratch) {
            Err(Error::QStop { elem, q }) => {
                assert_eq!(elem, 2);
                assert!(q > domain.params.qstop);
            }
            other => panic!("expected a qstop error, got {:?}", other.err()),
        }
    }
}
