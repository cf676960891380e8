use rayon::prelude::*;

use crate::domain::{gather, Domain};
use crate::error::Error;
use crate::geometry;
use crate::scratch::Scratch;

/**
 * Element kinematics for one cycle: new relative volumes, characteristic
 * lengths, and the principal strain rates evaluated at the mid-step
 * configuration. Runs after the nodal advance, so positions are already at
 * the end of the step and are walked back a half step for the gradient.
 */




pub fn calc_lagrange_elements(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    let dt = domain.deltatime;

    {
        let Scratch { dxx, dyy, dzz, .. } = scratch;
        let Domain {
            x, y, z, xd, yd, zd, nodelist, volo, v, vnew, delv, arealg, vdov, ..
        } = domain;
        let (x, y, z) = (&*x, &*y, &*z);
        let (xd, yd, zd) = (&*xd, &*yd, &*zd);
        let (nodelist, volo, v) = (&*nodelist, &*volo, &*v);

        vnew.par_iter_mut()
            .zip_eq(delv.par_iter_mut())
            .zip_eq(arealg.par_iter_mut())
            .zip_eq(vdov.par_iter_mut())
            .zip_eq(dxx.par_iter_mut())
            .zip_eq(dyy.par_iter_mut())
            .zip_eq(dzz.par_iter_mut())
            .enumerate()
            .for_each(|(elem, ((((((vnew, delv), arealg), vdov), dxx), dyy), dzz))| {
                let corners = &nodelist[elem];
                let mut xl = gather(x, corners);
                let mut yl = gather(y, corners);
                let mut zl = gather(z, corners);
                let xdl = gather(xd, corners);
                let ydl = gather(yd, corners);
                let zdl = gather(zd, corners);

                let volume = geometry::elem_volume(&xl, &yl, &zl);
                let relative = volume / volo[elem];
                *vnew = relative;
                *delv = relative - v[elem];
                *arealg = geometry::characteristic_length(&xl, &yl, &zl, volume);

                /* strain rate at the mid-step configuration */
                for j in 0..8 {
                    xl[j] -= 0.5 * dt * xdl[j];
                    yl[j] -= 0.5 * dt * ydl[j];
                    zl[j] -= 0.5 * dt * zdl[j];
                }
                let (b, det_j) = geometry::shape_function_derivatives(&xl, &yl, &zl);
                let d = geometry::velocity_gradient(&xdl, &ydl, &zdl, &b, det_j);

                /* keep the volumetric part, make the stored rates deviatoric */
                let div = d[0] + d[1] + d[2];
                *vdov = div;
                *dxx = d[0] - div / 3.0;
                *dyy = d[1] - div / 3.0;
                *dzz = d[2] - div / 3.0;
            });
    }

    if let Some(elem) = domain.vnew.iter().position(|&v| v <= 0.0) {
        return Err(Error::Volume { elem });
    }

    Ok(())
}
