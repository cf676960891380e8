use rayon::prelude::*;

use crate::domain::{gather, Corner, Domain};
use crate::error::Error;
use crate::geometry;
use crate::scratch::Scratch;

/**
 * Nodal half of the leapfrog: assemble the corner forces from the element
 * stresses and the anti-hourglass terms, reduce them to the nodes, then
 * integrate acceleration, velocity and position.
 *
 * Corner forces are written element-parallel into disjoint 8-slot chunks
 * of the scratch buffers; the reduction is node-parallel over the corner
 * adjacency. No two workers ever touch the same slot, and each node sums
 * its corners in a fixed order, so results are bitwise reproducible at any
 * worker count.
 */




/* Flanagan-Belytschko hourglass base vectors, one row per mode */
const GAMMA: [[f64; 8]; 4] = [
    [1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0],
];




// ============================================================================
/// Fold the per-corner force contributions into the nodal force arrays,
/// walking each node's slice of the corner adjacency. `accumulate` keeps
/// the running totals (the hourglass pass adds to the stress pass).
#[allow(clippy::too_many_arguments)]
fn reduce_corner_forces(
    fx: &mut [f64], fy: &mut [f64], fz: &mut [f64],
    corner_start: &[usize], corner_list: &[Corner],
    fx_elem: &[f64], fy_elem: &[f64], fz_elem: &[f64],
    accumulate: bool) {
    fx.par_iter_mut()
        .zip_eq(fy.par_iter_mut())
        .zip_eq(fz.par_iter_mut())
        .enumerate()
        .for_each(|(node, ((fx, fy), fz))| {
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            let mut sum_z = 0.0;
            for c in &corner_list[corner_start[node]..corner_start[node + 1]] {
                let slot = c.elem * 8 + c.slot;
                sum_x += fx_elem[slot];
                sum_y += fy_elem[slot];
                sum_z += fz_elem[slot];
            }
            if accumulate {
                *fx += sum_x;
                *fy += sum_y;
                *fz += sum_z;
            } else {
                *fx = sum_x;
                *fy = sum_y;
                *fz = sum_z;
            }
        });
}




// ============================================================================
/// Integrate the isotropic stress -(p + q) over each element and set the
/// nodal force totals. Fails on a non-positive Jacobian determinant.
fn integrate_stress(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    let Scratch {
        sigxx, sigyy, sigzz, determ, fx_elem, fy_elem, fz_elem, ..
    } = scratch;

    sigxx
        .par_iter_mut()
        .zip_eq(sigyy.par_iter_mut())
        .zip_eq(sigzz.par_iter_mut())
        .enumerate()
        .for_each(|(elem, ((sx, sy), sz))| {
            let sig = -domain.p[elem] - domain.q[elem];
            *sx = sig;
            *sy = sig;
            *sz = sig;
        });

    let nodelist = &domain.nodelist;
    let (x, y, z) = (&domain.x, &domain.y, &domain.z);
    let (sigxx, sigyy, sigzz) = (&*sigxx, &*sigyy, &*sigzz);

    fx_elem
        .par_chunks_mut(8)
        .zip_eq(fy_elem.par_chunks_mut(8))
        .zip_eq(fz_elem.par_chunks_mut(8))
        .zip_eq(determ.par_iter_mut())
        .enumerate()
        .for_each(|(elem, (((fx, fy), fz), determ))| {
            let corners = &nodelist[elem];
            let xl = gather(x, corners);
            let yl = gather(y, corners);
            let zl = gather(z, corners);

            let (_, det) = geometry::shape_function_derivatives(&xl, &yl, &zl);
            *determ = det;

            let (pfx, pfy, pfz) = geometry::node_normals(&xl, &yl, &zl);
            for i in 0..8 {
                fx[i] = -sigxx[elem] * pfx[i];
                fy[i] = -sigyy[elem] * pfy[i];
                fz[i] = -sigzz[elem] * pfz[i];
            }
        });

    if let Some(elem) = determ.iter().position(|&d| d <= 0.0) {
        return Err(Error::Volume { elem });
    }

    reduce_corner_forces(
        &mut domain.fx, &mut domain.fy, &mut domain.fz,
        &domain.corner_start, &domain.corner_list,
        fx_elem, fy_elem, fz_elem,
        false,
    );

    Ok(())
}




// ============================================================================
fn hourglass_corner_forces(
    domain: &Domain, scratch: &mut Scratch, hgcoef: f64) {
    let Scratch {
        determ, fx_elem, fy_elem, fz_elem, dvdx, dvdy, dvdz, x8n, y8n, z8n, ..
    } = scratch;

    let nodelist = &domain.nodelist;
    let (dvdx, dvdy, dvdz) = (&*dvdx, &*dvdy, &*dvdz);
    let (x8n, y8n, z8n) = (&*x8n, &*y8n, &*z8n);
    let determ = &*determ;

    fx_elem
        .par_chunks_mut(8)
        .zip_eq(fy_elem.par_chunks_mut(8))
        .zip_eq(fz_elem.par_chunks_mut(8))
        .enumerate()
        .for_each(|(elem, ((hgfx, hgfy), hgfz))| {
            let base = elem * 8;
            let vol_inv = 1.0 / determ[elem];

            /* hourglass shape vectors, made volume-orthogonal */
            let mut hourgam = [[0.0f64; 4]; 8];
            for (mode, gamma) in GAMMA.iter().enumerate() {
                let mut hx = 0.0;
                let mut hy = 0.0;
                let mut hz = 0.0;
                for j in 0..8 {
                    hx += x8n[base + j] * gamma[j];
                    hy += y8n[base + j] * gamma[j];
                    hz += z8n[base + j] * gamma[j];
                }
                for j in 0..8 {
                    hourgam[j][mode] = gamma[j]
                        - vol_inv
                            * (dvdx[base + j] * hx + dvdy[base + j] * hy + dvdz[base + j] * hz);
                }
            }

            let coefficient =
                -hgcoef * 0.01 * domain.ss[elem] * domain.elem_mass[elem] / determ[elem].cbrt();

            let corners = &nodelist[elem];
            let xd = gather(&domain.xd, corners);
            let yd = gather(&domain.yd, corners);
            let zd = gather(&domain.zd, corners);

            let mut resist = |vel: &[f64; 8], out: &mut [f64]| {
                let mut h = [0.0f64; 4];
                for mode in 0..4 {
                    for j in 0..8 {
                        h[mode] += hourgam[j][mode] * vel[j];
                    }
                }
                for j in 0..8 {
                    let mut f = 0.0;
                    for mode in 0..4 {
                        f += hourgam[j][mode] * h[mode];
                    }
                    out[j] = coefficient * f;
                }
            };

            resist(&xd, hgfx);
            resist(&yd, hgfy);
            resist(&zd, hgfz);
        });
}


/// Hourglass control: collect corner coordinates and volume derivatives,
/// then add the mode-damping forces to the nodal totals. Fails on a
/// non-positive relative volume.
fn hourglass_control(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    let hgcoef = domain.params.hgcoef;

    {
        let Scratch {
            determ, dvdx, dvdy, dvdz, x8n, y8n, z8n, ..
        } = scratch;
        let nodelist = &domain.nodelist;
        let (x, y, z) = (&domain.x, &domain.y, &domain.z);
        let (volo, v) = (&domain.volo, &domain.v);

        dvdx.par_chunks_mut(8)
            .zip_eq(dvdy.par_chunks_mut(8))
            .zip_eq(dvdz.par_chunks_mut(8))
            .zip_eq(x8n.par_chunks_mut(8))
            .zip_eq(y8n.par_chunks_mut(8))
            .zip_eq(z8n.par_chunks_mut(8))
            .zip_eq(determ.par_iter_mut())
            .enumerate()
            .for_each(|(elem, ((((((dvdx, dvdy), dvdz), x8n), y8n), z8n), determ))| {
                let corners = &nodelist[elem];
                let xl = gather(x, corners);
                let yl = gather(y, corners);
                let zl = gather(z, corners);

                let (dx, dy, dz) = geometry::volume_derivatives(&xl, &yl, &zl);
                dvdx.copy_from_slice(&dx);
                dvdy.copy_from_slice(&dy);
                dvdz.copy_from_slice(&dz);
                x8n.copy_from_slice(&xl);
                y8n.copy_from_slice(&yl);
                z8n.copy_from_slice(&zl);

                *determ = volo[elem] * v[elem];
            });
    }

    if let Some(elem) = domain.v.iter().position(|&v| v <= 0.0) {
        return Err(Error::Volume { elem });
    }

    if hgcoef > 0.0 {
        hourglass_corner_forces(domain, scratch, hgcoef);

        let Scratch { fx_elem, fy_elem, fz_elem, .. } = scratch;
        reduce_corner_forces(
            &mut domain.fx, &mut domain.fy, &mut domain.fz,
            &domain.corner_start, &domain.corner_list,
            fx_elem, fy_elem, fz_elem,
            true,
        );
    }

    Ok(())
}




// ============================================================================
fn calc_force_for_nodes(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    integrate_stress(domain, scratch)?;
    hourglass_control(domain, scratch)?;
    Ok(())
}


fn calc_acceleration(domain: &mut Domain) {
    let Domain {
        xdd, ydd, zdd, fx, fy, fz, nodal_mass, ..
    } = domain;

    xdd.par_iter_mut()
        .zip_eq(ydd.par_iter_mut())
        .zip_eq(zdd.par_iter_mut())
        .zip_eq(fx.par_iter())
        .zip_eq(fy.par_iter())
        .zip_eq(fz.par_iter())
        .zip_eq(nodal_mass.par_iter())
        .for_each(|((((((xdd, ydd), zdd), fx), fy), fz), mass)| {
            *xdd = fx / mass;
            *ydd = fy / mass;
            *zdd = fz / mass;
        });
}


/* zero the normal acceleration on each symmetry plane */
fn apply_symmetry_conditions(domain: &mut Domain) {
    for &node in &domain.symm_x {
        domain.xdd[node] = 0.0;
    }
    for &node in &domain.symm_y {
        domain.ydd[node] = 0.0;
    }
    for &node in &domain.symm_z {
        domain.zdd[node] = 0.0;
    }
}


fn calc_velocity(domain: &mut Domain, dt: f64) {
    let u_cut = domain.params.u_cut;
    let Domain { xd, yd, zd, xdd, ydd, zdd, .. } = domain;

    let advance = |vel: &mut Vec<f64>, acc: &Vec<f64>| {
        vel.par_iter_mut().zip_eq(acc.par_iter()).for_each(|(vel, acc)| {
            let next = *vel + acc * dt;
            *vel = if next.abs() < u_cut { 0.0 } else { next };
        });
    };

    advance(xd, xdd);
    advance(yd, ydd);
    advance(zd, zdd);
}


fn calc_position(domain: &mut Domain, dt: f64) {
    let Domain { x, y, z, xd, yd, zd, .. } = domain;

    x.par_iter_mut().zip_eq(xd.par_iter()).for_each(|(x, xd)| *x += xd * dt);
    y.par_iter_mut().zip_eq(yd.par_iter()).for_each(|(y, yd)| *y += yd * dt);
    z.par_iter_mut().zip_eq(zd.par_iter()).for_each(|(z, zd)| *z += zd * dt);
}




// ============================================================================
/// Force assembly plus the nodal advance for one cycle.
pub fn lagrange_nodal(domain: &mut Domain, scratch: &mut Scratch) -> Result<(), Error> {
    let dt = domain.deltatime;

    calc_force_for_nodes(domain, scratch)?;
    calc_acceleration(domain);
    apply_symmetry_conditions(domain);
    calc_velocity(domain, dt);
    calc_position(domain, dt);

    Ok(())
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::domain::Params;
    use crate::mesh;


    #[test]
    fn uniform_pressure_forces_balance() {
        let mut domain = mesh::build(3, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        for p in domain.p.iter_mut() {
            *p = 1.0;
        }

        calc_force_for_nodes(&mut domain, &mut scratch).unwrap();

        assert!(domain.fx.iter().sum::<f64>().abs() < 1e-10);
        assert!(domain.fy.iter().sum::<f64>().abs() < 1e-10);
        assert!(domain.fz.iter().sum::<f64>().abs() < 1e-10);
    }


    #[test]
    fn reduction_is_independent_of_worker_count() {
        let run = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            pool.install(|| {
                let mut domain = mesh::build(4, 1, 1, 1, Params::default());
                let mut scratch = Scratch::new(&domain);
                for (elem, p) in domain.p.iter_mut().enumerate() {
                    *p = 1.0 + elem as f64 * 0.01;
                }
                for (node, xd) in domain.xd.iter_mut().enumerate() {
                    *xd = (node as f64).sin();
                }
                for ss in domain.ss.iter_mut() {
                    *ss = 1.0;
                }
                calc_force_for_nodes(&mut domain, &mut scratch).unwrap();
                (domain.fx, domain.fy, domain.fz)
            })
        };

        let serial = run(1);
        let parallel = run(4);
        // fixed reduction order makes this bitwise, not approximate
        assert_eq!(serial, parallel);
    }


    #[test]
    fn symmetry_plane_accelerations_are_pinned() {
        let mut domain = mesh::build(3, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        for (elem, p) in domain.p.iter_mut().enumerate() {
            *p = 1.0 + elem as f64 * 0.1;
        }

        lagrange_nodal(&mut domain, &mut scratch).unwrap();

        for &node in &domain.symm_x {
            assert_eq!(domain.xdd[node], 0.0);
        }
        for &node in &domain.symm_y {
            assert_eq!(domain.ydd[node], 0.0);
        }
        for &node in &domain.symm_z {
            assert_eq!(domain.zdd[node], 0.0);
        }
    }


    #[test]
    fn tiny_velocities_snap_to_zero() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        domain.xd[5] = 1e-9;
        domain.yd[5] = 0.5;

        let dt = domain.deltatime;
        calc_velocity(&mut domain, dt);

        assert_eq!(domain.xd[5], 0.0);
        assert!((domain.yd[5] - 0.5).abs() < 1e-12);
    }


    #[test]
    fn inverted_element_is_fatal() {
        let mut domain = mesh::build(2, 1, 1, 1, Params::default());
        let mut scratch = Scratch::new(&domain);
        // swap two body-diagonal corners of element 0 to invert it
        domain.nodelist[0].swap(0, 6);

        match calc_force_for_nodes(&mut domain, &mut scratch) {
            Err(Error::Volume { elem }) => assert_eq!(elem, 0),
            other => panic!("expected a volume error, got {:?}", other.err()),
        }
    }
}
