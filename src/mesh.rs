use crate::domain::{Corner, Domain, ElemFaces, FaceBc, Params, Region};
use crate::geometry;

/**
 * Builds the indexed cube test problem: `nx^3` hexahedral elements over
 * `[0, 1.125]^3`, a point energy deposit in the corner element, symmetry
 * planes on the three minimum faces and free surfaces on the three maximum
 * faces. Also derives everything the solver needs up front: masses, the
 * node-to-corner adjacency, the material region index sets, and the
 * initial timestep.
 */




// ============================================================================
/* deterministic stand-in for the libc rand() stream used to bin elements
 * into regions */
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }
}




// ============================================================================
/// Energy deposited in the corner element, scaled so the blast strength is
/// invariant with mesh resolution.
fn initial_energy(nx: usize) -> f64 {
    let scale = nx as f64 / 45.0;
    3.948746e+7 * scale * scale * scale
}


fn face_bc(min_face: bool, max_face: bool, minus: usize, plus: usize) -> [FaceBc; 2] {
    [
        if min_face { FaceBc::Symm } else { FaceBc::Neighbor(minus) },
        if max_face { FaceBc::Free } else { FaceBc::Neighbor(plus) },
    ]
}


/// Region index sets: a pseudo-random run-length walk over the elements,
/// binned by a power-law weighting so high-numbered regions stay small when
/// `balance > 0`. The `rep` count marks the back regions as progressively
/// more expensive materials.
fn build_regions(num_elem: usize, num_reg: usize, balance: u32, cost: usize) -> Vec<Region> {
    let mut elems_of: Vec<Vec<usize>> = vec![Vec::new(); num_reg];

    if num_reg == 1 {
        elems_of[0] = (0..num_elem).collect();
    } else {
        let mut rng = Lcg::new(0);
        let bin_end: Vec<u64> = (0..num_reg)
            .scan(0u64, |acc, i| {
                *acc += (i as u64 + 1).pow(balance);
                Some(*acc)
            })
            .collect();
        let denominator = bin_end[num_reg - 1];

        let pick = |rng: &mut Lcg| {
            let var = rng.next() % denominator;
            bin_end.iter().position(|&end| var < end).unwrap()
        };

        let mut next_index = 0;
        let mut last_reg = usize::MAX;
        while next_index < num_elem {
            let mut region = pick(&mut rng);
            while region == last_reg {
                region = pick(&mut rng);
            }

            let bin_size = rng.next() % 1000;
            let run = if bin_size < 773 {
                rng.next() % 15 + 1
            } else if bin_size < 937 {
                rng.next() % 150 + 1
            } else if bin_size < 970 {
                rng.next() % 1500 + 1
            } else {
                rng.next() % 20000 + 1
            };

            let run_to = (next_index + run as usize).min(num_elem);
            elems_of[region].extend(next_index..run_to);
            next_index = run_to;
            last_reg = region;
        }
    }

    elems_of
        .into_iter()
        .enumerate()
        .map(|(r, elems)| Region { elems, rep: region_rep(r, num_reg, cost) })
        .collect()
}


fn region_rep(r: usize, num_reg: usize, cost: usize) -> usize {
    if r < num_reg / 2 {
        1
    } else if r < num_reg - (num_reg + 15) / 20 {
        1 + cost
    } else {
        10 * (1 + cost)
    }
}




// ============================================================================
pub fn build(nx: usize, num_reg: usize, balance: u32, cost: usize, params: Params) -> Domain {
    let en = nx + 1;
    let num_node = en * en * en;
    let num_elem = nx * nx * nx;

    /* nodal coordinates */
    let mut x = Vec::with_capacity(num_node);
    let mut y = Vec::with_capacity(num_node);
    let mut z = Vec::with_capacity(num_node);
    for plane in 0..en {
        for row in 0..en {
            for col in 0..en {
                x.push(1.125 * col as f64 / nx as f64);
                y.push(1.125 * row as f64 / nx as f64);
                z.push(1.125 * plane as f64 / nx as f64);
            }
        }
    }

    /* element connectivity */
    let mut nodelist = Vec::with_capacity(num_elem);
    for plane in 0..nx {
        for row in 0..nx {
            for col in 0..nx {
                let nd0 = plane * en * en + row * en + col;
                nodelist.push([
                    nd0,
                    nd0 + 1,
                    nd0 + en + 1,
                    nd0 + en,
                    nd0 + en * en,
                    nd0 + en * en + 1,
                    nd0 + en * en + en + 1,
                    nd0 + en * en + en,
                ]);
            }
        }
    }

    /* face couplings: symmetry on the minimum faces, free surfaces on the
     * maximum faces, element ids everywhere else */
    let mut faces = Vec::with_capacity(num_elem);
    for plane in 0..nx {
        for row in 0..nx {
            for col in 0..nx {
                let elem = plane * nx * nx + row * nx + col;
                faces.push(ElemFaces {
                    xi: face_bc(col == 0, col == nx - 1, elem.wrapping_sub(1), elem + 1),
                    eta: face_bc(row == 0, row == nx - 1, elem.wrapping_sub(nx), elem + nx),
                    zeta: face_bc(
                        plane == 0,
                        plane == nx - 1,
                        elem.wrapping_sub(nx * nx),
                        elem + nx * nx,
                    ),
                });
            }
        }
    }

    /* reference volumes and masses */
    let mut volo = Vec::with_capacity(num_elem);
    let mut elem_mass = Vec::with_capacity(num_elem);
    let mut nodal_mass = vec![0.0; num_node];
    for corners in &nodelist {
        let xl = crate::domain::gather(&x, corners);
        let yl = crate::domain::gather(&y, corners);
        let zl = crate::domain::gather(&z, corners);
        let volume = geometry::elem_volume(&xl, &yl, &zl);
        volo.push(volume);
        elem_mass.push(volume);
        for &n in corners.iter() {
            nodal_mass[n] += volume / 8.0;
        }
    }

    /* symmetry-plane node lists */
    let mut symm_x = Vec::with_capacity(en * en);
    let mut symm_y = Vec::with_capacity(en * en);
    let mut symm_z = Vec::with_capacity(en * en);
    for a in 0..en {
        for b in 0..en {
            symm_x.push(a * en * en + b * en);
            symm_y.push(a * en * en + b);
            symm_z.push(a * en + b);
        }
    }

    /* node-to-corner adjacency in CSR form */
    let mut corner_start = vec![0usize; num_node + 1];
    for corners in &nodelist {
        for &n in corners.iter() {
            corner_start[n + 1] += 1;
        }
    }
    for n in 0..num_node {
        corner_start[n + 1] += corner_start[n];
    }
    let mut fill = corner_start.clone();
    let mut corner_list = vec![Corner { elem: 0, slot: 0 }; 8 * num_elem];
    for (elem, corners) in nodelist.iter().enumerate() {
        for (slot, &n) in corners.iter().enumerate() {
            corner_list[fill[n]] = Corner { elem, slot };
            fill[n] += 1;
        }
    }

    /* point blast at the corner element, and an initial dt conservative
     * enough to survive it */
    let einit = initial_energy(nx);
    let mut e = vec![0.0; num_elem];
    e[0] = einit;
    let deltatime = 0.5 * volo[0].cbrt() / (2.0 * einit).sqrt();

    Domain {
        x,
        y,
        z,
        xd: vec![0.0; num_node],
        yd: vec![0.0; num_node],
        zd: vec![0.0; num_node],
        xdd: vec![0.0; num_node],
        ydd: vec![0.0; num_node],
        zdd: vec![0.0; num_node],
        fx: vec![0.0; num_node],
        fy: vec![0.0; num_node],
        fz: vec![0.0; num_node],
        nodal_mass,

        symm_x,
        symm_y,
        symm_z,

        nodelist,
        faces,
        volo,
        v: vec![1.0; num_elem],
        vnew: vec![0.0; num_elem],
        delv: vec![0.0; num_elem],
        vdov: vec![0.0; num_elem],
        arealg: vec![0.0; num_elem],
        e,
        p: vec![0.0; num_elem],
        q: vec![0.0; num_elem],
        ql: vec![0.0; num_elem],
        qq: vec![0.0; num_elem],
        ss: vec![0.0; num_elem],
        elem_mass,

        regions: build_regions(num_elem, num_reg, balance, cost),

        corner_start,
        corner_list,

        params,

        time: 0.0,
        deltatime,
        dtcourant: 1.0e+20,
        dthydro: 1.0e+20,
        cycle: 0,
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    fn small_domain() -> Domain {
        build(2, 1, 1, 1, Params::default())
    }


    #[test]
    fn cube_counts_and_total_volume() {
        let d = small_domain();
        assert_eq!(d.num_node(), 27);
        assert_eq!(d.num_elem(), 8);

        let total: f64 = d.volo.iter().sum();
        let edge = 1.125f64;
        assert!((total - edge * edge * edge).abs() < 1e-12);
    }


    #[test]
    fn nodal_mass_conserves_total_mass() {
        let d = small_domain();
        let nodal: f64 = d.nodal_mass.iter().sum();
        let elem: f64 = d.elem_mass.iter().sum();
        assert!((nodal - elem).abs() < 1e-12);
    }


    #[test]
    fn corner_adjacency_covers_every_corner_once() {
        let d = build(3, 1, 1, 1, Params::default());
        assert_eq!(d.corner_list.len(), 8 * d.num_elem());
        assert_eq!(*d.corner_start.last().unwrap(), 8 * d.num_elem());

        let mut seen = vec![false; 8 * d.num_elem()];
        for n in 0..d.num_node() {
            for c in &d.corner_list[d.corner_start[n]..d.corner_start[n + 1]] {
                // the node must actually be that corner of that element
                assert_eq!(d.nodelist[c.elem][c.slot], n);
                assert!(!seen[c.elem * 8 + c.slot]);
                seen[c.elem * 8 + c.slot] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }


    #[test]
    fn boundary_faces_are_tagged() {
        let d = small_domain();

        assert_eq!(d.faces[0].xi[0], FaceBc::Symm);
        assert_eq!(d.faces[0].eta[0], FaceBc::Symm);
        assert_eq!(d.faces[0].zeta[0], FaceBc::Symm);
        assert_eq!(d.faces[0].xi[1], FaceBc::Neighbor(1));
        assert_eq!(d.faces[0].eta[1], FaceBc::Neighbor(2));
        assert_eq!(d.faces[0].zeta[1], FaceBc::Neighbor(4));

        let last = d.num_elem() - 1;
        assert_eq!(d.faces[last].xi[1], FaceBc::Free);
        assert_eq!(d.faces[last].eta[1], FaceBc::Free);
        assert_eq!(d.faces[last].zeta[1], FaceBc::Free);
        assert_eq!(d.faces[last].xi[0], FaceBc::Neighbor(last - 1));
    }


    #[test]
    fn regions_partition_the_elements() {
        let d = build(4, 7, 1, 1, Params::default());
        let mut owner = vec![None; d.num_elem()];
        for (r, region) in d.regions.iter().enumerate() {
            for &elem in &region.elems {
                assert!(owner[elem].is_none());
                owner[elem] = Some(r);
            }
        }
        assert!(owner.iter().all(|o| o.is_some()));
    }


    #[test]
    fn region_rep_tiers() {
        // eleven regions, unit cost: front half cheap, middle doubled,
        // final tier ten-fold
        for r in 0..5 {
            assert_eq!(region_rep(r, 11, 1), 1);
        }
        for r in 5..10 {
            assert_eq!(region_rep(r, 11, 1), 2);
        }
        assert_eq!(region_rep(10, 11, 1), 20);
    }


    #[test]
    fn energy_deposit_and_initial_dt() {
        let d = build(45, 1, 1, 1, Params::default());
        assert!((d.e[0] - 3.948746e+7).abs() < 1.0);
        assert!(d.e[1..].iter().all(|&e| e == 0.0));

        let expect = 0.5 * d.volo[0].cbrt() / (2.0 * d.e[0]).sqrt();
        assert!((d.deltatime - expect).abs() < 1e-20);
    }


    #[test]
    fn symmetry_plane_nodes_have_zero_coordinate() {
        let d = small_domain();
        assert_eq!(d.symm_x.len(), 9);
        assert!(d.symm_x.iter().all(|&n| d.x[n] == 0.0));
        assert!(d.symm_y.iter().all(|&n| d.y[n] == 0.0));
        assert!(d.symm_z.iter().all(|&n| d.z[n] == 0.0));
    }
}
