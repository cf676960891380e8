/**
 * Element-local geometry of a trilinear hexahedron. Everything in this
 * module operates on the 8 corner coordinates of a single element, gathered
 * into fixed arrays; the corner ordering follows the element connectivity
 * (corners 0-3 on the bottom face, 4-7 directly above them).
 */




/// Shape-function derivative matrix: one row per coordinate axis, one
/// column per corner.
pub type BMatrix = [[f64; 8]; 3];




// ============================================================================
fn triple_product(
    x1: f64, y1: f64, z1: f64,
    x2: f64, y2: f64, z2: f64,
    x3: f64, y3: f64, z3: f64) -> f64 {
    x1 * (y2 * z3 - z2 * y3) + x2 * (z1 * y3 - y1 * z3) + x3 * (y1 * z2 - z1 * y2)
}


/// Exact volume of the hexahedron, as the sum of three corner tetrahedra
/// triple products. Negative if the element is inverted.
pub fn elem_volume(x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) -> f64 {
    let dx61 = x[6] - x[1];
    let dy61 = y[6] - y[1];
    let dz61 = z[6] - z[1];

    let dx70 = x[7] - x[0];
    let dy70 = y[7] - y[0];
    let dz70 = z[7] - z[0];

    let dx63 = x[6] - x[3];
    let dy63 = y[6] - y[3];
    let dz63 = z[6] - z[3];

    let dx20 = x[2] - x[0];
    let dy20 = y[2] - y[0];
    let dz20 = z[2] - z[0];

    let dx50 = x[5] - x[0];
    let dy50 = y[5] - y[0];
    let dz50 = z[5] - z[0];

    let dx64 = x[6] - x[4];
    let dy64 = y[6] - y[4];
    let dz64 = z[6] - z[4];

    let dx31 = x[3] - x[1];
    let dy31 = y[3] - y[1];
    let dz31 = z[3] - z[1];

    let dx72 = x[7] - x[2];
    let dy72 = y[7] - y[2];
    let dz72 = z[7] - z[2];

    let dx43 = x[4] - x[3];
    let dy43 = y[4] - y[3];
    let dz43 = z[4] - z[3];

    let dx57 = x[5] - x[7];
    let dy57 = y[5] - y[7];
    let dz57 = z[5] - z[7];

    let dx14 = x[1] - x[4];
    let dy14 = y[1] - y[4];
    let dz14 = z[1] - z[4];

    let dx25 = x[2] - x[5];
    let dy25 = y[2] - y[5];
    let dz25 = z[2] - z[5];

    let volume =
        triple_product(dx31 + dx72, dy31 + dy72, dz31 + dz72, dx63, dy63, dz63, dx20, dy20, dz20) +
        triple_product(dx43 + dx57, dy43 + dy57, dz43 + dz57, dx64, dy64, dz64, dx70, dy70, dz70) +
        triple_product(dx14 + dx25, dy14 + dy25, dz14 + dz25, dx61, dy61, dz61, dx50, dy50, dz50);

    volume / 12.0
}




// ============================================================================
/// Quad face area metric (4 |area|^2). Only the maximum over the six faces
/// is needed, so the square root is deferred to the caller.
#[allow(clippy::too_many_arguments)]
fn area_face(
    x0: f64, x1: f64, x2: f64, x3: f64,
    y0: f64, y1: f64, y2: f64, y3: f64,
    z0: f64, z1: f64, z2: f64, z3: f64) -> f64 {
    let fx = (x2 - x0) - (x3 - x1);
    let fy = (y2 - y0) - (y3 - y1);
    let fz = (z2 - z0) - (z3 - z1);
    let gx = (x2 - x0) + (x3 - x1);
    let gy = (y2 - y0) + (y3 - y1);
    let gz = (z2 - z0) + (z3 - z1);

    (fx * fx + fy * fy + fz * fz) * (gx * gx + gy * gy + gz * gz) -
    (fx * gx + fy * gy + fz * gz) * (fx * gx + fy * gy + fz * gz)
}


/// Characteristic length of the element: 4 volume / sqrt(largest face area
/// metric). Used by the Courant timestep constraint.
pub fn characteristic_length(x: &[f64; 8], y: &[f64; 8], z: &[f64; 8], volume: f64) -> f64 {
    let mut char_length: f64 = 0.0;

    let a = area_face(x[0], x[1], x[2], x[3], y[0], y[1], y[2], y[3], z[0], z[1], z[2], z[3]);
    char_length = char_length.max(a);

    let a = area_face(x[4], x[5], x[6], x[7], y[4], y[5], y[6], y[7], z[4], z[5], z[6], z[7]);
    char_length = char_length.max(a);

    let a = area_face(x[0], x[1], x[5], x[4], y[0], y[1], y[5], y[4], z[0], z[1], z[5], z[4]);
    char_length = char_length.max(a);

    let a = area_face(x[1], x[2], x[6], x[5], y[1], y[2], y[6], y[5], z[1], z[2], z[6], z[5]);
    char_length = char_length.max(a);

    let a = area_face(x[2], x[3], x[7], x[6], y[2], y[3], y[7], y[6], z[2], z[3], z[7], z[6]);
    char_length = char_length.max(a);

    let a = area_face(x[3], x[0], x[4], x[7], y[3], y[0], y[4], y[7], z[3], z[0], z[4], z[7]);
    char_length = char_length.max(a);

    4.0 * volume / char_length.sqrt()
}




// ============================================================================
/// Trilinear shape-function derivatives evaluated at the element center,
/// together with the Jacobian determinant (the element volume). Only the
/// first four columns are independent; corners (4,5,6,7) are the negated
/// (2,3,0,1) columns by symmetry.
pub fn shape_function_derivatives(x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) -> (BMatrix, f64) {
    let fjxxi = 0.125 * ((x[6] - x[0]) + (x[5] - x[3]) - (x[7] - x[1]) - (x[4] - x[2]));
    let fjxet = 0.125 * ((x[6] - x[0]) - (x[5] - x[3]) + (x[7] - x[1]) - (x[4] - x[2]));
    let fjxze = 0.125 * ((x[6] - x[0]) + (x[5] - x[3]) + (x[7] - x[1]) + (x[4] - x[2]));

    let fjyxi = 0.125 * ((y[6] - y[0]) + (y[5] - y[3]) - (y[7] - y[1]) - (y[4] - y[2]));
    let fjyet = 0.125 * ((y[6] - y[0]) - (y[5] - y[3]) + (y[7] - y[1]) - (y[4] - y[2]));
    let fjyze = 0.125 * ((y[6] - y[0]) + (y[5] - y[3]) + (y[7] - y[1]) + (y[4] - y[2]));

    let fjzxi = 0.125 * ((z[6] - z[0]) + (z[5] - z[3]) - (z[7] - z[1]) - (z[4] - z[2]));
    let fjzet = 0.125 * ((z[6] - z[0]) - (z[5] - z[3]) + (z[7] - z[1]) - (z[4] - z[2]));
    let fjzze = 0.125 * ((z[6] - z[0]) + (z[5] - z[3]) + (z[7] - z[1]) + (z[4] - z[2]));

    /* cofactors of the jacobian */
    let cjxxi = fjyet * fjzze - fjzet * fjyze;
    let cjxet = -(fjyxi * fjzze) + fjzxi * fjyze;
    let cjxze = fjyxi * fjzet - fjzxi * fjyet;

    let cjyxi = -(fjxet * fjzze) + fjzet * fjxze;
    let cjyet = fjxxi * fjzze - fjzxi * fjxze;
    let cjyze = -(fjxxi * fjzet) + fjzxi * fjxet;

    let cjzxi = fjxet * fjyze - fjyet * fjxze;
    let cjzet = -(fjxxi * fjyze) + fjyxi * fjxze;
    let cjzze = fjxxi * fjyet - fjyxi * fjxet;

    let mut b = [[0.0; 8]; 3];

    b[0][0] = -cjxxi - cjxet - cjxze;
    b[0][1] = cjxxi - cjxet - cjxze;
    b[0][2] = cjxxi + cjxet - cjxze;
    b[0][3] = -cjxxi + cjxet - cjxze;
    b[0][4] = -b[0][2];
    b[0][5] = -b[0][3];
    b[0][6] = -b[0][0];
    b[0][7] = -b[0][1];

    b[1][0] = -cjyxi - cjyet - cjyze;
    b[1][1] = cjyxi - cjyet - cjyze;
    b[1][2] = cjyxi + cjyet - cjyze;
    b[1][3] = -cjyxi + cjyet - cjyze;
    b[1][4] = -b[1][2];
    b[1][5] = -b[1][3];
    b[1][6] = -b[1][0];
    b[1][7] = -b[1][1];

    b[2][0] = -cjzxi - cjzet - cjzze;
    b[2][1] = cjzxi - cjzet - cjzze;
    b[2][2] = cjzxi + cjzet - cjzze;
    b[2][3] = -cjzxi + cjzet - cjzze;
    b[2][4] = -b[2][2];
    b[2][5] = -b[2][3];
    b[2][6] = -b[2][0];
    b[2][7] = -b[2][1];

    let volume = 8.0 * (fjxet * cjxet + fjyet * cjyet + fjzet * cjzet);

    (b, volume)
}




// ============================================================================
#[allow(clippy::too_many_arguments)]
fn sum_face_normal(
    pfx: &mut [f64; 8], pfy: &mut [f64; 8], pfz: &mut [f64; 8],
    corners: [usize; 4],
    x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) {
    let [n0, n1, n2, n3] = corners;

    let bisect_x0 = 0.5 * (x[n3] + x[n2] - x[n1] - x[n0]);
    let bisect_y0 = 0.5 * (y[n3] + y[n2] - y[n1] - y[n0]);
    let bisect_z0 = 0.5 * (z[n3] + z[n2] - z[n1] - z[n0]);
    let bisect_x1 = 0.5 * (x[n2] + x[n1] - x[n3] - x[n0]);
    let bisect_y1 = 0.5 * (y[n2] + y[n1] - y[n3] - y[n0]);
    let bisect_z1 = 0.5 * (z[n2] + z[n1] - z[n3] - z[n0]);

    let area_x = 0.25 * (bisect_y0 * bisect_z1 - bisect_z0 * bisect_y1);
    let area_y = 0.25 * (bisect_z0 * bisect_x1 - bisect_x0 * bisect_z1);
    let area_z = 0.25 * (bisect_x0 * bisect_y1 - bisect_y0 * bisect_x1);

    for &n in &corners {
        pfx[n] += area_x;
        pfy[n] += area_y;
        pfz[n] += area_z;
    }
}


/// Corner node normals: each corner accumulates a quarter of the face
/// normal area of the three faces it belongs to. Over a closed element the
/// corner normals sum to zero per axis.
pub fn node_normals(x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) -> ([f64; 8], [f64; 8], [f64; 8]) {
    let mut pfx = [0.0; 8];
    let mut pfy = [0.0; 8];
    let mut pfz = [0.0; 8];

    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [0, 1, 2, 3], x, y, z);
    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [0, 4, 5, 1], x, y, z);
    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [1, 5, 6, 2], x, y, z);
    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [2, 6, 7, 3], x, y, z);
    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [3, 7, 4, 0], x, y, z);
    sum_face_normal(&mut pfx, &mut pfy, &mut pfz, [4, 7, 6, 5], x, y, z);

    (pfx, pfy, pfz)
}




// ============================================================================
fn volu_der(
    c: [usize; 6],
    x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) -> (f64, f64, f64) {
    let [n0, n1, n2, n3, n4, n5] = c;

    let dvdx = (y[n1] + y[n2]) * (z[n0] + z[n1]) - (y[n0] + y[n1]) * (z[n1] + z[n2]) +
               (y[n0] + y[n4]) * (z[n3] + z[n4]) - (y[n3] + y[n4]) * (z[n0] + z[n4]) -
               (y[n2] + y[n5]) * (z[n3] + z[n5]) + (y[n3] + y[n5]) * (z[n2] + z[n5]);

    let dvdy = -(x[n1] + x[n2]) * (z[n0] + z[n1]) + (x[n0] + x[n1]) * (z[n1] + z[n2]) -
               (x[n0] + x[n4]) * (z[n3] + z[n4]) + (x[n3] + x[n4]) * (z[n0] + z[n4]) +
               (x[n2] + x[n5]) * (z[n3] + z[n5]) - (x[n3] + x[n5]) * (z[n2] + z[n5]);

    let dvdz = -(y[n1] + y[n2]) * (x[n0] + x[n1]) + (y[n0] + y[n1]) * (x[n1] + x[n2]) -
               (y[n0] + y[n4]) * (x[n3] + x[n4]) + (y[n3] + y[n4]) * (x[n0] + x[n4]) +
               (y[n2] + y[n5]) * (x[n3] + x[n5]) - (y[n3] + y[n5]) * (x[n2] + x[n5]);

    (dvdx / 12.0, dvdy / 12.0, dvdz / 12.0)
}


/// Partial derivatives of the element volume with respect to each corner's
/// position, used to make the hourglass modes volume-consistent.
pub fn volume_derivatives(x: &[f64; 8], y: &[f64; 8], z: &[f64; 8]) -> ([f64; 8], [f64; 8], [f64; 8]) {
    let mut dvdx = [0.0; 8];
    let mut dvdy = [0.0; 8];
    let mut dvdz = [0.0; 8];

    // each corner's stencil: its three edge neighbors and the three corners
    // diagonally across the adjacent faces
    let stencil = [
        (0, [1, 2, 3, 4, 5, 7]),
        (3, [0, 1, 2, 7, 4, 6]),
        (2, [3, 0, 1, 6, 7, 5]),
        (1, [2, 3, 0, 5, 6, 4]),
        (4, [7, 6, 5, 0, 3, 1]),
        (5, [4, 7, 6, 1, 0, 2]),
        (6, [5, 4, 7, 2, 1, 3]),
        (7, [6, 5, 4, 3, 2, 0]),
    ];

    for &(corner, c) in &stencil {
        let (dx, dy, dz) = volu_der(c, x, y, z);
        dvdx[corner] = dx;
        dvdy[corner] = dy;
        dvdz[corner] = dz;
    }

    (dvdx, dvdy, dvdz)
}




// ============================================================================
/// Velocity-gradient tensor from the B-matrix contraction: diagonal terms
/// in slots 0-2, symmetrized off-diagonal terms in slots 3-5.
pub fn velocity_gradient(
    xd: &[f64; 8], yd: &[f64; 8], zd: &[f64; 8],
    b: &BMatrix, det_j: f64) -> [f64; 6] {
    let inv_det_j = 1.0 / det_j;
    let pfx = &b[0];
    let pfy = &b[1];
    let pfz = &b[2];

    // by symmetry only corner pairs (0,6) (1,7) (2,4) (3,5) are needed
    let contract = |pf: &[f64; 8], v: &[f64; 8]| {
        inv_det_j * (pf[0] * (v[0] - v[6]) + pf[1] * (v[1] - v[7]) +
                     pf[2] * (v[2] - v[4]) + pf[3] * (v[3] - v[5]))
    };

    let mut d = [0.0; 6];

    d[0] = contract(pfx, xd);
    d[1] = contract(pfy, yd);
    d[2] = contract(pfz, zd);

    let dyddx = contract(pfx, yd);
    let dxddy = contract(pfy, xd);
    let dzddx = contract(pfx, zd);
    let dxddz = contract(pfz, xd);
    let dzddy = contract(pfy, zd);
    let dyddz = contract(pfz, yd);

    d[5] = 0.5 * (dxddy + dyddx);
    d[4] = 0.5 * (dxddz + dzddx);
    d[3] = 0.5 * (dzddy + dyddz);

    d
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    fn unit_cube() -> ([f64; 8], [f64; 8], [f64; 8]) {
        let x = [0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        let z = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y, z)
    }


    #[test]
    fn unit_cube_has_unit_volume() {
        let (x, y, z) = unit_cube();
        assert!((elem_volume(&x, &y, &z) - 1.0).abs() < 1e-14);
    }


    #[test]
    fn inverted_cube_has_negative_volume() {
        let (mut x, mut y, mut z) = unit_cube();
        x.swap(0, 6);
        y.swap(0, 6);
        z.swap(0, 6);
        assert!(elem_volume(&x, &y, &z) < 0.0);
    }


    #[test]
    fn jacobian_volume_matches_exact_volume_on_cube() {
        let (x, y, z) = unit_cube();
        let (_, vol) = shape_function_derivatives(&x, &y, &z);
        assert!((vol - 1.0).abs() < 1e-14);
    }


    #[test]
    fn shape_derivative_columns_sum_to_zero() {
        let (x, y, z) = unit_cube();
        let (b, _) = shape_function_derivatives(&x, &y, &z);
        for row in &b {
            let sum: f64 = row.iter().sum();
            assert!(sum.abs() < 1e-14);
        }
    }


    #[test]
    fn unit_cube_characteristic_length_is_one() {
        let (x, y, z) = unit_cube();
        let vol = elem_volume(&x, &y, &z);
        assert!((characteristic_length(&x, &y, &z, vol) - 1.0).abs() < 1e-14);
    }


    #[test]
    fn node_normals_sum_to_zero_over_closed_element() {
        let (x, y, z) = unit_cube();
        let (pfx, pfy, pfz) = node_normals(&x, &y, &z);
        assert!(pfx.iter().sum::<f64>().abs() < 1e-14);
        assert!(pfy.iter().sum::<f64>().abs() < 1e-14);
        assert!(pfz.iter().sum::<f64>().abs() < 1e-14);
    }


    #[test]
    fn uniform_expansion_has_diagonal_velocity_gradient() {
        let (x, y, z) = unit_cube();
        // velocity field v = r: divergence 3, no shear
        let (b, det_j) = shape_function_derivatives(&x, &y, &z);
        let d = velocity_gradient(&x, &y, &z, &b, det_j);
        assert!((d[0] - 1.0).abs() < 1e-12);
        assert!((d[1] - 1.0).abs() < 1e-12);
        assert!((d[2] - 1.0).abs() < 1e-12);
        assert!(d[3].abs() < 1e-12);
        assert!(d[4].abs() < 1e-12);
        assert!(d[5].abs() < 1e-12);
    }
}
