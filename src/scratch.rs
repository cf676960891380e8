use crate::domain::Domain;

/**
 * Per-cycle working storage. One arena owns every temporary the stages
 * need, sized once from the domain and passed explicitly, so the hot loop
 * never allocates and buffer lifetimes are obvious at the call sites.
 *
 * Corner-indexed buffers hold eight entries per element at flat index
 * `elem * 8 + slot`; writers take them in disjoint 8-slot chunks, the
 * nodal reduction reads them through the corner adjacency.
 */
pub struct Scratch {
    /* stress integration */
    pub sigxx: Vec<f64>,
    pub sigyy: Vec<f64>,
    pub sigzz: Vec<f64>,
    pub determ: Vec<f64>,

    /* corner forces awaiting the nodal reduction */
    pub fx_elem: Vec<f64>,
    pub fy_elem: Vec<f64>,
    pub fz_elem: Vec<f64>,

    /* hourglass temporaries: volume derivatives and gathered corner
     * coordinates */
    pub dvdx: Vec<f64>,
    pub dvdy: Vec<f64>,
    pub dvdz: Vec<f64>,
    pub x8n: Vec<f64>,
    pub y8n: Vec<f64>,
    pub z8n: Vec<f64>,

    /* principal strain rates */
    pub dxx: Vec<f64>,
    pub dyy: Vec<f64>,
    pub dzz: Vec<f64>,

    /* monotonic-Q directional gradients */
    pub delv_xi: Vec<f64>,
    pub delv_eta: Vec<f64>,
    pub delv_zeta: Vec<f64>,
    pub delx_xi: Vec<f64>,
    pub delx_eta: Vec<f64>,
    pub delx_zeta: Vec<f64>,

    /* EOS view of the new volumes, clamped to the eos bounds */
    pub vnewc: Vec<f64>,

    pub region: RegionScratch,
}


/// Dense per-region arrays for the EOS solve, sized to the largest region
/// and reused for each one in turn.
pub struct RegionScratch {
    pub e_old: Vec<f64>,
    pub delvc: Vec<f64>,
    pub p_old: Vec<f64>,
    pub q_old: Vec<f64>,
    pub qq_old: Vec<f64>,
    pub ql_old: Vec<f64>,
    pub compression: Vec<f64>,
    pub comp_half_step: Vec<f64>,
    pub work: Vec<f64>,
    pub p_new: Vec<f64>,
    pub e_new: Vec<f64>,
    pub q_new: Vec<f64>,
    pub p_half_step: Vec<f64>,
    pub bvc: Vec<f64>,
    pub pbvc: Vec<f64>,
}


impl Scratch {
    pub fn new(domain: &Domain) -> Self {
        let num_elem = domain.num_elem();
        let max_region = domain
            .regions
            .iter()
            .map(|r| r.elems.len())
            .max()
            .unwrap_or(0);

        Scratch {
            sigxx: vec![0.0; num_elem],
            sigyy: vec![0.0; num_elem],
            sigzz: vec![0.0; num_elem],
            determ: vec![0.0; num_elem],

            fx_elem: vec![0.0; 8 * num_elem],
            fy_elem: vec![0.0; 8 * num_elem],
            fz_elem: vec![0.0; 8 * num_elem],

            dvdx: vec![0.0; 8 * num_elem],
            dvdy: vec![0.0; 8 * num_elem],
            dvdz: vec![0.0; 8 * num_elem],
            x8n: vec![0.0; 8 * num_elem],
            y8n: vec![0.0; 8 * num_elem],
            z8n: vec![0.0; 8 * num_elem],

            dxx: vec![0.0; num_elem],
            dyy: vec![0.0; num_elem],
            dzz: vec![0.0; num_elem],

            delv_xi: vec![0.0; num_elem],
            delv_eta: vec![0.0; num_elem],
            delv_zeta: vec![0.0; num_elem],
            delx_xi: vec![0.0; num_elem],
            delx_eta: vec![0.0; num_elem],
            delx_zeta: vec![0.0; num_elem],

            vnewc: vec![0.0; num_elem],

            region: RegionScratch {
                e_old: vec![0.0; max_region],
                delvc: vec![0.0; max_region],
                p_old: vec![0.0; max_region],
                q_old: vec![0.0; max_region],
                qq_old: vec![0.0; max_region],
                ql_old: vec![0.0; max_region],
                compression: vec![0.0; max_region],
                comp_half_step: vec![0.0; max_region],
                work: vec![0.0; max_region],
                p_new: vec![0.0; max_region],
                e_new: vec![0.0; max_region],
                q_new: vec![0.0; max_region],
                p_half_step: vec![0.0; max_region],
                bvc: vec![0.0; max_region],
                pbvc: vec![0.0; max_region],
            },
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::domain::Params;
    use crate::mesh;


    #[test]
    fn buffers_are_sized_from_the_domain() {
        let domain = mesh::build(2, 3, 1, 1, Params::default());
        let scratch = Scratch::new(&domain);

        assert_eq!(scratch.determ.len(), domain.num_elem());
        assert_eq!(scratch.fx_elem.len(), 8 * domain.num_elem());
        assert_eq!(scratch.x8n.len(), 8 * domain.num_elem());

        let largest = domain.regions.iter().map(|r| r.elems.len()).max().unwrap();
        assert_eq!(scratch.region.e_old.len(), largest);
    }
}
