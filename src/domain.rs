use serde::Serialize;

/**
 * Simulation state for one mesh partition. Nodal and element fields are
 * stored struct-of-arrays so the hot kernels iterate flat `Vec<f64>` slices;
 * connectivity (element corner lists, face couplings, and the node-to-corner
 * adjacency) is built once by `mesh` and never changes during a run.
 */




// ============================================================================
/// What lies on the far side of one element face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceBc {
    /// An interior face: the id of the adjacent element.
    Neighbor(usize),
    /// A symmetry plane: mirror-image ghost, zero normal motion.
    Symm,
    /// A free surface: zero-stress ghost.
    Free,
}


/// Face couplings of one element along the three logical mesh axes.
/// Index 0 is the minus-side face, index 1 the plus-side face.
#[derive(Debug, Clone, Copy)]
pub struct ElemFaces {
    pub xi: [FaceBc; 2],
    pub eta: [FaceBc; 2],
    pub zeta: [FaceBc; 2],
}


/// One entry of the node-to-corner adjacency: node `n` is corner `slot`
/// of element `elem`, so its contribution lives at flat scratch index
/// `elem * 8 + slot`.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    pub elem: usize,
    pub slot: usize,
}


/// A material region: the elements it owns and how many times its EOS
/// solve is repeated to model expensive materials.
#[derive(Debug, Clone)]
pub struct Region {
    pub elems: Vec<usize>,
    pub rep: usize,
}




// ============================================================================
/// Numerical controls. The defaults reproduce the standard Sedov setup.
#[derive(Debug, Clone)]
pub struct Params {
    pub e_cut: f64,
    pub p_cut: f64,
    pub q_cut: f64,
    pub u_cut: f64,
    pub v_cut: f64,

    pub hgcoef: f64,
    pub qstop: f64,
    pub monoq_max_slope: f64,
    pub monoq_limiter_mult: f64,
    pub qlc_monoq: f64,
    pub qqc_monoq: f64,
    pub qqc: f64,

    pub eosvmax: f64,
    pub eosvmin: f64,
    pub pmin: f64,
    pub emin: f64,
    pub dvovmax: f64,
    pub refdens: f64,

    /// Fixed timestep when positive; adaptive control when negative.
    pub dtfixed: f64,
    pub dtmax: f64,
    pub deltatimemultlb: f64,
    pub deltatimemultub: f64,
    pub stoptime: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            e_cut: 1.0e-7,
            p_cut: 1.0e-7,
            q_cut: 1.0e-7,
            u_cut: 1.0e-7,
            v_cut: 1.0e-10,

            hgcoef: 3.0,
            qstop: 1.0e+12,
            monoq_max_slope: 1.0,
            monoq_limiter_mult: 2.0,
            qlc_monoq: 0.5,
            qqc_monoq: 2.0 / 3.0,
            qqc: 2.0,

            eosvmax: 1.0e+9,
            eosvmin: 1.0e-9,
            pmin: 0.0,
            emin: -1.0e+15,
            dvovmax: 0.1,
            refdens: 1.0,

            dtfixed: -1.0e-6,
            dtmax: 1.0e-2,
            deltatimemultlb: 1.1,
            deltatimemultub: 1.2,
            stoptime: 1.0e-2,
        }
    }
}




// ============================================================================
pub struct Domain {
    /* node-centered */
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub xd: Vec<f64>,
    pub yd: Vec<f64>,
    pub zd: Vec<f64>,
    pub xdd: Vec<f64>,
    pub ydd: Vec<f64>,
    pub zdd: Vec<f64>,
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
    pub fz: Vec<f64>,
    pub nodal_mass: Vec<f64>,

    /* nodes lying on each symmetry plane */
    pub symm_x: Vec<usize>,
    pub symm_y: Vec<usize>,
    pub symm_z: Vec<usize>,

    /* element-centered */
    pub nodelist: Vec<[usize; 8]>,
    pub faces: Vec<ElemFaces>,
    pub volo: Vec<f64>,
    pub v: Vec<f64>,
    pub vnew: Vec<f64>,
    pub delv: Vec<f64>,
    pub vdov: Vec<f64>,
    pub arealg: Vec<f64>,
    pub e: Vec<f64>,
    pub p: Vec<f64>,
    pub q: Vec<f64>,
    pub ql: Vec<f64>,
    pub qq: Vec<f64>,
    pub ss: Vec<f64>,
    pub elem_mass: Vec<f64>,

    pub regions: Vec<Region>,

    /* node-to-corner adjacency, CSR layout: the corners touching node n
     * are corner_list[corner_start[n] .. corner_start[n + 1]] */
    pub corner_start: Vec<usize>,
    pub corner_list: Vec<Corner>,

    pub params: Params,

    /* cycle bookkeeping */
    pub time: f64,
    pub deltatime: f64,
    pub dtcourant: f64,
    pub dthydro: f64,
    pub cycle: usize,
}

impl Domain {
    pub fn num_node(&self) -> usize {
        self.x.len()
    }

    pub fn num_elem(&self) -> usize {
        self.nodelist.len()
    }

    /// Final state in a serializable form, for dumps and offline checks.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cycle: self.cycle,
            time: self.time,
            x: self.x.clone(),
            y: self.y.clone(),
            z: self.z.clone(),
            xd: self.xd.clone(),
            yd: self.yd.clone(),
            zd: self.zd.clone(),
            e: self.e.clone(),
            p: self.p.clone(),
            q: self.q.clone(),
            v: self.v.clone(),
        }
    }
}


/// Gather one nodal field at an element's eight corners.
pub fn gather(field: &[f64], corners: &[usize; 8]) -> [f64; 8] {
    [
        field[corners[0]], field[corners[1]], field[corners[2]], field[corners[3]],
        field[corners[4]], field[corners[5]], field[corners[6]], field[corners[7]],
    ]
}




// ============================================================================
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub cycle: usize,
    pub time: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub xd: Vec<f64>,
    pub yd: Vec<f64>,
    pub zd: Vec<f64>,
    pub e: Vec<f64>,
    pub p: Vec<f64>,
    pub q: Vec<f64>,
    pub v: Vec<f64>,
}
