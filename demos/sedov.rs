use clap::Parser;
use log::{error, info};

use hexshock::domain::{Domain, Params};
use hexshock::mesh;
use hexshock::scratch::Scratch;
use hexshock::step;




#[derive(Debug, Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// elements along each edge of the cube
    #[clap(short = 's', long, default_value = "30")]
    size: usize,

    /// upper bound on the number of cycles
    #[clap(short = 'i', long, default_value = "9999999")]
    iterations: usize,

    /// number of material regions
    #[clap(short = 'r', long, default_value = "11")]
    regions: usize,

    /// power-law exponent biasing region sizes
    #[clap(short = 'b', long, default_value = "1")]
    balance: u32,

    /// extra EOS repetitions for the expensive regions
    #[clap(short = 'c', long, default_value = "1")]
    cost: usize,

    /// number of worker threads (rayon's default when omitted)
    #[clap(short = 't', long)]
    num_threads: Option<usize>,

    /// log a line every cycle
    #[clap(short = 'p', long)]
    progress: bool,

    /// suppress everything but warnings and the exit status
    #[clap(short = 'q', long)]
    quiet: bool,

    /// write the final state as CBOR to this path
    #[clap(short = 'd', long)]
    dump: Option<std::path::PathBuf>,
}




// ============================================================================
fn report(domain: &Domain, nx: usize, elapsed: f64) {
    let mut max_abs_diff = 0.0f64;
    let mut total_abs_diff = 0.0f64;
    let mut max_rel_diff = 0.0f64;

    /* the blast is symmetric in the two transverse axes, so plane 0 of the
     * energy field must mirror across its diagonal */
    for j in 0..nx {
        for k in j + 1..nx {
            let abs_diff = (domain.e[j * nx + k] - domain.e[k * nx + j]).abs();
            total_abs_diff += abs_diff;
            max_abs_diff = max_abs_diff.max(abs_diff);
            max_rel_diff = max_rel_diff.max(abs_diff / domain.e[k * nx + j]);
        }
    }

    let num_elem = domain.num_elem();
    let grind = elapsed * 1e6 / (domain.cycle as f64 * num_elem as f64);

    println!();
    println!("Run completed:");
    println!("   problem size        = {}", nx);
    println!("   iteration count     = {}", domain.cycle);
    println!("   final time          = {:.6e}", domain.time);
    println!("   final origin energy = {:.6e}", domain.e[0]);
    println!("   max abs diff        = {:.6e}", max_abs_diff);
    println!("   total abs diff      = {:.6e}", total_abs_diff);
    println!("   max rel diff        = {:.6e}", max_rel_diff);
    println!();
    println!("elapsed ............... {:.2}s", elapsed);
    println!("grind time (us/z/c) ... {:.6}", grind);
}




// ============================================================================
fn main() {
    let opts = Opts::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if opts.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        })
        .init()
        .unwrap();

    if let Some(num_threads) = opts.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap();
    }

    let mut domain = mesh::build(
        opts.size,
        opts.regions,
        opts.balance,
        opts.cost,
        Params::default(),
    );
    let mut scratch = Scratch::new(&domain);

    info!(
        "sedov blast: {} elements, {} regions, initial dt = {:e}",
        domain.num_elem(),
        domain.regions.len(),
        domain.deltatime
    );

    let start = std::time::Instant::now();

    while domain.time < domain.params.stoptime && domain.cycle < opts.iterations {
        if let Err(err) = step::advance(&mut domain, &mut scratch) {
            error!("{}", err);
            std::process::exit(err.status());
        }
        if opts.progress {
            info!(
                "cycle = {}, time = {:e}, dt = {:e}",
                domain.cycle, domain.time, domain.deltatime
            );
        }
    }

    let elapsed = start.elapsed().as_secs_f64();

    if let Some(path) = &opts.dump {
        let file = std::fs::File::create(path).unwrap();
        let mut buffer = std::io::BufWriter::new(file);
        ciborium::ser::into_writer(&domain.snapshot(), &mut buffer).unwrap();
    }

    if !opts.quiet {
        report(&domain, opts.size, elapsed);
    }
}
