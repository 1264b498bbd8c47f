use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use hotspots::{
    AnchorStrategy, Cluster, ClusterList, HotspotClusterer, HotspotFile, HotspotResult, Linkage,
    DEFAULT_THRESHOLD_KM, MIN_THRESHOLD_KM,
};
use log::LevelFilter;
use rustc_hash::FxHashSet as HashSet;
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

const CHANNEL_SIZE: usize = 100;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Group hotspot detections into clusters and export them as KMZ.
///
/// Every input file produces a KMZ file with one placemark per cluster. Directories are searched
/// recursively for *.csv and *.zip files.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "clusterhotspots")]
#[clap(author, version, about)]
struct ClusterHotspotsOptionsInit {
    /// Files or directories of hotspot detections.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Detections closer than this distance in kilometers are linked into one cluster.
    #[clap(short, long)]
    #[clap(default_value_t = DEFAULT_THRESHOLD_KM)]
    threshold_km: f64,

    /// How detections are linked, "single" or "seed".
    #[clap(short, long)]
    #[clap(default_value_t = Linkage::Single)]
    linkage: Linkage,

    /// The location used for each cluster, "centroid", "first", or "most-intense".
    #[clap(short, long)]
    #[clap(default_value_t = AnchorStrategy::Centroid)]
    anchor: AnchorStrategy,

    /// The directory to put the KMZ files in.
    ///
    /// If this is not specified, then the program will check the "HOTSPOT_KMZ_DIR" environment
    /// variable. If that isn't set either, each KMZ file goes next to its input file.
    #[clap(short, long)]
    #[clap(env = "HOTSPOT_KMZ_DIR")]
    kmz_dir: Option<PathBuf>,

    /// The number of clustering threads, defaults to the number of CPUs.
    #[clap(short = 'j', long)]
    threads: Option<usize>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ClusterHotspotsOptionsChecked {
    /// Files or directories of hotspot detections.
    inputs: Vec<PathBuf>,

    /// The configured clusterer.
    clusterer: HotspotClusterer,

    /// Where to put the output, if not next to the input.
    kmz_dir: Option<PathBuf>,

    /// The number of clustering threads.
    threads: usize,

    /// Verbose output
    verbose: bool,
}

impl Display for ClusterHotspotsOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        for input in &self.inputs {
            writeln!(f, "       Input: {}", input.display())?;
        }
        if let Some(ref kmz_dir) = self.kmz_dir {
            writeln!(f, "  Output Dir: {}", kmz_dir.display())?;
        } else {
            writeln!(f, "  Output Dir: alongside inputs")?;
        }
        writeln!(f, "   Threshold: {} km", self.clusterer.threshold_km())?;
        writeln!(f, "     Linkage: {}", self.clusterer.linkage())?;
        writeln!(f, "      Anchor: {}", self.clusterer.anchor())?;
        writeln!(f, "     Threads: {}", self.threads)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Check the command line arguments.
fn check_args(init: ClusterHotspotsOptionsInit) -> HotspotResult<ClusterHotspotsOptionsChecked> {
    let ClusterHotspotsOptionsInit {
        inputs,
        threshold_km,
        linkage,
        anchor,
        kmz_dir,
        threads,
        verbose,
    } = init;

    if !threshold_km.is_finite() || threshold_km < MIN_THRESHOLD_KM {
        let msg = format!("threshold must be at least {} km: {}", MIN_THRESHOLD_KM, threshold_km);
        return Err(msg.into());
    }

    if let Some(ref kmz_dir) = kmz_dir {
        if !kmz_dir.is_dir() {
            return Err(format!("output directory does not exist: {}", kmz_dir.display()).into());
        }
    }

    let clusterer = HotspotClusterer::new()
        .with_threshold_km(threshold_km)
        .with_linkage(linkage)
        .with_anchor(anchor);

    let threads = threads.unwrap_or_else(num_cpus::get).max(1);

    let checked = ClusterHotspotsOptionsChecked {
        inputs,
        clusterer,
        kmz_dir,
        threads,
        verbose,
    };

    if verbose {
        log::info!("{}", checked);
    }

    Ok(checked)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> HotspotResult<()> {
    let init = ClusterHotspotsOptionsInit::parse();

    let level = if init.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("hotspots", level)
        .with_module_level("clusterhotspots", level)
        .init()?;

    let opts = check_args(init)?;

    let (to_load_thread, from_path_gen) = bounded(CHANNEL_SIZE);
    let (to_cluster_threads, from_load_thread) = bounded(CHANNEL_SIZE);
    let (to_output_thread, from_cluster_threads) = bounded(CHANNEL_SIZE);

    let path_gen = start_path_generation_thread(opts.inputs.clone(), to_load_thread)?;
    let load_thread = start_load_thread(from_path_gen, to_cluster_threads)?;

    let mut cluster_threads = Vec::with_capacity(opts.threads);
    for thread_num in 0..opts.threads {
        cluster_threads.push(start_cluster_thread(
            thread_num,
            opts.clusterer,
            from_load_thread.clone(),
            to_output_thread.clone(),
        )?);
    }
    // The output thread stops once every clustering thread has dropped its sender.
    drop(from_load_thread);
    drop(to_output_thread);

    let output_thread = start_output_thread(opts.kmz_dir.clone(), from_cluster_threads)?;

    path_gen
        .join()
        .map_err(|_| "path generation thread panicked")?;
    load_thread.join().map_err(|_| "load thread panicked")?;
    for jh in cluster_threads {
        jh.join().map_err(|_| "clustering thread panicked")?;
    }
    let summary = output_thread
        .join()
        .map_err(|_| "output thread panicked")?;

    log::info!("");
    log::info!("Processed {} files.", summary.num_files);
    log::info!("  detections - {:>19}", summary.num_points);
    log::info!("    clusters - {:>19}", summary.num_clusters);

    if let Some((source, biggest)) = summary.biggest {
        let anchor = biggest.anchor();

        log::info!("");
        log::info!("Biggest cluster:");
        log::info!("        source - {:>19}", source);
        log::info!("      latitude - {:>19.6}", anchor.lat);
        log::info!("     longitude - {:>19.6}", anchor.lon);
        log::info!("    power (MW) - {:>19.1}", biggest.total_power());
        log::info!("         count - {:>19}", biggest.count());
        log::info!("   radius (km) - {:>19.2}", biggest.radius());
        log::info!("")
    } else {
        log::warn!("");
        log::warn!("No clusters found!");
        log::warn!("");
    }

    Ok(())
}

/*-------------------------------------------------------------------------------------------------
 *                                          Pipeline
 *-----------------------------------------------------------------------------------------------*/
fn start_path_generation_thread(
    inputs: Vec<PathBuf>,
    to_load_thread: Sender<PathBuf>,
) -> HotspotResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("clusterhotspots-path_gen".to_owned())
        .spawn(move || {
            for input in inputs {
                if input.is_file() {
                    if to_load_thread.send(input).is_err() {
                        return;
                    }
                    continue;
                }

                for entry in walkdir::WalkDir::new(&input)
                    .into_iter()
                    .filter_map(|res| res.ok())
                    // Ignore directories, WalkDir will take care of recursing into them.
                    .filter(|entry| entry.path().is_file())
                    .filter(|entry| HotspotFile::is_hotspot_file(entry.path()))
                {
                    log::debug!("Found {}", entry.path().display());
                    if to_load_thread.send(entry.into_path()).is_err() {
                        return;
                    }
                }
            }
        })?;

    Ok(jh)
}

fn start_load_thread(
    from_path_gen: Receiver<PathBuf>,
    to_cluster_threads: Sender<HotspotFile>,
) -> HotspotResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("clusterhotspots-load".to_owned())
        .spawn(move || {
            for path in from_path_gen {
                let hotspot_file = match HotspotFile::open(&path) {
                    Ok(hotspot_file) => hotspot_file,
                    Err(err) => {
                        log::error!("Error loading {}: {}", path.display(), err);
                        continue;
                    }
                };

                if to_cluster_threads.send(hotspot_file).is_err() {
                    return;
                }
            }
        })?;

    Ok(jh)
}

fn start_cluster_thread(
    thread_num: usize,
    clusterer: HotspotClusterer,
    from_load_thread: Receiver<HotspotFile>,
    to_output_thread: Sender<(PathBuf, ClusterList)>,
) -> HotspotResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name(format!("clusterhotspots-cluster-{}", thread_num))
        .spawn(move || {
            for hotspot_file in from_load_thread {
                let clusters = match ClusterList::from_points(
                    hotspot_file.file_name(),
                    &clusterer,
                    hotspot_file.points(),
                ) {
                    Ok(clusters) => clusters,
                    Err(err) => {
                        log::error!("Skipping {}: {}", hotspot_file.file_name(), err);
                        continue;
                    }
                };

                let path = hotspot_file.path().to_path_buf();
                if to_output_thread.send((path, clusters)).is_err() {
                    return;
                }
            }
        })?;

    Ok(jh)
}

#[derive(Debug, Default)]
struct Summary {
    num_files: usize,
    num_points: usize,
    num_clusters: usize,
    biggest: Option<(String, Cluster)>,
}

fn start_output_thread(
    kmz_dir: Option<PathBuf>,
    from_cluster_threads: Receiver<(PathBuf, ClusterList)>,
) -> HotspotResult<JoinHandle<Summary>> {
    let jh = thread::Builder::new()
        .name("clusterhotspots-output".to_owned())
        .spawn(move || {
            let mut summary = Summary::default();
            let mut taken: HashSet<PathBuf> = HashSet::default();

            for (input_path, cluster_list) in from_cluster_threads {
                let kmz_path = kmz_path_for(&input_path, kmz_dir.as_deref(), &mut taken);

                if let Err(err) = cluster_list.save_kmz(&kmz_path) {
                    log::error!("Error writing {}: {}", kmz_path.display(), err);
                    continue;
                }

                log::info!(
                    "{}: {} detections in {} clusters -> {}",
                    cluster_list.source,
                    cluster_list.num_points(),
                    cluster_list.len(),
                    kmz_path.display()
                );

                summary.num_files += 1;
                summary.num_points += cluster_list.num_points();
                summary.num_clusters += cluster_list.len();

                if let Some(candidate) = cluster_list.biggest() {
                    let is_bigger = match summary.biggest {
                        Some((_, ref big_fire)) => big_fire.total_power() < candidate.total_power(),
                        None => true,
                    };

                    if is_bigger {
                        summary.biggest = Some((cluster_list.source.clone(), candidate.clone()));
                    }
                }
            }

            summary
        })?;

    Ok(jh)
}

/// Append ".kmz" to the input file name, and move it into `kmz_dir` if there is one.
///
/// Every path handed out is remembered in `taken`, a name that is already used gets a number
/// added so no output overwrites another one from the same run.
fn kmz_path_for(
    input_path: &Path,
    kmz_dir: Option<&Path>,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let dir = match kmz_dir {
        Some(dir) => dir.to_path_buf(),
        None => input_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let fname = input_path
        .file_name()
        .map(|fname| fname.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hotspots".to_owned());

    let mut kmz_path = dir.join(format!("{}.kmz", fname));
    let mut copy = 1;
    while !taken.insert(kmz_path.clone()) {
        copy += 1;
        kmz_path = dir.join(format!("{}-{}.kmz", fname, copy));
    }

    if copy > 1 {
        log::warn!(
            "{} would overwrite another output, writing {} instead",
            input_path.display(),
            kmz_path.display()
        );
    }

    kmz_path
}
