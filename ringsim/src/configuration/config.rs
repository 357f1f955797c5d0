//! Run configuration, loadable from YAML.
//!
//! Every field has a default, so a YAML file only needs the values it
//! changes. Command-line flags are applied on top in `main`.
//!
//! # YAML format
//!
//! ```yaml
//! total_bodies: 1000        # bodies in the whole system
//! workers: 4                # size of the worker group
//! iterations: 10            # total iterations of the run
//! checkpoint_interval: 1    # checkpoint when iteration % interval == 0
//! dt: 1.0                   # fixed time step
//! restore: false            # resume from <results>/<bodies>/checkpoint.dat
//! print: false              # gather and report all bodies before/after
//! results_folder: ./results/
//! softening: 0.1            # softening length
//! G: 1.0                    # gravitational constant
//! ```

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::distributed::checkpoint::checkpoint_path;
use crate::error::{SimError, SimResult};
use crate::simulation::params::{Parameters, DEFAULT_G, DEFAULT_SOFTENING};

#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub total_bodies: usize, // bodies in the whole system
    pub workers: usize, // size of the worker group
    pub iterations: i32, // total iterations, counted from 0
    pub checkpoint_interval: i32, // iterations between checkpoints
    pub dt: f64, // fixed step size
    pub restore: bool, // resume from the checkpoint when one exists
    pub print: bool, // report every body before and after the run
    pub results_folder: PathBuf, // root of all output
    pub softening: f64, // softening length
    pub G: f64, // gravitational constant
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_bodies: 10,
            workers: 4,
            iterations: 10,
            checkpoint_interval: 1,
            dt: 1.0,
            restore: false,
            print: false,
            results_folder: PathBuf::from("./results/"),
            softening: DEFAULT_SOFTENING,
            G: DEFAULT_G,
        }
    }
}

impl RunConfig {
    pub fn from_yaml_file(path: &Path) -> SimResult<Self> {
        let file = File::open(path)
            .map_err(|e| SimError::Config(format!("cannot open {}: {e}", path.display())))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| SimError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        serde_yaml::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.workers == 0 {
            return Err(SimError::Config("workers must be at least 1".into()));
        }
        if self.checkpoint_interval <= 0 {
            return Err(SimError::Config("checkpoint_interval must be positive".into()));
        }
        if self.iterations < 0 {
            return Err(SimError::Config("iterations cannot be negative".into()));
        }
        if !self.dt.is_finite() {
            return Err(SimError::Config(format!("dt must be finite, got {}", self.dt)));
        }
        Ok(())
    }

    /// `<results_folder>/<total_bodies>`
    pub fn results_dir(&self) -> PathBuf {
        self.results_folder.join(self.total_bodies.to_string())
    }

    pub fn ensure_results_dir(&self) -> SimResult<PathBuf> {
        let dir = self.results_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| SimError::Config(format!("cannot create {}: {e}", dir.display())))?;
        Ok(dir)
    }

    pub fn checkpoint_file(&self) -> PathBuf {
        checkpoint_path(&self.results_dir())
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            total_bodies: self.total_bodies,
            dt: self.dt,
            softening: self.softening,
            G: self.G,
        }
    }
}
