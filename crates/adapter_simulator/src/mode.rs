//! Simulator modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First positional argument of the simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Distribute synapses and compute summary statistics.
    #[default]
    Synapse,
    /// Precompute innervation features.
    Init,
    /// Any other mode token, passed verbatim.
    Other(String),
}

impl SimulationMode {
    /// Command-line token.
    pub fn as_arg(&self) -> &str {
        match self {
            SimulationMode::Synapse => "SYNAPSE",
            SimulationMode::Init => "INIT",
            SimulationMode::Other(token) => token,
        }
    }
}

impl FromStr for SimulationMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "SYNAPSE" => SimulationMode::Synapse,
            "INIT" => SimulationMode::Init,
            _ => SimulationMode::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}
