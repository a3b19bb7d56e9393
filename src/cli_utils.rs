//! CLI (CommandLine Interface) utilities for the `okvs_params` binary.
//!
//! The binary prints the sizing of an OKVS kind for a capacity and can optionally run a random
//! round trip. See [okvs](crate::okvs) for what each kind means.

use crate::okvs::OkvsType;
use clap::Parser;

/// Arguments for `okvs_params`.
/// This struct implements [clap::Parser] to make that this binary has CommandLine Arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct OkvsArgs {
    /// OKVS kind.
    #[arg(short = 't', long = "okvs-type", default_value_t = OkvsType::H3NaiveGct)]
    pub okvs_type: OkvsType,

    /// Capacity: number of key-value pairs.
    #[arg(short = 'n', long, default_value_t = 1 << 10)]
    pub n: usize,

    /// Print every kind instead of only `--okvs-type`.
    #[arg(long = "all", default_value_t = false)]
    pub all: bool,

    /// Encode `n` random pairs and check that every key decodes to its value.
    #[arg(long = "verify", default_value_t = false)]
    pub verify: bool,

    /// Encode bins on a worker pool. Only bucketed kinds have bins.
    #[arg(long = "parallel", default_value_t = false)]
    pub parallel: bool,
}
