pub mod bench_cmd;
pub mod lookup_cmd;
pub mod stats_cmd;

pub use bench_cmd::cmd_bench;
pub use lookup_cmd::cmd_lookup;
pub use stats_cmd::cmd_stats;
