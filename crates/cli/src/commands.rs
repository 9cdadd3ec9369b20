use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded scroll through the stream adapter
    Replay {
        #[arg(long, help = "JSON file holding an array of pages, each an array of items")]
        pages: PathBuf,

        #[arg(
            long,
            default_value_t = 10,
            help = "Items to request at a time; the next batch is requested once this many arrive"
        )]
        request: u64,

        #[arg(long, help = "Stop after this many items (overrides SCROLL_MAX_ITEMS)")]
        max_items: Option<u64>,

        #[arg(long, default_value = "replay", help = "Index name reported for the scroll")]
        index: String,

        #[arg(long, help = "Load SCROLL_* settings from this .env file")]
        env_file: Option<PathBuf>,
    },
}
