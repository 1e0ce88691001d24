//! `spikex` command line.
//!
//! ```bash
//! # synthetic block to try things out
//! spikex simulate --output block.json --trials 20
//!
//! # extract spike counts, remapping channels and writing heatmaps
//! spikex extract --block block.json --channel-map "channel map.txt" --heatmaps out/
//!
//! # show the settings an extraction would use
//! spikex summary --config extract.json
//! ```

mod app;
mod block_file;
mod cli;
mod simulate;

pub use app::App;

fn main() -> anyhow::Result<()> {
    let app = App::new()?;
    app.run()?;

    Ok(())
}
