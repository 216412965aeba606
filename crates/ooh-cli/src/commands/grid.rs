use chrono::NaiveDate;
use clap::Subcommand;
use ooh_core::Config;

#[derive(Subcommand)]
pub enum GridAction {
    /// List bi-weekly blocks ending on or after a date
    List {
        /// First date of interest (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Number of blocks (default: periods.picker_window)
        #[arg(long)]
        count: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Next block start on or after a date, with its suggested end
    Next {
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Show the block a date falls in
    Block { date: NaiveDate },
}

pub fn run(action: GridAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let grid = config.grid();

    match action {
        GridAction::List { from, count, json } => {
            let from = from.unwrap_or_else(super::today);
            let count = count.unwrap_or(config.periods.picker_window as usize);
            let blocks = grid.window(from, count);
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else {
                for block in &blocks {
                    println!("{}  {} .. {}  {}", block.label(), block.start, block.end, block.id());
                }
            }
        }
        GridAction::Next { from } => {
            let from = from.unwrap_or_else(super::today);
            let start = grid
                .next_start(from)
                .ok_or_else(|| format!("no bi-weekly block starts on or after {from}"))?;
            let end = grid
                .suggested_end(start)
                .ok_or_else(|| format!("no suggested end for {start}"))?;
            println!("{start} .. {end}");
        }
        GridAction::Block { date } => {
            let block = grid
                .block_containing(date)
                .ok_or_else(|| format!("{date} is before the grid epoch {}", grid.epoch()))?;
            println!("{}  {} .. {}  {}", block.label(), block.start, block.end, block.id());
        }
    }
    Ok(())
}
