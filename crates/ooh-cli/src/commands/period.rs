use chrono::NaiveDate;
use clap::Subcommand;
use ooh_core::period::{
    describe_duration, format_period_extended, monthly_end, monthly_end_options, quantity,
};
use ooh_core::{validate_selection, Config, MonthlyDuration, PeriodSelection, PeriodType};
use serde::Serialize;

#[derive(Subcommand)]
pub enum PeriodAction {
    /// Validate a picker selection and print the resulting period
    Validate {
        /// Bi-weekly block ids ("YYYY-MM-DD_YYYY-MM-DD")
        #[arg(long, num_args = 1.., conflicts_with = "monthly")]
        biweekly: Vec<String>,
        /// Monthly period start date
        #[arg(long)]
        monthly: Option<NaiveDate>,
        /// Monthly duration in months
        #[arg(long, requires = "monthly", conflicts_with = "end")]
        months: Option<u32>,
        /// Custom monthly end date
        #[arg(long, requires = "monthly")]
        end: Option<NaiveDate>,
    },
    /// Billing quantity of a date range
    Quantity {
        start: NaiveDate,
        end: NaiveDate,
        /// bissemanal or mensal
        #[arg(long = "type", default_value = "bissemanal")]
        period_type: PeriodType,
    },
    /// End date of a monthly period of N months
    MonthlyEnd {
        start: NaiveDate,
        #[arg(long, default_value_t = 1)]
        months: u32,
    },
    /// Anchored end-date options for a monthly start
    Options {
        start: NaiveDate,
        #[arg(long, default_value_t = 12)]
        months_ahead: u32,
    },
}

#[derive(Serialize)]
struct PeriodReport {
    start: NaiveDate,
    end: NaiveDate,
    period_type: PeriodType,
    selected_period_ids: Vec<String>,
    quantity: u32,
    label: String,
    duration: String,
}

pub fn run(action: PeriodAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PeriodAction::Validate {
            biweekly,
            monthly,
            months,
            end,
        } => {
            let selection = match monthly {
                Some(start) => PeriodSelection::Monthly {
                    start,
                    duration: match end {
                        Some(end) => MonthlyDuration::Custom(end),
                        None => MonthlyDuration::Months(months.unwrap_or(1)),
                    },
                },
                None => PeriodSelection::BiWeekly { ids: biweekly },
            };
            let grid = Config::load_or_default().grid();
            let period = validate_selection(&grid, &selection)?;
            let report = PeriodReport {
                start: period.start(),
                end: period.end(),
                period_type: period.period_type(),
                selected_period_ids: period.selected_period_ids().to_vec(),
                quantity: period.quantity(),
                label: format_period_extended(period.start(), period.end()),
                duration: describe_duration(period.start(), period.end()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PeriodAction::Quantity {
            start,
            end,
            period_type,
        } => {
            println!("{}", quantity(start, end, period_type));
        }
        PeriodAction::MonthlyEnd { start, months } => {
            let end = monthly_end(start, MonthlyDuration::Months(months))
                .ok_or_else(|| format!("no monthly end for {start} + {months} months"))?;
            println!("{end}");
        }
        PeriodAction::Options {
            start,
            months_ahead,
        } => {
            for option in monthly_end_options(start, months_ahead) {
                println!("{option}");
            }
        }
    }
    Ok(())
}
