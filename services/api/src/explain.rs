use clap::Args;
use estate_market::config::AppConfig;
use estate_market::error::AppError;
use estate_market::query::{ListingQuery, QueryLimits, QueryParams};

#[derive(Args, Debug)]
pub(crate) struct ExplainArgs {
    /// Raw query string, with or without the leading `?`
    pub(crate) query: String,
    /// Print single-line JSON instead of pretty output
    #[arg(long)]
    pub(crate) compact: bool,
}

pub(crate) fn run_explain(args: ExplainArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rendered = explain(&args.query, &config.query, args.compact)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn explain(raw: &str, limits: &QueryLimits, compact: bool) -> Result<String, AppError> {
    let params = QueryParams::parse(raw);
    let query = ListingQuery::from_params(&params, limits)?;
    let rendered = if compact {
        serde_json::to_string(&query)?
    } else {
        serde_json::to_string_pretty(&query)?
    };
    Ok(rendered)
}
