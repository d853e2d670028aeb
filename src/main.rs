// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod cli;
mod config;
mod console_format;
mod dataset;
mod errors;
mod filters;
mod format;
mod report;
mod search;
mod types;
mod ui;

use config::QueryPlan;
use dataset::{DatasetCache, RecordStore};
use errors::{AppError, Result};
use filters::FilterPipeline;
use log::{debug, info};
use search::FilteredSet;
use types::{CategoryField, ContractRecord};

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Set console width override if specified (for testing)
    if let Some(width) = args.console_width {
        console_format::set_console_width(width);
    }

    // Build query plan
    let plan = match config::build_query_plan(&args).map_err(AppError::Config) {
        Ok(p) => p,
        Err(e) => {
            ui::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&plan) {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(plan: &QueryPlan) -> Result<()> {
    let cache = DatasetCache::new(plan.dataset_path.clone());
    let store = cache.get()?;
    if store.is_empty() {
        ui::print_warning(&format!("{} contains no contracts", cache.path().display()));
    }
    debug!("Value domain {:?}, date domain {:?}", store.value_domain(), store.date_domain());

    if let Some(field) = plan.list_values {
        print_values(store, field);
        return Ok(());
    }

    // Search first, then narrow by the filters
    let found = search::search(FilteredSet::all(store), &plan.query);
    let pipeline = FilterPipeline::new(&plan.criteria, store);
    if pipeline.is_empty() {
        debug!("No active filters");
    } else {
        debug!("{} active filters", pipeline.filters().len());
    }
    let result = pipeline.apply(found);
    info!("{} of {} contracts selected", result.len(), store.len());

    let records: Vec<&ContractRecord> = result.records().collect();
    let stats = report::aggregate(records.iter().copied());

    if plan.json {
        println!("{}", report::statistics_json(&stats, &plan.query, cache.path())?);
    } else {
        console_format::print_summary(&stats);
        if result.is_empty() {
            ui::print_warning("No contracts match the search and filters");
        }
        console_format::print_results_table(&records, plan.limit);
    }

    if !plan.exports.is_empty() {
        let generated_at = chrono::Local::now().naive_local();
        let doc = report::compose(records.iter().copied(), &plan.query, &stats, generated_at);
        for path in report::write_exports(&plan.exports, &plan.output_dir, &records, &doc)? {
            ui::status(&format!("Saved {}", path.display()));
        }
    }

    debug!("Dataset read {} time(s)", cache.load_count());
    Ok(())
}

/// Print the selectable values of a categorical field, one per line
fn print_values(store: &RecordStore, field: CategoryField) {
    let values = store.distinct_values(field);
    debug!("{} distinct values for {} (column {})", values.len(), field.as_str(), field.column());
    for value in values {
        println!("{}", value);
    }
}
