use std::io::{self, BufRead, Write};

use crate::domain::region::Region;

/// Where the aggregate result is routed after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Csv,
    Store,
    Both,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub subdomains: Vec<String>,
    pub output: OutputMode,
}

/// Chooses which subdomains to harvest and where results go.
pub trait SelectionProvider: Send + Sync {
    fn choose(&self, catalog: &[Region]) -> Selection;
}

/// Parse a comma-separated list of 1-based indices, or `all`. Tokens that
/// are not numbers and indices outside the catalog are silently dropped.
pub fn parse_region_selection(input: &str, count: usize) -> Vec<usize> {
    if input.trim().eq_ignore_ascii_case("all") {
        return (0..count).collect();
    }
    input
        .split(',')
        .filter_map(|token| token.trim().parse::<usize>().ok())
        .filter(|&index| index >= 1 && index <= count)
        .map(|index| index - 1)
        .collect()
}

pub fn parse_output_mode(input: &str) -> Option<OutputMode> {
    match input.trim().to_lowercase().as_str() {
        "csv" => Some(OutputMode::Csv),
        "store" => Some(OutputMode::Store),
        "both" => Some(OutputMode::Both),
        _ => None,
    }
}

/// Interactive prompt on stdin, one question for regions and one for the
/// output mode.
pub struct ConsoleSelection;

impl SelectionProvider for ConsoleSelection {
    fn choose(&self, catalog: &[Region]) -> Selection {
        println!("\nAvailable Regions:");
        for (idx, region) in catalog.iter().enumerate() {
            println!("{}. {}", idx + 1, region.name);
        }

        print!("\nEnter region numbers to scrape (comma-separated) or type 'all': ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);

        let subdomains = parse_region_selection(&line, catalog.len())
            .into_iter()
            .map(|idx| catalog[idx].subdomain.clone())
            .collect();

        let output = loop {
            print!("\nSave scraped data to [csv / store / both]: ");
            let _ = io::stdout().flush();
            let mut answer = String::new();
            let read = io::stdin().lock().read_line(&mut answer).unwrap_or(0);
            if read == 0 {
                // stdin closed; fall back rather than prompting forever
                break OutputMode::Csv;
            }
            match parse_output_mode(&answer) {
                Some(mode) => break mode,
                None => println!("Invalid input. Please enter 'csv', 'store', or 'both'."),
            }
        };

        Selection { subdomains, output }
    }
}

/// Non-interactive provider for scripted runs: always returns the same
/// fixed set of subdomains, ignoring the catalog.
pub struct FixedSelection {
    pub subdomains: Vec<String>,
    pub output: OutputMode,
}

impl SelectionProvider for FixedSelection {
    fn choose(&self, _catalog: &[Region]) -> Selection {
        Selection {
            subdomains: self.subdomains.clone(),
            output: self.output,
        }
    }
}
