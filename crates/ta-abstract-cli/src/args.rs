//! CLI argument parsing module.
//!
//! The CLI exposes the catalogue generically: any registered function can be
//! listed, described and run without the front-end knowing it in advance.
//!
//! # Examples
//!
//! ```bash
//! # List groups, then the functions of one group
//! ta-abstract groups
//! ta-abstract functions --group "Overlap Studies"
//!
//! # Describe a function (text or JSON)
//! ta-abstract info BBANDS
//! ta-abstract info BBANDS --json
//!
//! # Run SMA(20) on the close column
//! ta-abstract run SMA input.csv --opt optInTimePeriod=20
//!
//! # Run CORREL on two named columns, writing to a file
//! ta-abstract run CORREL input.csv --inputs high,low --opt optInTimePeriod=10 -o out.csv
//! ```

use clap::{Parser, Subcommand};

/// ta-abstract: generic front-end for the technical analysis catalogue
#[derive(Parser, Debug)]
#[command(name = "ta-abstract")]
#[command(author, version, about = "Introspect and run technical analysis functions")]
#[command(long_about = "ta-abstract lists, describes and runs the functions of a \
    runtime-introspectable technical analysis catalogue. Input is read from CSV \
    files and output can be written to files or stdout.")]
pub struct Args {
    /// What to do
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the group names
    Groups,

    /// List function names, for all groups or one
    Functions {
        /// Group name, e.g. "Overlap Studies"
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Describe a function's parameters
    Info {
        /// Function name, e.g. BBANDS
        name: String,

        /// Print the description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a function over a CSV file
    Run {
        /// Function name, e.g. SMA
        name: String,

        /// Input CSV file
        input: String,

        /// Optional input value, repeatable (e.g. --opt optInTimePeriod=20)
        #[arg(long = "opt", value_name = "NAME=VALUE", value_parser = parse_opt)]
        opts: Vec<OptAssignment>,

        /// Columns bound to the real and integer input slots, in slot order
        #[arg(long, value_delimiter = ',')]
        inputs: Vec<String>,

        /// Output CSV file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// One `--opt NAME=VALUE` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct OptAssignment {
    /// Parameter name, with or without the `optIn` prefix.
    pub name: String,
    /// Value; integer slots require an integral value.
    pub value: f64,
}

impl OptAssignment {
    /// Returns `true` if this assignment targets the parameter `param_name`.
    ///
    /// Matching ignores case and an optional `optIn` prefix, so
    /// `timeperiod` selects `optInTimePeriod`.
    pub fn matches(&self, param_name: &str) -> bool {
        let bare = |s: &str| {
            let lower = s.to_ascii_lowercase();
            lower.strip_prefix("optin").map(str::to_string).unwrap_or(lower)
        };
        bare(&self.name) == bare(param_name)
    }
}

/// Parses `NAME=VALUE`.
pub fn parse_opt(raw: &str) -> Result<OptAssignment, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("parameter name is empty".to_string());
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("cannot parse '{}' as number", value.trim()))?;
    Ok(OptAssignment {
        name: name.to_string(),
        value,
    })
}
