//! k2bot-probe: CLI tool for trying key patterns against request variables.

use clap::{Parser, Subcommand};
use k2bot::{
    LookupTable, Outcome, RequestLookup, RequestPool, RequestVariables, ScopeConf,
    IS_BOT_VARIABLE,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "k2bot-probe")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate lookup key patterns and classify requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a key pattern and print the resulting key
    Eval {
        /// Key pattern, e.g. 'ua:$http_user_agent'
        #[arg(short, long)]
        key: String,

        /// Request variable as name=value (repeatable)
        #[arg(long = "var", value_parser = parse_pair)]
        vars: Vec<(String, String)>,
    },

    /// Evaluate a key pattern and look it up in a table
    Classify {
        /// Key pattern, e.g. 'ua:$http_user_agent'
        #[arg(short, long)]
        key: String,

        /// Request variable as name=value (repeatable)
        #[arg(long = "var", value_parser = parse_pair)]
        vars: Vec<(String, String)>,

        /// Table entry as key=value (repeatable)
        #[arg(long = "entry", value_parser = parse_pair)]
        entries: Vec<(String, String)>,

        /// Request pool budget in bytes
        #[arg(short, long)]
        budget: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { key, vars } => eval(&key, vars),
        Commands::Classify {
            key,
            vars,
            entries,
            budget,
            json,
        } => classify(&key, vars, entries, budget, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {:?}", s))
}

fn eval(pattern: &str, vars: Vec<(String, String)>) -> Result<(), Box<dyn std::error::Error>> {
    let vars: RequestVariables = vars.into_iter().collect();
    let pool = RequestPool::unbounded();

    let key = if k2bot::template::variables_count(pattern) == 0 {
        pattern.as_bytes().to_vec()
    } else {
        let template = k2bot::template::compile(pattern)?;
        k2bot::template::evaluate(&template, &vars, &pool)?
            .as_bytes()
            .to_vec()
    };

    println!("{}", String::from_utf8_lossy(&key));
    Ok(())
}

fn classify(
    pattern: &str,
    vars: Vec<(String, String)>,
    entries: Vec<(String, String)>,
    budget: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = LookupTable::from_entries(entries);
    log::debug!("Probe table has {} entries", table.len());

    let mut conf = ScopeConf::new();
    conf.set_key(pattern)?;
    conf.set_table_handle("<command line>", Arc::new(table))?;

    let vars: RequestVariables = vars.into_iter().collect();
    let pool = budget
        .map(RequestPool::with_budget)
        .unwrap_or_else(RequestPool::unbounded);

    let lookup = RequestLookup::new(&conf);
    let outcome = lookup.outcome(&vars, &pool)?;
    let key = lookup.key().map(String::from_utf8_lossy);
    let value = outcome.value().map(|(data, _)| String::from_utf8_lossy(data));

    if json {
        let output = serde_json::json!({
            "key": key,
            "outcome": outcome.as_str(),
            "variable": IS_BOT_VARIABLE,
            "value": value,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(key) = key {
        println!("key: {}", key);
    }
    match outcome {
        Outcome::Found(_) => println!(
            "{}: {}",
            IS_BOT_VARIABLE,
            value.unwrap_or_default()
        ),
        Outcome::NotFound => println!("{}: not found", IS_BOT_VARIABLE),
        Outcome::NotApplicable => println!("{}: not applicable (empty table)", IS_BOT_VARIABLE),
    }

    Ok(())
}
