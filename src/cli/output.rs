use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Prints `payload` as JSON/YAML, or the `human` rendering otherwise.
    pub fn emit<T, F>(self, payload: &T, human: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        match self {
            OutputFormat::Human => println!("{}", human()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(payload)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(payload)?),
        }
        Ok(())
    }
}
