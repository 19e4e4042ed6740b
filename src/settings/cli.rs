use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Refresh-token rotation service")]
pub struct Cli {
    /// Path to the settings file; defaults to the per-profile file.
    #[arg(long)]
    pub settings: Option<String>,
    /// Overrides `http.address`.
    #[arg(long)]
    pub address: Option<String>,
}
