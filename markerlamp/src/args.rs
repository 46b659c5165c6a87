use clap::Parser;

use crate::coverage::print::MarkerSelection;

#[derive(Debug, Clone, Parser, Default)]
#[command(
    name = "markerlamp",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct MarkerlampCli {
    #[arg(long = "cobertura")]
    cobertura: Option<String>,

    #[arg(long = "lcov")]
    lcov: Option<String>,

    #[arg(long = "config")]
    config: Option<String>,

    #[arg(long = "root")]
    root: Option<String>,

    #[arg(long = "include", value_delimiter = ',')]
    include: Vec<String>,

    #[arg(long = "exclude", value_delimiter = ',')]
    exclude: Vec<String>,

    #[arg(long = "max-files", alias = "maxFiles")]
    max_files: Option<u32>,

    #[arg(long = "markers", num_args = 0..=1, default_missing_value = "all")]
    markers: Option<String>,

    #[arg(
        long = "json",
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    json: bool,

    #[arg(
        long = "watch",
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    watch: bool,

    #[arg(
        long = "ci",
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    ci: bool,

    #[arg(
        long = "verbose",
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    verbose: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub cobertura_path: Option<String>,
    pub lcov_path: Option<String>,
    pub config_path: Option<String>,
    pub workspace_root: Option<String>,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub max_files: Option<u32>,
    pub markers: MarkerSelection,
    pub json: bool,
    pub watch: bool,
    pub ci: bool,
    pub verbose: bool,
}

pub fn derive_args(argv: &[String]) -> Result<ParsedArgs, clap::Error> {
    let mut clap_argv = vec!["markerlamp".to_string()];
    clap_argv.extend(argv.iter().cloned());
    let cli = MarkerlampCli::try_parse_from(&clap_argv)?;

    let markers = cli
        .markers
        .as_deref()
        .map(parse_marker_selection)
        .unwrap_or(MarkerSelection::None);

    Ok(ParsedArgs {
        cobertura_path: cli.cobertura,
        lcov_path: cli.lcov,
        config_path: cli.config,
        workspace_root: cli.root,
        include_globs: cli.include,
        exclude_globs: cli.exclude,
        max_files: cli.max_files,
        markers,
        json: cli.json,
        watch: cli.watch,
        ci: cli.ci,
        verbose: cli.verbose,
    })
}

fn parse_marker_selection(raw: &str) -> MarkerSelection {
    match raw.trim().to_ascii_lowercase().as_str() {
        "all" | "" => MarkerSelection::All,
        _ => MarkerSelection::File(raw.trim().to_string()),
    }
}
