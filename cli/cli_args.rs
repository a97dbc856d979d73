use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        short = 'r',
        long,
        help = "Folder to browse (default: $FILEMERGE_ROOT, config root, or current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        help = "Path of the TOML config file (default: <root>/.filemerge/filemerge.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Do not load any TOML config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    #[arg(
        short = 'e',
        long,
        value_name = "LIST",
        help = "File extensions to show, separated by comma, semicolon or space (e.g. \".cs, .json,ts\").",
        help_heading = "Filtering"
    )]
    pub extensions: Option<String>,

    #[arg(
        long = "ignore-folder",
        value_name = "PATTERN",
        action = clap::ArgAction::Append,
        help = "Replace the ignored folder list (repeatable; exact name, '*' wildcard, or '.prefix').",
        help_heading = "Filtering"
    )]
    pub ignore_folders: Vec<String>,

    #[arg(
        long,
        help = "Hide folders that contain no matching files.",
        help_heading = "Filtering"
    )]
    pub hide_empty: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["text", "json"], help_heading = "Output Formatting")]
    pub format: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "filemerge",
    author,
    version,
    about = "Browse a folder tree, pick source files, and merge them into one text blob.",
    long_about = "filemerge lists a folder tree filtered by file extension (skipping build, VCS and \ndependency folders), lets you select files or whole folders, and concatenates them \nwith '// File:' headers into the clipboard, stdout, or a file.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  filemerge tree -r ~/src/app -e \"cs, json\"\n  filemerge merge -r ~/src/app src/Api --skip src/Api/Migrations\n  filemerge merge --all --stdout > merged.txt\n  filemerge show ignored",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "t",
        about = "Show the filtered folder tree."
    )]
    Tree(TreeArgs),

    #[command(
        visible_alias = "m",
        about = "Merge selected files and copy the result to the clipboard."
    )]
    Merge(MergeArgs),

    #[command(
        visible_alias = "s",
        about = "Show the effective extension or ignored folder lists."
    )]
    Show(ShowArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,

    #[arg(
        value_name = "PATH",
        help = "Files or folders to check, relative to the root. Folders select everything below them.",
        help_heading = "Selection"
    )]
    pub select: Vec<PathBuf>,

    #[arg(
        short = 'a',
        long,
        help = "Check the whole tree.",
        help_heading = "Selection"
    )]
    pub all: bool,

    #[arg(
        long,
        value_name = "PATH",
        action = clap::ArgAction::Append,
        help = "Uncheck a file or folder after the selection above is applied (repeatable).",
        help_heading = "Selection"
    )]
    pub skip: Vec<PathBuf>,

    #[arg(
        short = 'l',
        long,
        help = "Only list the files that would be merged.",
        help_heading = "Output Control"
    )]
    pub list: bool,

    #[arg(
        long,
        help = "Write the merged text to standard output instead of the clipboard.",
        help_heading = "Output Control",
        conflicts_with = "output"
    )]
    pub stdout: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the merged text to FILE instead of the clipboard.",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[command(subcommand)]
    pub item: ShowItem,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShowItem {
    #[command(about = "List the folder patterns skipped while building the tree.")]
    Ignored {},
    #[command(about = "List the file extensions shown in the tree.")]
    Extensions {},
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save the default config to ./.filemerge/filemerge.toml (prompts overwrite)."
    )]
    pub save: bool,
}
