use anyhow::Result;
use asm_census::commands;
use clap::{Parser, Subcommand};

/// Inline-assembly usage catalog CLI.
///
/// This CLI is a thin wrapper around `census-core` (exposed in code as
/// `census_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends. The collaborators that
/// gather facts (cloning, hosting-API queries, line counting) run elsewhere;
/// their results enter here as plain files and arguments.
#[derive(Parser, Debug)]
#[command(
    name = "asm-census",
    version,
    about = "Catalog of inline-assembly usage across source repositories",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new catalog at the given root.
    ///
    /// This will:
    /// - Create a `.census` metadata directory and the catalog database.
    /// - Create `projects`, `reports`, and `plots` directories.
    /// - Write a `.census/catalog.json` config file.
    Init {
        /// Catalog root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional catalog name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing catalog.
    Info {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Display the application-category taxonomy as an indented tree.
    Categories {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Load a pre-seeded category hierarchy from a YAML file.
    SeedCategories {
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the YAML document (nested mapping of category names).
        #[arg(long)]
        file: String,
    },

    /// Catalog a project from an externally gathered metrics file.
    AddProject {
        #[arg(long, default_value = ".")]
        root: String,

        /// Source URL of the project; the catalog identity.
        #[arg(long)]
        url: String,

        /// Path to the metrics JSON produced by the gathering collaborators.
        #[arg(long)]
        metrics: String,

        /// Comma-separated category names to attach.
        #[arg(long)]
        categories: Option<String>,
    },

    /// List all cataloged projects.
    ListProjects {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        json: bool,
    },

    /// Advance a project's analysis status (forward only).
    SetStatus {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        url: String,

        /// One of: unanalyzed, presence-only, fully-analyzed.
        #[arg(long)]
        status: String,
    },

    /// Associate categories with an existing project.
    AttachCategories {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        url: String,

        /// Comma-separated category names.
        #[arg(long)]
        categories: String,
    },

    /// Register an instruction, optionally with a reference test case.
    AddInstruction {
        #[arg(long, default_value = ".")]
        root: String,

        /// The instruction text, e.g. "lock xadd".
        #[arg(long)]
        instr: String,

        /// Path to a file holding the reference test case.
        #[arg(long)]
        testcase: Option<String>,
    },

    /// List all cataloged instructions.
    ListInstructions {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        json: bool,
    },

    /// Register an ordered instruction sequence, e.g. "mov;lock xadd;jz".
    AddSequence {
        #[arg(long, default_value = ".")]
        root: String,

        /// The raw sequence text; semicolon and comma both separate.
        #[arg(long)]
        instr: String,

        /// Path to a file holding the compound test case.
        #[arg(long)]
        testcase: Option<String>,

        /// Free-text note.
        #[arg(long, default_value = "")]
        note: String,
    },

    /// List all cataloged sequences.
    ListSequences {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        json: bool,
    },

    /// Record that a sequence appears in a file of a project.
    RecordOccurrence {
        #[arg(long, default_value = ".")]
        root: String,

        /// URL of the containing project.
        #[arg(long)]
        url: String,

        /// Path of the file within the project.
        #[arg(long)]
        file_path: String,

        /// The raw sequence text; registered first if not yet cataloged.
        #[arg(long)]
        instr: String,

        /// How often the sequence appears in that file.
        #[arg(long, default_value_t = 1)]
        count: i64,

        /// The source spelled the instructions with raw .byte directives.
        #[arg(long)]
        raw_bytes: bool,
    },

    /// Run the batch integrity pass over the catalog.
    Check {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Print the derived statistics as plain rows.
    Stats {
        #[arg(long, default_value = ".")]
        root: String,

        /// Hide instructions seen in fewer projects than this.
        #[arg(long, default_value_t = 1)]
        min_instruction_count: i64,

        /// Fold categories with fewer projects than this into "misc".
        #[arg(long, default_value_t = 1)]
        min_category_count: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { root, name } => commands::init_command(&root, name),
        Command::Info { root, json } => commands::info_command(&root, json),
        Command::Categories { root } => commands::list_categories_command(&root),
        Command::SeedCategories { root, file } => commands::seed_categories_command(&root, &file),
        Command::AddProject { root, url, metrics, categories } => {
            commands::add_project_command(&root, &url, &metrics, categories)
        }
        Command::ListProjects { root, json } => commands::list_projects_command(&root, json),
        Command::SetStatus { root, url, status } => {
            commands::set_status_command(&root, &url, &status)
        }
        Command::AttachCategories { root, url, categories } => {
            commands::attach_categories_command(&root, &url, &categories)
        }
        Command::AddInstruction { root, instr, testcase } => {
            commands::add_instruction_command(&root, &instr, testcase)
        }
        Command::ListInstructions { root, json } => {
            commands::list_instructions_command(&root, json)
        }
        Command::AddSequence { root, instr, testcase, note } => {
            commands::add_sequence_command(&root, &instr, testcase, &note)
        }
        Command::ListSequences { root, json } => commands::list_sequences_command(&root, json),
        Command::RecordOccurrence { root, url, file_path, instr, count, raw_bytes } => {
            commands::record_occurrence_command(&root, &url, &file_path, &instr, count, raw_bytes)
        }
        Command::Check { root } => commands::check_command(&root),
        Command::Stats { root, min_instruction_count, min_category_count } => {
            commands::stats_command(&root, min_instruction_count, min_category_count)
        }
    }
}
