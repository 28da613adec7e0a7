// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use nextstep::app_config::{self, Config};
use nextstep::database::connection::DatabaseConnection;
use nextstep::{
    seed, Gpa, Repository, Student, StudentFilter, StudentListing, StudentRecord,
    StudentsController,
};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the schema and seed users and students into an empty store
    Init,

    /// List students, optionally filtered
    List {
        /// Case-insensitive part of the first name
        #[arg(long)]
        first: Option<String>,

        /// Exact major
        #[arg(long)]
        major: Option<String>,

        /// Only students with a GPA above this
        #[arg(long, value_parser = parse_gpa)]
        min_gpa: Option<Gpa>,
    },

    /// Show one student with comments
    Show {
        id: i64,
    },

    /// Add a student
    Add(NewStudentArgs),

    /// Change fields of an existing student
    Edit {
        id: i64,

        #[command(flatten)]
        changes: EditStudentArgs,
    },

    /// Delete a student and its comments
    Delete {
        id: i64,
    },

    /// Manage recruiter comments
    Comment {
        #[command(subcommand)]
        action: CommentCommands,
    },

    /// Generate shell completions for nextstep
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CommentCommands {
    /// Comment on a student as the given recruiter
    Add {
        student_id: i64,

        /// Recruiter email
        #[arg(long, env = "NEXTSTEP_USER")]
        user: String,

        /// Recruiter password
        #[arg(long, env = "NEXTSTEP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Comment text
        text: String,
    },

    /// Delete a comment
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct NewStudentArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Expected graduation (YYYY-MM-DD or M/D/YYYY)
    #[arg(long, value_parser = parse_date)]
    graduation: NaiveDate,

    #[arg(long, default_value = "")]
    major: String,

    #[arg(long, value_parser = parse_gpa, default_value = "0")]
    gpa: Gpa,
}

#[derive(Args, Debug)]
struct EditStudentArgs {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    /// Expected graduation (YYYY-MM-DD or M/D/YYYY)
    #[arg(long, value_parser = parse_date)]
    graduation: Option<NaiveDate>,

    #[arg(long)]
    major: Option<String>,

    #[arg(long, value_parser = parse_gpa)]
    gpa: Option<Gpa>,
}

impl EditStudentArgs {
    fn apply(self, mut record: StudentRecord) -> StudentRecord {
        if let Some(first_name) = self.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            record.last_name = last_name;
        }
        if let Some(graduation) = self.graduation {
            record.expected_graduation = graduation;
        }
        if let Some(major) = self.major {
            record.major = major;
        }
        if let Some(gpa) = self.gpa {
            record.gpa = gpa;
        }
        record
    }
}

/// NextStep - Student Recruiting Records
///
/// Browse, filter, edit and comment on student profiles from the terminal.
#[derive(Parser, Debug)]
#[command(name = "nextstep")]
#[command(author = "NextStep Team")]
#[command(version)]
#[command(about = "Student recruiting records")]
#[command(long_about = "NextStep keeps student profiles and recruiter comments in a local SQLite store.

EXAMPLES:
    nextstep init                                   # Create and seed the store
    nextstep list --major 'Computer Science'        # Filter by major
    nextstep list --first ann --min-gpa 3.5         # Name contains 'ann', GPA above 3.5
    nextstep show 4                                 # Profile with comments
    nextstep edit 4 --gpa 3.60                      # Change one field
    nextstep comment add 4 --user me@example.com 'Great interview'
    nextstep completions bash > nextstep.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. --database (or NEXTSTEP_DATABASE) overrides
    the configured database path; ':memory:' gives a throwaway store.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: String,

    /// Database file, overrides the configured path
    #[arg(short, long, env = "NEXTSTEP_DATABASE", global = true)]
    database: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

fn parse_gpa(value: &str) -> Result<Gpa, String> {
    value.parse::<Gpa>().map_err(|e| e.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    seed::parse_graduation(value).ok_or_else(|| format!("Invalid date: {}", value))
}

// @struct: Custom logger implementation
// Filtering follows log::max_level so the level can change after init
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "⚠️ "),
            Level::Info => ("\x1B[1;32m", ""),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}{}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; the configured level is applied once config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "nextstep", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level((&level).into());
    }

    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(database) = &cli.database {
        config.database.path = database.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    log::set_max_level((&config.log_level).into());

    let db_path = config.database.resolved_path()?;
    let repository = Repository::new(DatabaseConnection::open(&db_path)?);

    run_command(cli.command, &config, repository).await
}

async fn run_command(command: Commands, config: &Config, repository: Repository) -> Result<()> {
    match command {
        Commands::Init => {
            let report = seed::initialize(&repository, &config.seed).await?;
            if report.is_noop() {
                info!("Store already initialised, nothing to seed");
            }
            println!("{}", repository.connection().stats()?);
        }
        Commands::List { first, major, min_gpa } => {
            let controller = StudentsController::new(repository);
            let filter = StudentFilter {
                first_name: first,
                major,
                minimum_gpa: min_gpa.unwrap_or_default(),
            };
            let listing = controller.index(&filter).await?;
            print_listing(&listing);
        }
        Commands::Show { id } => {
            let controller = StudentsController::new(repository);
            let student = controller.details(id).await?;
            print_student(&student);
        }
        Commands::Add(args) => {
            let controller = StudentsController::new(repository);
            let record = StudentRecord::new(args.first_name, args.last_name)
                .with_major(args.major)
                .with_gpa(args.gpa)
                .graduating(args.graduation);
            let student = controller.create(&record).await?;
            println!("Created student {}", student.id);
        }
        Commands::Edit { id, changes } => {
            let controller = StudentsController::new(repository);
            let current = controller.details(id).await?;
            let record = changes.apply(current.to_record());
            let saved = controller.edit(id, &record).await?;
            if saved.version > current.version {
                println!("Updated student {} (version {})", id, saved.version);
            } else {
                warn!("Student {} was changed or removed by someone else; edit not applied", id);
            }
        }
        Commands::Delete { id } => {
            let controller = StudentsController::new(repository);
            controller.delete(id).await?;
            println!("Deleted student {}", id);
        }
        Commands::Comment { action } => match action {
            CommentCommands::Add { student_id, user, password, text } => {
                let author = repository
                    .verify_credentials(&user, &password)
                    .await?
                    .ok_or_else(|| anyhow!("Invalid email or password"))?;
                let controller = StudentsController::new(repository);
                let comment = controller.add_comment(student_id, &text, &author).await?;
                println!("Added comment {} to student {}", comment.id, student_id);
            }
            CommentCommands::Delete { id } => {
                let controller = StudentsController::new(repository);
                if controller.delete_comment(id).await? {
                    println!("Deleted comment {}", id);
                } else {
                    println!("Comment {} not found, nothing deleted", id);
                }
            }
        },
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn print_listing(listing: &StudentListing) {
    println!(
        "{:>5}  {:<24} {:<26} {:>5}  {}",
        "ID", "Name", "Major", "GPA", "Graduation"
    );
    for student in &listing.students {
        println!(
            "{:>5}  {:<24} {:<26} {:>5}  {}",
            student.id,
            student.full_name(),
            student.major,
            student.gpa.to_string(),
            student.graduation_formatted()
        );
    }
    println!();
    println!("{} student(s)", listing.students.len());
    if !listing.majors.is_empty() {
        println!("Majors: {}", listing.majors.join(", "));
    }
}

fn print_student(student: &Student) {
    println!("{} (#{})", student.full_name(), student.id);
    println!("  Major:      {}", student.major);
    println!("  GPA:        {}", student.gpa);
    println!("  Graduation: {}", student.graduation_formatted());
    println!("  Version:    {}", student.version);

    if student.comments.is_empty() {
        println!("  No comments");
        return;
    }

    println!("  Comments:");
    for comment in &student.comments {
        println!(
            "    [{}] #{} {}: {}",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.id,
            comment.author.display_name(),
            comment.text
        );
    }
}
