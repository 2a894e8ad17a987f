//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use onboard_core::config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(version = "0.1")]
#[command(about = "Employee onboarding courses from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL from config
    #[arg(long, global = true, value_name = "URL", env = config::API_URL_ENV)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget stored credentials
    Logout,
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, default_value = "")]
        email: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Inspect the current session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Show the personal dashboard
    Dashboard,
    /// Manage the onboarding checklist
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Browse and inspect courses
    Courses {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Mark lessons complete or incomplete
    Lesson {
        #[command(subcommand)]
        command: LessonCommands,
    },
    /// Rate a course
    Review {
        #[arg(value_name = "COURSE_ID")]
        course: u64,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// Take a course's final quiz
    Quiz {
        #[command(subcommand)]
        command: QuizCommands,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Staff tools
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Show whether you are logged in
    Show,
    /// Print session changes (including other terminals) until interrupted
    Watch,
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// List checklist items
    List,
    /// Toggle a checklist item
    Toggle {
        #[arg(value_name = "TASK_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum CourseCommands {
    /// List courses
    List {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(short, long, default_value = "")]
        role: String,
        /// not_started, in_progress or completed
        #[arg(long)]
        status: Option<String>,
    },
    /// Search interactively: each line read from stdin is a new query
    Browse {
        #[arg(short, long, default_value = "")]
        role: String,
    },
    /// Show one course with lessons and reviews
    Show {
        #[arg(value_name = "COURSE_ID")]
        id: u64,
        /// Also list modules
        #[arg(long)]
        modules: bool,
    },
}

#[derive(clap::Subcommand)]
enum LessonCommands {
    /// Mark a lesson complete
    Complete {
        #[arg(value_name = "COURSE_ID")]
        course: u64,
        #[arg(value_name = "LESSON_ID")]
        lesson: u64,
    },
    /// Mark a lesson incomplete
    Uncomplete {
        #[arg(value_name = "COURSE_ID")]
        course: u64,
        #[arg(value_name = "LESSON_ID")]
        lesson: u64,
    },
}

#[derive(clap::Subcommand)]
enum QuizCommands {
    /// Show the questions
    Show {
        #[arg(value_name = "COURSE_ID")]
        course: u64,
    },
    /// Submit answers as QUESTION_ID=ANSWER_ID pairs
    Submit {
        #[arg(value_name = "COURSE_ID")]
        course: u64,
        #[arg(short, long = "answer", value_name = "Q=A", value_parser = commands::quiz::parse_answer)]
        answers: Vec<(u64, u64)>,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields; omitted fields keep their value
    Update(commands::profile::UpdateArgs),
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Team progress across courses
    Progress,
    /// Create a course with lessons
    CreateCourse {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        role: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image_url: String,
        /// Lesson as "title|content|video_url" (repeatable)
        #[arg(short, long = "lesson", value_name = "LESSON")]
        lessons: Vec<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the API base URL
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::Config::load().context("load config")?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = url.trim().to_string();
    }

    let _log_guard = logging::init(&config.log);
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli.command, config).await })
}

async fn dispatch(command: Commands, config: config::Config) -> Result<()> {
    // Config commands work without an API or credential store.
    if let Commands::Config { command } = command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        };
    }

    let app = commands::App::new(config)?;

    match command {
        Commands::Login { username, password } => {
            commands::auth::login(&app, &username, password).await
        }
        Commands::Logout => commands::auth::logout(&app),
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&app, username, email, password).await,
        Commands::Session { command } => match command {
            SessionCommands::Show => {
                commands::session::show(&app);
                Ok(())
            }
            SessionCommands::Watch => commands::session::watch(&app).await,
        },

        Commands::Dashboard => commands::dashboard::show(&app).await,
        Commands::Tasks { command } => match command {
            TaskCommands::List => commands::dashboard::tasks(&app).await,
            TaskCommands::Toggle { id } => commands::dashboard::toggle_task(&app, id).await,
        },

        Commands::Courses { command } => match command {
            CourseCommands::List {
                search,
                role,
                status,
            } => commands::courses::list(&app, search, role, status.as_deref()).await,
            CourseCommands::Browse { role } => commands::courses::browse(&app, role).await,
            CourseCommands::Show { id, modules } => {
                commands::courses::show(&app, id, modules).await
            }
        },
        Commands::Lesson { command } => match command {
            LessonCommands::Complete { course, lesson } => {
                commands::courses::set_lesson(&app, course, lesson, true).await
            }
            LessonCommands::Uncomplete { course, lesson } => {
                commands::courses::set_lesson(&app, course, lesson, false).await
            }
        },
        Commands::Review {
            course,
            rating,
            comment,
        } => commands::courses::review(&app, course, rating, &comment).await,

        Commands::Quiz { command } => match command {
            QuizCommands::Show { course } => commands::quiz::show(&app, course).await,
            QuizCommands::Submit { course, answers } => {
                commands::quiz::submit(&app, course, &answers).await
            }
        },

        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile::show(&app).await,
            ProfileCommands::Update(args) => commands::profile::update(&app, args).await,
        },

        Commands::Admin { command } => match command {
            AdminCommands::Progress => commands::admin::progress(&app).await,
            AdminCommands::CreateCourse {
                title,
                role,
                description,
                image_url,
                lessons,
            } => {
                let draft = commands::admin::draft(title, role, description, image_url, &lessons)?;
                commands::admin::create_course(&app, draft).await
            }
        },

        Commands::Config { .. } => Ok(()),
    }
}
