//! `pawsense context` - inspect or seed the persisted assessment context
//!
//! In the app the context is written by the subject-selection and
//! questionnaire screens; here it can be seeded by hand so `assess` sees
//! the same state those screens would have left behind.

use anyhow::{Result, bail};
use clap::{Args, Subcommand, ValueEnum};

use pawsense_core::context::{
    AssessmentContext, ContextStore, FileContextStore, Registration, SubjectKind,
};

use crate::config::PawsenseConfig;

#[derive(Args)]
pub struct ContextArgs {
    #[command(subcommand)]
    command: ContextCommand,
}

#[derive(Subcommand)]
enum ContextCommand {
    /// Print the stored context as JSON
    Show,
    /// Replace the stored context
    Set {
        /// Species of the subject ("cat", "dog", ...)
        #[arg(long)]
        species: String,

        /// Identifier of a registered pet
        #[arg(long)]
        pet_id: Option<String>,

        /// Display name of a registered pet
        #[arg(long)]
        pet_name: Option<String>,

        /// Whether the subject is a registered pet
        #[arg(long, value_enum, default_value = "unknown")]
        registered: RegisteredArg,

        /// Mark the questionnaire as completed
        #[arg(long)]
        questions_done: bool,
    },
    /// Delete the stored context file
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum RegisteredArg {
    Yes,
    No,
    Unknown,
}

impl From<RegisteredArg> for Registration {
    fn from(arg: RegisteredArg) -> Self {
        match arg {
            RegisteredArg::Yes => Registration::Yes,
            RegisteredArg::No => Registration::No,
            RegisteredArg::Unknown => Registration::Unknown,
        }
    }
}

pub async fn run(args: ContextArgs) -> Result<()> {
    let config = PawsenseConfig::load()?;
    let store = FileContextStore::new(&config.config_dir);

    match args.command {
        ContextCommand::Show => match store.get().await? {
            Some(context) => println!("{}", serde_json::to_string_pretty(&context)?),
            None => println!("no assessment context stored"),
        },
        ContextCommand::Set {
            species,
            pet_id,
            pet_name,
            registered,
            questions_done,
        } => {
            let Some(kind) = SubjectKind::from_hint(&species) else {
                bail!("unrecognized species {species:?}; expected a dog or cat synonym");
            };
            let mut context = AssessmentContext::new(kind);
            context.subject_id = pet_id;
            context.subject_name = pet_name;
            context.is_subject_registered = registered.into();
            context.questions_completed = questions_done;
            store.set(context).await?;
            println!("context saved to {}", store.file_path().display());
        }
        ContextCommand::Clear => {
            let path = store.file_path();
            if path.exists() {
                tokio::fs::remove_file(path).await?;
                println!("context cleared");
            } else {
                println!("no assessment context stored");
            }
        }
    }
    Ok(())
}
