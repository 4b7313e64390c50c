use anyhow::{Context, Result};
use clap::Subcommand;
use dialoguer::Select;

use studyhall_core::CollectionPath;
use studyhall_core::quiz::{QuizQuestion, QuizRun, score};

use crate::app::{App, resolve_id, short_id};

#[derive(Subcommand)]
pub enum QuizAction {
    /// Add a question (the first option is the correct answer)
    Add {
        prompt: String,
        /// Two to four answer options
        #[arg(long = "option", required = true, num_args = 1..)]
        options: Vec<String>,
    },

    /// List authored questions
    List,

    /// Take the quiz interactively and record the score
    Take,

    /// Delete a question
    Rm { id: String },
}

pub async fn run(action: QuizAction) -> Result<()> {
    let app = App::load().await?;
    let identity = app.require_account()?;
    let mut questions = app
        .open_panel::<QuizQuestion>(&identity, CollectionPath::quiz_questions(&identity.uid))
        .await?;

    match action {
        QuizAction::Add { prompt, options } => {
            let question = QuizQuestion::new(prompt, options);
            let record = questions.create(&question).await?;
            println!("Added question {}", short_id(&record.id));
        }
        QuizAction::List => {
            if questions.items().is_empty() {
                println!("No questions yet.");
            }
            for question in questions.items() {
                println!(
                    "{} {} [{}]",
                    short_id(&question.id),
                    question.data.prompt,
                    question.data.options.join(" / "),
                );
            }
        }
        QuizAction::Take => {
            if questions.items().is_empty() {
                println!("No questions to take - add some first.");
                questions.unmount();
                return Ok(());
            }

            let mut answers = Vec::with_capacity(questions.items().len());
            for question in questions.items() {
                let answer = Select::new()
                    .with_prompt(question.data.prompt.clone())
                    .items(&question.data.options)
                    .default(0)
                    .interact()
                    .context("reading answer")?;
                answers.push(answer);
            }

            let result = score(questions.items(), &answers);
            println!(
                "Score: {}/{} ({}%)",
                result.correct,
                result.total,
                result.percent()
            );
            if result.is_high_score() {
                println!("High score - counts toward Quiz Master!");
            }

            let mut runs = app
                .open_panel::<QuizRun>(&identity, CollectionPath::quiz_runs(&identity.uid))
                .await?;
            runs.create(&QuizRun::from(result)).await?;
            runs.unmount();
        }
        QuizAction::Rm { id } => {
            let id = resolve_id(questions.items().iter().map(|q| q.id.as_str()), &id)?;
            questions.delete(&id).await?;
            println!("Removed question {}.", short_id(&id));
        }
    }

    questions.unmount();
    Ok(())
}
