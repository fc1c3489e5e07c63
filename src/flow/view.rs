use minijinja::{Environment, context};
use serde::Serialize;

use super::{ACCEPTED_EXTENSIONS, Classified};
use crate::db::PredictionRecord;

/// What the result area shows for this request.
#[derive(Debug)]
pub enum Outcome {
    Idle,
    Classified {
        classified: Classified,
        preview: String,
        saved: bool,
    },
    Failed(String),
}

#[derive(Debug)]
pub enum History {
    Records(Vec<PredictionRecord>),
    Unavailable,
}

#[derive(Serialize)]
struct ResultCard<'a> {
    filename: &'a str,
    label: &'a str,
    confidence: String,
    progress: u8,
    preview: &'a str,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    filename: &'a str,
    emotion: &'a str,
    confidence: String,
    recorded_at: &'a str,
}

pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", include_str!("../../templates/index.html"))?;
    Ok(env)
}

pub fn render_page(
    env: &Environment<'_>,
    outcome: &Outcome,
    history: &History,
) -> Result<String, minijinja::Error> {
    let (result, error, storage_error) = match outcome {
        Outcome::Idle => (None, None, false),
        Outcome::Classified {
            classified,
            preview,
            saved,
        } => {
            let card = ResultCard {
                filename: &classified.filename,
                label: &classified.emotion_label,
                confidence: classified.confidence_display(),
                progress: classified.progress(),
                preview,
            };
            (Some(card), None, !saved)
        }
        Outcome::Failed(message) => (None, Some(message.as_str()), false),
    };

    let (rows, history_unavailable) = match history {
        History::Records(records) => (
            records
                .iter()
                .map(|r| HistoryRow {
                    filename: &r.filename,
                    emotion: &r.emotion_label,
                    confidence: format!("{:.2}%", r.confidence_percentage),
                    recorded_at: &r.recorded_at,
                })
                .collect::<Vec<_>>(),
            false,
        ),
        History::Unavailable => (Vec::new(), true),
    };

    let accept = ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    env.get_template("index.html")?.render(context! {
        accept => accept,
        result => result,
        error => error,
        storage_error => storage_error,
        history => rows,
        history_unavailable => history_unavailable,
    })
}
