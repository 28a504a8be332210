//! Command line tool for inference

use anyhow::{anyhow, Result};
use burn_text_rnn::{
    backend::{default_device, InferenceBackend},
    cli::{datasets::Dataset, models::Model, pipelines::Pipeline},
    pipelines::text_classification::{artifact_dir, infer},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer PIPELINE DATASET [TEXT...] [OPTIONS]

Arguments:
  PIPELINE             The pipeline to use (e.g., 'text-classification')
  DATASET              The dataset the classifier was trained on ('toy' or 'csv')
  TEXT                 Texts to classify (defaults to a few toy samples)

Options:
  -h, --help           Print help
  -m, --model          The model preset to use (e.g., 'lstm')
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The pipeline to use
    pipeline: String,

    /// The dataset the classifier was trained on
    dataset: String,

    /// The model to use
    model: Option<String>,

    /// The top-level data directory
    data_dir: Option<String>,

    /// Texts to classify
    texts: Vec<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    let model = pargs.opt_value_from_str(["-m", "--model"])?;
    let data_dir = pargs.opt_value_from_str(["-d", "--data-dir"])?;

    if help {
        return Ok(Args {
            help,
            pipeline: String::new(),
            dataset: String::new(),
            model,
            data_dir,
            texts: Vec::new(),
        });
    }

    let pipeline = pargs.free_from_str()?;
    let dataset = pargs.free_from_str()?;

    let texts = pargs
        .finish()
        .into_iter()
        .map(|text| text.to_string_lossy().into_owned())
        .collect();

    Ok(Args {
        help,
        pipeline,
        dataset,
        model,
        data_dir,
        texts,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;
    let dataset = Dataset::try_from(args.dataset.as_str())?;

    let model = match &args.model {
        Some(model) => Model::try_from(model.as_str())?,
        None => pipeline.default_model(),
    };

    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());
    let artifact_dir = artifact_dir(&data_dir, &dataset.to_string(), &model.to_string());

    let samples: Vec<(String, Option<&str>)> = if args.texts.is_empty() {
        vec![
            ("what a wonderful day".to_string(), Some("positive")),
            ("the service was rude and awful".to_string(), Some("negative")),
            ("i loved the friendly staff".to_string(), Some("positive")),
            ("a boring and terrible film".to_string(), Some("negative")),
        ]
    } else {
        args.texts.into_iter().map(|text| (text, None)).collect()
    };

    let input: Vec<String> = samples.iter().map(|(text, _)| text.clone()).collect();

    // Get model predictions
    let predictions = infer::<InferenceBackend>(default_device(), &artifact_dir, &input)
        .map_err(|e| anyhow!("Unable to classify with {}: {}", artifact_dir, e))?;

    // Print out predictions for each sample
    for (i, ((text, expected), prediction)) in samples.iter().zip(predictions).enumerate() {
        let class = &prediction.label;
        let confidence = prediction.probabilities[prediction.class_id];

        println!(
            "\n=== Item {i} ===\
             \n- Text: {text}\
             \n- Class: {class} ({confidence:.3})\
             \n- Expected: {}\
             \n================",
            expected.unwrap_or("-")
        );
    }

    Ok(())
}
