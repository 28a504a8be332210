//! Command line tool to trigger training

use anyhow::anyhow;
use burn::{config::Config as _, train::TrainingInterrupter};
use burn_text_rnn::{
    backend::{default_device, TrainingBackend},
    cli::{datasets::Dataset, models::Model, pipelines::Pipeline},
    datasets::{csv_corpus, toy, Document, LoadableDataset},
    embeddings::{EmbeddingProvider, MissPolicy, WordVectors},
    pipelines::text_classification::{self, Artifact, Optimizer},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train PIPELINE DATASET [OPTIONS]

Arguments:
  PIPELINE               The pipeline to use (e.g., 'text-classification')
  DATASET                The dataset to use ('toy' or 'csv')

Options:
  -h, --help             Print help
  -m, --model            The model preset to use (mean, bag, rnn, lstm, bilstm, stacked-lstm)
  -d, --data-dir         The path to the top-level data directory (defaults to 'data')
  -n, --num-epochs       Number of epochs to train for
  -b, --batch-size       Batch size
  -l, --learning-rate    Learning rate
  --optimizer            'sgd' or 'adam'
  --seed                 Seed for initialization and batch order
  --max-seq-length       Keep at most this many tokens per document
  --embeddings           Path to pre-trained word vectors (GloVe / word2vec text format)
  --zero-misses          Start tokens missing from the word vectors at zero instead of random
  --freeze-embeddings    Keep the embedding table fixed during training
";

#[derive(Debug)]
struct Args {
    pipeline: String,
    dataset: String,
    model: Option<String>,
    data_dir: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f64>,
    optimizer: Option<String>,
    seed: Option<u64>,
    max_seq_length: Option<usize>,
    embeddings: Option<String>,
    zero_misses: bool,
    freeze_embeddings: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            learning_rate: pargs.opt_value_from_str(["-l", "--learning-rate"])?,
            optimizer: pargs.opt_value_from_str("--optimizer")?,
            seed: pargs.opt_value_from_str("--seed")?,
            max_seq_length: pargs.opt_value_from_str("--max-seq-length")?,
            embeddings: pargs.opt_value_from_str("--embeddings")?,
            zero_misses: pargs.contains("--zero-misses"),
            freeze_embeddings: pargs.contains("--freeze-embeddings"),
            pipeline: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
                _ => anyhow!("{}", e),
            })?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;

    let model = if let Some(model) = &args.model {
        Model::try_from(model.as_str())?
    } else {
        pipeline.default_model()
    };

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    match pipeline {
        Pipeline::TextClassification => match dataset {
            Dataset::Toy => handle_text_classification::<toy::Dataset>(dataset, model, args).await,
            Dataset::Csv => {
                handle_text_classification::<csv_corpus::Dataset>(dataset, model, args).await
            }
        },
    }
}

async fn handle_text_classification<D>(
    dataset: Dataset,
    model: Model,
    args: Args,
) -> anyhow::Result<()>
where
    D: LoadableDataset<Document> + Send + 'static,
{
    let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());
    let dataset_dir = format!("{}/datasets/{}", data_dir, dataset);

    let train = D::load(&dataset_dir, "train").await?;
    let test = match D::load(&dataset_dir, "test").await {
        Ok(test) => Some(test),
        Err(e) => {
            log::warn!("No test split available, skipping evaluation: {}", e);
            None
        }
    };

    let mut config = text_classification::Config::new(
        model.to_string(),
        dataset.to_string(),
        train.labels(),
    )
    .with_data_dir(data_dir)
    .with_encoder(model.encoder())
    .with_max_seq_length(args.max_seq_length)
    .with_freeze_embeddings(args.freeze_embeddings);

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }

    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(optimizer) = &args.optimizer {
        config.optimizer = match optimizer.to_lowercase().as_str() {
            "sgd" => Optimizer::Sgd,
            "adam" => Optimizer::Adam,
            _ => return Err(anyhow!("Unknown optimizer: {}", optimizer)),
        };
    }

    if args.zero_misses {
        config.miss_policy = MissPolicy::Zero;
    }

    let vectors = match &args.embeddings {
        Some(path) => {
            let vectors = WordVectors::load(path).await?;
            config.encoder.embed_dim = vectors.dimension();

            Some(vectors)
        }
        None => None,
    };

    let interrupter = TrainingInterrupter::new();

    {
        let interrupter = interrupter.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping after the current batch");
                interrupter.stop();
            }
        });
    }

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let device = default_device();

        let outcome = text_classification::train::<TrainingBackend, Document, D>(
            &device,
            &train,
            &config,
            vectors.as_ref().map(|v| v as &dyn EmbeddingProvider),
            &interrupter,
        )?;

        if let Some(test) = test {
            let evaluation =
                text_classification::evaluate_outcome(&outcome, test, config.batch_size)?;

            log::info!(
                "Test accuracy {:.3}, loss {:.4} over {} documents",
                evaluation.accuracy,
                evaluation.loss,
                evaluation.documents
            );
        }

        if outcome.interrupted {
            log::warn!("Saving the model as of the last completed batch");
        }

        // Save the trained model and the configuration
        let artifact_dir = config.artifact_dir();

        Artifact::from_outcome(outcome, &config.model_name).save(&artifact_dir)?;

        config
            .save(format!("{artifact_dir}/config.json"))
            .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

        println!("Saved classifier to {artifact_dir}");

        Ok(())
    })
    .await?
}
