use burn::{
    module::{Module, Param},
    nn::{loss::CrossEntropyLossConfig, Linear},
    tensor::{activation::softmax, backend::Backend, Tensor},
    train::ClassificationOutput,
};

use crate::{
    embeddings::{embedding_table, Coverage, EmbeddingProvider, MissPolicy, INIT_BOUND},
    error::{Error, Result},
    pipelines::text_classification::batcher::{Infer, Train},
    text::Vocabulary,
    utils::{
        init::Initializer,
        tensors::{param, to_vec},
    },
};

use super::{
    config::{Aggregation, ClassifierConfig},
    embedding::TokenEmbedding,
    encoder::RecurrentEncoder,
};

/// Embeds token ids, aggregates the sequence and projects it onto class logits
#[derive(Module, Debug)]
pub struct SequenceClassifier<B: Backend> {
    /// Token embedding table
    pub embedding: TokenEmbedding<B>,

    /// Recurrent aggregator, absent for pooling
    pub encoder: Option<RecurrentEncoder<B>>,

    /// Projection onto class logits
    pub output: Linear<B>,

    /// Sum instead of average when pooling
    pub sum_pooling: bool,

    /// Size of the aggregated vector
    pub aggregate_size: usize,

    /// Total number of classes
    pub n_classes: usize,
}

impl ClassifierConfig {
    /// Initialize a classifier with random embeddings
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<SequenceClassifier<B>> {
        self.validate()?;

        let mut init = Initializer::new(self.seed);
        let embed_dim = self.encoder.embed_dim;

        let mut table = init.constant(embed_dim, 0.0);
        table.extend(init.uniform((self.vocab_size - 1) * embed_dim, INIT_BOUND));

        Ok(self.build(table, init, device))
    }

    /// Initialize a classifier whose embedding rows come from a pre-trained provider where
    /// available
    pub fn init_with_embeddings<B: Backend>(
        &self,
        device: &B::Device,
        vocab: &Vocabulary,
        provider: &dyn EmbeddingProvider,
        policy: MissPolicy,
    ) -> Result<(SequenceClassifier<B>, Coverage)> {
        self.validate()?;

        if vocab.len() != self.vocab_size {
            return Err(Error::config(format!(
                "vocabulary has {} entries but the classifier expects {}",
                vocab.len(),
                self.vocab_size
            )));
        }

        let mut init = Initializer::new(self.seed);
        let (table, coverage) = embedding_table(
            vocab,
            self.encoder.embed_dim,
            Some(provider),
            policy,
            &mut init,
        )?;

        Ok((self.build(table, init, device), coverage))
    }

    fn build<B: Backend>(
        &self,
        table: Vec<f32>,
        mut init: Initializer,
        device: &B::Device,
    ) -> SequenceClassifier<B> {
        let encoder_config = &self.encoder;

        let embedding =
            TokenEmbedding::from_table(table, self.vocab_size, encoder_config.embed_dim, device);

        let encoder = match encoder_config.aggregation {
            Aggregation::Mean | Aggregation::Sum => None,
            Aggregation::SimpleRnn | Aggregation::Lstm => Some(RecurrentEncoder::new(
                encoder_config.embed_dim,
                encoder_config.hidden_size,
                encoder_config.num_layers,
                encoder_config.bidirectional,
                encoder_config.aggregation == Aggregation::Lstm,
                &mut init,
                device,
            )),
        };

        let aggregate_size = encoder_config.output_size();
        let bound = 1.0 / (aggregate_size as f32).sqrt();

        let output = Linear {
            weight: param(
                init.uniform(aggregate_size * self.num_classes, bound),
                [aggregate_size, self.num_classes],
                device,
            ),
            bias: Some(param(
                init.uniform(self.num_classes, bound),
                [self.num_classes],
                device,
            )),
        };

        SequenceClassifier {
            embedding,
            encoder,
            output,
            sum_pooling: encoder_config.aggregation == Aggregation::Sum,
            aggregate_size,
            n_classes: self.num_classes,
        }
    }
}

/// Define model behavior
impl<B: Backend> SequenceClassifier<B> {
    /// Reduce each row of the batch to a `[batch, aggregate_size]` vector. Padded positions
    /// never contribute, and a zero-width batch aggregates to zeros.
    pub fn aggregate(&self, input: Infer<B>) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input.tokens.dims();

        if seq_len == 0 {
            return Tensor::zeros([batch_size, self.aggregate_size], &input.tokens.device());
        }

        let embedded = self.embedding.forward(input.tokens);

        if let Some(encoder) = &self.encoder {
            return encoder.forward(embedded, input.mask).last;
        }

        let [_, _, embed_dim] = embedded.dims();
        let mask = input.mask.reshape([batch_size, seq_len, 1]);

        let summed = (embedded * mask.clone())
            .sum_dim(1)
            .reshape([batch_size, embed_dim]);

        if self.sum_pooling {
            return summed;
        }

        let counts = mask
            .sum_dim(1)
            .reshape([batch_size, 1])
            .clamp_min(1.0);

        summed / counts
    }

    /// Class logits, `[batch, n_classes]`
    pub fn forward(&self, input: Infer<B>) -> Tensor<B, 2> {
        self.output.forward(self.aggregate(input))
    }

    /// Like `forward`, but first checks every id has a row in the embedding table
    pub fn try_forward(&self, input: Infer<B>) -> Result<Tensor<B, 2>> {
        let rows = self.embedding.num_embeddings() as i64;

        let out_of_range = input
            .tokens
            .clone()
            .into_data()
            .convert::<i64>()
            .value
            .into_iter()
            .find(|id| *id < 0 || *id >= rows);

        if let Some(id) = out_of_range {
            return Err(Error::internal(format!(
                "token id {id} is outside the embedding table ({rows} rows)"
            )));
        }

        Ok(self.forward(input))
    }

    /// Defines forward pass for inference: a probability distribution per row
    pub fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        softmax(self.forward(input), 1)
    }

    /// Defines forward pass for training
    pub fn forward_classification(&self, item: Train<B>) -> ClassificationOutput<B> {
        let output = self.forward(item.input);
        let targets = item.targets;

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Stop gradient updates to the embedding table
    pub fn freeze_embeddings(mut self) -> Self {
        self.embedding = self.embedding.no_grad();
        self
    }

    /// The first non-finite parameter value, if any
    pub fn non_finite_parameter(&self) -> Option<f32> {
        let mut linears = vec![&self.output];

        if let Some(encoder) = &self.encoder {
            for layer in &encoder.layers {
                linears.push(&layer.forward_cell.gates);
                linears.extend(layer.backward_cell.as_ref().map(|cell| &cell.gates));
            }
        }

        non_finite(&self.embedding.weight).or_else(|| {
            linears.into_iter().find_map(|linear| {
                non_finite(&linear.weight).or_else(|| linear.bias.as_ref().and_then(non_finite::<B, 1>))
            })
        })
    }
}

fn non_finite<B: Backend, const D: usize>(param: &Param<Tensor<B, D>>) -> Option<f32> {
    to_vec(param.val()).into_iter().find(|v| !v.is_finite())
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use crate::{
        models::EncoderConfig,
        utils::tensors::{id_grid, mask_grid},
    };

    use super::*;

    type TestBackend = NdArray;

    fn batch(rows: &[Vec<usize>], width: usize) -> Infer<TestBackend> {
        let device = Default::default();

        let ids: Vec<Vec<usize>> = rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, 0);
                row
            })
            .collect();
        let mask: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| (0..width).map(|j| j < row.len()).collect())
            .collect();

        Infer::new(
            id_grid(&ids, width, &device),
            mask_grid(&mask, width, &device),
        )
    }

    fn encoders() -> Vec<EncoderConfig> {
        let base = EncoderConfig::new().with_embed_dim(4).with_hidden_size(5);

        vec![
            base.clone().with_aggregation(Aggregation::Mean),
            base.clone().with_aggregation(Aggregation::Sum),
            base.clone().with_aggregation(Aggregation::SimpleRnn),
            base.clone().with_aggregation(Aggregation::Lstm),
            base.clone()
                .with_aggregation(Aggregation::Lstm)
                .with_bidirectional(true),
            base.clone()
                .with_aggregation(Aggregation::SimpleRnn)
                .with_bidirectional(true)
                .with_num_layers(2),
            base.with_aggregation(Aggregation::Lstm).with_num_layers(3),
        ]
    }

    fn model(encoder: EncoderConfig) -> SequenceClassifier<TestBackend> {
        ClassifierConfig::new(10, 3, encoder)
            .init(&Default::default())
            .unwrap()
    }

    fn assert_close(a: Vec<f32>, b: Vec<f32>) {
        assert_eq!(a.len(), b.len());

        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn aggregation_ignores_trailing_padding() {
        for encoder in encoders() {
            let model = model(encoder.clone());

            let tight = model.aggregate(batch(&[vec![2, 3, 4]], 3));
            let padded = model.aggregate(batch(&[vec![2, 3, 4]], 10));

            assert_eq!(tight.dims(), [1, encoder.output_size()]);
            assert_close(to_vec(tight), to_vec(padded));
        }
    }

    #[test]
    fn short_rows_match_their_unbatched_result() {
        for encoder in encoders() {
            let model = model(encoder);
            let size = model.aggregate_size;

            let alone = to_vec(model.aggregate(batch(&[vec![5, 6]], 2)));
            let together = to_vec(model.aggregate(batch(&[vec![7, 8, 9, 2], vec![5, 6]], 4)));

            assert_close(alone, together[size..].to_vec());
        }
    }

    #[test]
    fn mean_is_sum_over_length() {
        let base = EncoderConfig::new().with_embed_dim(4);
        let mean = model(base.clone().with_aggregation(Aggregation::Mean));
        let sum = model(base.with_aggregation(Aggregation::Sum));

        let averaged = to_vec(mean.aggregate(batch(&[vec![2, 3, 4, 5]], 6)));
        let summed = to_vec(sum.aggregate(batch(&[vec![2, 3, 4, 5]], 6)));

        assert_close(averaged, summed.iter().map(|v| v / 4.0).collect());
    }

    #[test]
    fn zero_width_batches_aggregate_to_zeros() {
        for encoder in encoders() {
            let model = model(encoder);

            let aggregated = to_vec(model.aggregate(batch(&[vec![], vec![]], 0)));

            assert_eq!(aggregated.len(), 2 * model.aggregate_size);
            assert!(aggregated.iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        for encoder in encoders() {
            let model = model(encoder);

            let probabilities = model.infer(batch(&[vec![2, 3], vec![1], vec![]], 2));
            assert_eq!(probabilities.dims(), [3, 3]);

            for row in to_vec(probabilities).chunks(3) {
                assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
                assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
            }
        }
    }

    #[test]
    fn out_of_range_ids_are_internal_errors() {
        let model = model(EncoderConfig::new());

        assert!(model.try_forward(batch(&[vec![2, 9]], 2)).is_ok());
        assert!(matches!(
            model.try_forward(batch(&[vec![2, 10]], 2)),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn same_seed_same_parameters() {
        let encoder = EncoderConfig::new().with_aggregation(Aggregation::Lstm);

        let a = model(encoder.clone());
        let b = model(encoder.clone());
        let c = ClassifierConfig::new(10, 3, encoder)
            .with_seed(43)
            .init::<TestBackend>(&Default::default())
            .unwrap();

        let logits = |m: &SequenceClassifier<TestBackend>| to_vec(m.forward(batch(&[vec![2, 3, 4]], 3)));

        assert_eq!(logits(&a), logits(&b));
        assert_ne!(logits(&a), logits(&c));
        assert_eq!(a.non_finite_parameter(), None);
    }

    #[test]
    fn padding_row_starts_at_zero() {
        let model = model(EncoderConfig::new().with_embed_dim(4));
        let table = to_vec(model.embedding.weight.val());

        assert!(table[..4].iter().all(|v| *v == 0.0));
        assert!(table[4..].iter().any(|v| *v != 0.0));
    }
}
