use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};

use crate::utils::init::Initializer;

use super::cell::{CellState, RecurrentCell};

/// The result of scanning a batch with one or more recurrent layers
#[derive(Clone, Debug)]
pub struct ScanOutput<B: Backend> {
    /// The state at every position, `[batch, seq_len, output_size]`
    pub states: Tensor<B, 3>,

    /// The final state, `[batch, output_size]`
    pub last: Tensor<B, 2>,
}

/// One recurrent layer, optionally bidirectional
#[derive(Module, Debug)]
pub struct RecurrentLayer<B: Backend> {
    /// Scans positions left to right
    pub forward_cell: RecurrentCell<B>,

    /// Scans positions right to left, for bidirectional layers
    pub backward_cell: Option<RecurrentCell<B>>,
}

impl<B: Backend> RecurrentLayer<B> {
    /// Run the layer over `[batch, seq_len, input_size]` inputs with a `[batch, seq_len]` mask
    pub fn forward(&self, inputs: Tensor<B, 3>, mask: Tensor<B, 2>) -> ScanOutput<B> {
        let forward = scan(&self.forward_cell, inputs.clone(), mask.clone(), false);

        match &self.backward_cell {
            None => forward,
            Some(cell) => {
                let backward = scan(cell, inputs, mask, true);

                ScanOutput {
                    states: Tensor::cat(vec![forward.states, backward.states], 2),
                    last: Tensor::cat(vec![forward.last, backward.last], 1),
                }
            }
        }
    }
}

/// Scan a cell over the sequence, skipping padded positions.
///
/// At a position whose mask is 0.0 the carried state passes through unchanged, so trailing
/// padding never reaches the final state in either direction. `states` is always returned in
/// position order.
fn scan<B: Backend>(
    cell: &RecurrentCell<B>,
    inputs: Tensor<B, 3>,
    mask: Tensor<B, 2>,
    reverse: bool,
) -> ScanOutput<B> {
    let [batch_size, seq_len, input_size] = inputs.dims();
    let device = inputs.device();

    let mut state: CellState<B> = cell.initial_state(batch_size, &device);
    let mut states = Vec::with_capacity(seq_len);

    let positions: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..seq_len).rev())
    } else {
        Box::new(0..seq_len)
    };

    for t in positions {
        let input = inputs
            .clone()
            .slice([0..batch_size, t..t + 1, 0..input_size])
            .reshape([batch_size, input_size]);
        let keep = mask.clone().slice([0..batch_size, t..t + 1]);

        let next = cell.step(input, &state);
        state = state.select(next, keep);

        states.push(
            state
                .hidden
                .clone()
                .reshape([batch_size, 1, cell.hidden_size]),
        );
    }

    if reverse {
        states.reverse();
    }

    let states = if states.is_empty() {
        Tensor::zeros([batch_size, 0, cell.hidden_size], &device)
    } else {
        Tensor::cat(states, 1)
    };

    ScanOutput {
        states,
        last: state.hidden,
    }
}

/// A stack of recurrent layers. Each layer reads the per-position states of the one below.
#[derive(Module, Debug)]
pub struct RecurrentEncoder<B: Backend> {
    /// The layers, bottom first
    pub layers: Vec<RecurrentLayer<B>>,
}

impl<B: Backend> RecurrentEncoder<B> {
    /// Create `num_layers` layers of simple or gated cells
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        bidirectional: bool,
        gated: bool,
        init: &mut Initializer,
        device: &B::Device,
    ) -> Self {
        let directions = if bidirectional { 2 } else { 1 };

        let layers = (0..num_layers)
            .map(|i| {
                let layer_input = if i == 0 {
                    input_size
                } else {
                    hidden_size * directions
                };

                let forward_cell =
                    RecurrentCell::new(layer_input, hidden_size, gated, init, device);
                let backward_cell = bidirectional
                    .then(|| RecurrentCell::new(layer_input, hidden_size, gated, init, device));

                RecurrentLayer {
                    forward_cell,
                    backward_cell,
                }
            })
            .collect();

        Self { layers }
    }

    /// Run every layer and return the top layer's output
    pub fn forward(&self, inputs: Tensor<B, 3>, mask: Tensor<B, 2>) -> ScanOutput<B> {
        let [batch_size, _, input_size] = inputs.dims();

        let mut output = ScanOutput {
            last: Tensor::zeros([batch_size, input_size], &inputs.device()),
            states: inputs,
        };

        for layer in &self.layers {
            output = layer.forward(output.states, mask.clone());
        }

        output
    }
}
