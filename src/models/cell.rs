//! Recurrent cells driven one position at a time.
//!
//! Both cell kinds read the concatenation `[x; h]` of the current input and the previous hidden
//! state through a single linear projection. The simple cell applies `tanh` to it. The LSTM
//! cell splits it into four blocks: input gate, forget gate, candidate and output gate.

use burn::{
    module::Module,
    nn::Linear,
    tensor::{activation::sigmoid, backend::Backend, Tensor},
};

use crate::utils::{init::Initializer, tensors::param};

/// The state carried between positions
#[derive(Clone, Debug)]
pub struct CellState<B: Backend> {
    /// Exposed hidden state, `[batch, hidden_size]`
    pub hidden: Tensor<B, 2>,

    /// Persistent cell state of gated cells, `[batch, hidden_size]`
    pub cell: Option<Tensor<B, 2>>,
}

impl<B: Backend> CellState<B> {
    /// Keep `next` where `keep_next` is 1.0 and `self` where it is 0.0.
    ///
    /// `keep_next` is a `[batch, 1]` column of the sequence mask, so padded rows carry their
    /// previous state through unchanged.
    pub fn select(self, next: Self, keep_next: Tensor<B, 2>) -> Self {
        let keep_prev = keep_next.clone().mul_scalar(-1.0).add_scalar(1.0);

        let blend = |prev: Tensor<B, 2>, next: Tensor<B, 2>| {
            next * keep_next.clone() + prev * keep_prev.clone()
        };

        let cell = match (self.cell, next.cell) {
            (Some(prev), Some(next)) => Some(blend(prev, next)),
            _ => None,
        };

        Self {
            hidden: blend(self.hidden, next.hidden),
            cell,
        }
    }
}

/// A simple (Elman) or LSTM cell
#[derive(Module, Debug)]
pub struct RecurrentCell<B: Backend> {
    /// Projection of `[x; h]` onto the gate pre-activations
    pub gates: Linear<B>,

    /// Size of the hidden state
    pub hidden_size: usize,

    /// Whether this is an LSTM cell
    pub gated: bool,
}

impl<B: Backend> RecurrentCell<B> {
    /// Create a cell with weights drawn from `U(-1/sqrt(h), 1/sqrt(h))`. LSTM forget gates
    /// start with a bias of 1.0.
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        gated: bool,
        init: &mut Initializer,
        device: &B::Device,
    ) -> Self {
        let blocks = if gated { 4 } else { 1 };
        let fan_in = input_size + hidden_size;
        let fan_out = blocks * hidden_size;
        let bound = 1.0 / (hidden_size as f32).sqrt();

        let weight = init.uniform(fan_in * fan_out, bound);
        let mut bias = init.uniform(fan_out, bound);

        if gated {
            bias[hidden_size..2 * hidden_size].fill(1.0);
        }

        let gates = Linear {
            weight: param(weight, [fan_in, fan_out], device),
            bias: Some(param(bias, [fan_out], device)),
        };

        Self {
            gates,
            hidden_size,
            gated,
        }
    }

    /// The all-zero state for a batch
    pub fn initial_state(&self, batch_size: usize, device: &B::Device) -> CellState<B> {
        let zeros = || Tensor::zeros([batch_size, self.hidden_size], device);

        CellState {
            hidden: zeros(),
            cell: self.gated.then(zeros),
        }
    }

    /// Advance one position. `input` is `[batch, input_size]`.
    pub fn step(&self, input: Tensor<B, 2>, state: &CellState<B>) -> CellState<B> {
        let [batch_size, _] = input.dims();
        let h = self.hidden_size;

        let z = self
            .gates
            .forward(Tensor::cat(vec![input, state.hidden.clone()], 1));

        if !self.gated {
            return CellState {
                hidden: z.tanh(),
                cell: None,
            };
        }

        let block = |i: usize| z.clone().slice([0..batch_size, i * h..(i + 1) * h]);

        let input_gate = sigmoid(block(0));
        let forget_gate = sigmoid(block(1));
        let candidate = block(2).tanh();
        let output_gate = sigmoid(block(3));

        let previous = state
            .cell
            .clone()
            .unwrap_or_else(|| Tensor::zeros([batch_size, h], &z.device()));

        let cell = forget_gate * previous + input_gate * candidate;
        let hidden = output_gate * cell.clone().tanh();

        CellState {
            hidden,
            cell: Some(cell),
        }
    }
}
