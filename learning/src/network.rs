//! Convolutional action-value estimator.

use candle_core::{Module, Result, Tensor};
use candle_nn::{init::Init, Conv2d, Conv2dConfig, Dropout, Linear, VarBuilder};
use zombie_arena_core::{ACTION_COUNT, OBSERVATION_SIDE};

/// `(in_channels, out_channels, kernel, stride, pool_after)` of each conv stage.
const CONV_STAGES: [(usize, usize, usize, usize, bool); 4] = [
    (1, 8, 4, 2, true),
    (8, 16, 4, 2, false),
    (16, 32, 3, 2, true),
    (32, 64, 3, 2, false),
];

const fn conv_output(side: usize, kernel: usize, stride: usize) -> usize {
    (side - kernel) / stride + 1
}

/// Number of features the conv stack produces for one observation.
#[must_use]
pub const fn flattened_features() -> usize {
    let mut side = OBSERVATION_SIDE;
    let mut channels = 1;
    let mut stage = 0;
    while stage < CONV_STAGES.len() {
        let (_, out, kernel, stride, pool) = CONV_STAGES[stage];
        side = conv_output(side, kernel, stride);
        if pool {
            side /= 2;
        }
        channels = out;
        stage += 1;
    }
    channels * side * side
}

/// Maps a batch of `(N, 1, 128, 128)` intensities to `(N, 7)` action values.
#[derive(Debug)]
pub struct QNetwork {
    convs: Vec<(Conv2d, bool)>,
    hidden: Vec<Linear>,
    head: Linear,
    dropout: Dropout,
}

impl QNetwork {
    /// Builds the estimator, registering its parameters under `vb`.
    pub fn new(vb: VarBuilder, hidden_width: usize, dropout_rate: f32) -> Result<Self> {
        let mut convs = Vec::with_capacity(CONV_STAGES.len());
        for (index, (input, output, kernel, stride, pool)) in CONV_STAGES.into_iter().enumerate() {
            let conv = kaiming_conv(
                input,
                output,
                kernel,
                stride,
                vb.pp(format!("conv{}", index + 1)),
            )?;
            convs.push((conv, pool));
        }

        let mut hidden = Vec::with_capacity(3);
        let mut width = flattened_features();
        for index in 0..3 {
            hidden.push(xavier_linear(
                width,
                hidden_width,
                vb.pp(format!("fc{}", index + 1)),
            )?);
            width = hidden_width;
        }
        let head = xavier_linear(width, ACTION_COUNT, vb.pp("head"))?;

        Ok(Self {
            convs,
            hidden,
            head,
            dropout: Dropout::new(dropout_rate),
        })
    }

    /// Evaluates raw `0..=255` intensities. Dropout only applies when `train` is set.
    pub fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let mut xs = xs.affine(1.0 / 255.0, 0.0)?;
        for (conv, pool) in &self.convs {
            xs = conv.forward(&xs)?.relu()?;
            if *pool {
                xs = xs.max_pool2d(2)?;
            }
        }

        let mut xs = xs.flatten_from(1)?;
        let last = self.hidden.len() - 1;
        for (index, layer) in self.hidden.iter().enumerate() {
            xs = layer.forward(&xs)?.relu()?;
            if index < last {
                xs = self.dropout.forward(&xs, train)?;
            }
        }
        self.head.forward(&xs)
    }
}

fn kaiming_conv(
    input: usize,
    output: usize,
    kernel: usize,
    stride: usize,
    vb: VarBuilder,
) -> Result<Conv2d> {
    let fan_in = input * kernel * kernel;
    let weight = vb.get_with_hints(
        (output, input, kernel, kernel),
        "weight",
        Init::Randn {
            mean: 0.0,
            stdev: (2.0 / fan_in as f64).sqrt(),
        },
    )?;
    let bias = vb.get_with_hints(output, "bias", Init::Const(0.0))?;
    let config = Conv2dConfig {
        stride,
        ..Conv2dConfig::default()
    };
    Ok(Conv2d::new(weight, Some(bias), config))
}

fn xavier_linear(input: usize, output: usize, vb: VarBuilder) -> Result<Linear> {
    let weight = vb.get_with_hints(
        (output, input),
        "weight",
        Init::Randn {
            mean: 0.0,
            stdev: (2.0 / (input + output) as f64).sqrt(),
        },
    )?;
    let bias = vb.get_with_hints(output, "bias", Init::Const(0.0))?;
    Ok(Linear::new(weight, Some(bias)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn conv_stack_collapses_to_one_cell() {
        assert_eq!(flattened_features(), 64);
    }

    #[test]
    fn forward_yields_one_value_per_action() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let network = QNetwork::new(vb, 32, 0.2)?;
        let xs = Tensor::zeros((2, 1, OBSERVATION_SIDE, OBSERVATION_SIDE), DType::F32, &device)?;

        let values = network.forward(&xs, false)?;
        assert_eq!(values.dims(), &[2, ACTION_COUNT]);
        // Zero biases and a black frame give zero action values.
        let sum = values.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert_eq!(sum, 0.0);
        Ok(())
    }
}
