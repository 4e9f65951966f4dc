// ============================================================
// Layer 5 — Burn Model Backend
// ============================================================
// Implements the domain's ModelBackend / LanguageModel traits
// on top of Burn. This is the only place that owns an optimiser
// or turns tensors into plain Vec<f32>.
//
// Training runs on Autodiff<B>; prediction switches to the inner
// backend via model.valid(), which also turns dropout off so the
// same input always yields the same distribution.
//
// Weight document layers:
//   "embedding" → [weight [vocab, 128]]
//   "hidden"    → [weight [128, 256], bias [256]]
//   "output"    → [weight [256, vocab], bias [vocab]]
//
// Devices:
//   cpu → Autodiff<NdArray>   always available
//   gpu → Autodiff<Wgpu>      probed once; if the probe fails the
//                             session runs on UnavailableBackend
//
// Reference: Burn Book §5 (Training), §3 (Building Blocks)

use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::{AutodiffModule, Param},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::softmax, backend::AutodiffBackend, TensorData},
};

use crate::data::batcher::NextTokenBatcher;
use crate::domain::bits::BitWidth;
use crate::domain::error::BackendError;
use crate::domain::traits::{BatchOutcome, LanguageModel, ModelBackend};
use crate::domain::weights::{LayerWeights, WeightTensor};
use crate::ml::model::{NextTokenConfig, NextTokenModel};

pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;

pub const LAYER_EMBEDDING: &str = "embedding";
pub const LAYER_HIDDEN:    &str = "hidden";
pub const LAYER_OUTPUT:    &str = "output";

pub type CpuBackend = Autodiff<NdArray>;
pub type GpuBackend = Autodiff<Wgpu>;

// The optimiser's concrete type depends on the Burn version; the
// model only needs "take a model and gradients, return a model".
type OptimStep<B> = Box<dyn FnMut(f64, NextTokenModel<B>, GradientsParams) -> NextTokenModel<B>>;

fn adam_step<B: AutodiffBackend>() -> OptimStep<B> {
    let mut optim = AdamConfig::new().init::<B, NextTokenModel<B>>();
    Box::new(move |lr, model, grads| optim.step(lr, model, grads))
}

// ─── BurnModel ────────────────────────────────────────────────────────────────
pub struct BurnModel<B: AutodiffBackend> {
    net:           NextTokenModel<B>,
    step:          OptimStep<B>,
    batcher:       NextTokenBatcher<B>,
    device:        B::Device,
    learning_rate: f64,
    vocab_size:    usize,
}

impl<B: AutodiffBackend> BurnModel<B> {
    fn check_id(&self, id: u32) -> Result<(), BackendError> {
        if id as usize >= self.vocab_size {
            return Err(BackendError::TokenOutOfRange { id, vocab_size: self.vocab_size });
        }
        Ok(())
    }

    fn expected_shapes(&self, layer: &str) -> Option<Vec<Vec<usize>>> {
        let [vocab, embed] = self.net.embedding.weight.val().dims();
        let [_, hidden]    = self.net.hidden.weight.val().dims();
        match layer {
            LAYER_EMBEDDING => Some(vec![vec![vocab, embed]]),
            LAYER_HIDDEN    => Some(vec![vec![embed, hidden], vec![hidden]]),
            LAYER_OUTPUT    => Some(vec![vec![hidden, vocab], vec![vocab]]),
            _ => None,
        }
    }

    fn tensor<const D: usize>(&self, w: &WeightTensor) -> Tensor<B, D> {
        Tensor::from_data(TensorData::new(w.data.clone(), w.shape.clone()), &self.device)
    }
}

fn to_weight<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<WeightTensor, BackendError> {
    let shape = t.dims().to_vec();
    let data  = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| BackendError::Tensor(format!("{e:?}")))?;
    Ok(WeightTensor::new(shape, data))
}

fn linear_weights<B: Backend>(layer: &burn::nn::Linear<B>) -> Result<Vec<WeightTensor>, BackendError> {
    let mut out = vec![to_weight(layer.weight.val())?];
    if let Some(bias) = &layer.bias {
        out.push(to_weight(bias.val())?);
    }
    Ok(out)
}

impl<B: AutodiffBackend> LanguageModel for BurnModel<B> {
    fn train_on_batch(&mut self, inputs: &[u32], targets: &[u32]) -> Result<BatchOutcome, BackendError> {
        if inputs.len() != targets.len() {
            return Err(BackendError::BatchMismatch { inputs: inputs.len(), targets: targets.len() });
        }
        if inputs.is_empty() {
            return Err(BackendError::Tensor("empty batch".into()));
        }
        for &id in inputs.iter().chain(targets) {
            self.check_id(id)?;
        }

        // Everything tensor-shaped below is dropped at the end of this call.
        let batch = self.batcher.batch(inputs, targets);
        let out   = self.net.forward_step(batch.inputs, batch.targets);

        let loss: f64 = out.loss.clone().into_scalar().elem::<f64>();
        let grads = out.loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.net);
        self.net  = (self.step)(self.learning_rate, self.net.clone(), grads);

        Ok(BatchOutcome { loss, accuracy: Some(out.accuracy) })
    }

    fn predict(&self, input: u32) -> Result<Vec<f32>, BackendError> {
        self.check_id(input)?;

        let net    = self.net.valid();
        let tokens = Tensor::<B::InnerBackend, 1, Int>::from_ints([input as i32].as_slice(), &self.device)
            .reshape([1, 1]);
        let probs  = softmax(net.forward(tokens), 1);

        probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| BackendError::Tensor(format!("{e:?}")))
    }

    fn num_params(&self) -> usize {
        self.net.num_params()
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn export_weights(&self) -> Result<LayerWeights, BackendError> {
        let mut weights = LayerWeights::new();
        weights.insert(LAYER_EMBEDDING.into(), vec![to_weight(self.net.embedding.weight.val())?]);
        weights.insert(LAYER_HIDDEN.into(), linear_weights(&self.net.hidden)?);
        weights.insert(LAYER_OUTPUT.into(), linear_weights(&self.net.output)?);
        Ok(weights)
    }

    fn import_weights(&mut self, weights: &LayerWeights) -> Result<(), BackendError> {
        // Validate everything first so a bad layer leaves the model untouched.
        for (layer, tensors) in weights {
            let Some(expected) = self.expected_shapes(layer) else {
                tracing::debug!("Ignoring unknown layer '{}' in weight document", layer);
                continue;
            };
            if tensors.len() != expected.len() {
                return Err(BackendError::TensorCount {
                    layer:    layer.clone(),
                    expected: expected.len(),
                    found:    tensors.len(),
                });
            }
            for (t, shape) in tensors.iter().zip(&expected) {
                t.validate(layer, shape)?;
            }
        }

        let mut net = self.net.clone();
        if let Some(t) = weights.get(LAYER_EMBEDDING) {
            net.embedding.weight = Param::from_tensor(self.tensor::<2>(&t[0]));
        }
        if let Some(t) = weights.get(LAYER_HIDDEN) {
            net.hidden.weight = Param::from_tensor(self.tensor::<2>(&t[0]));
            net.hidden.bias   = Some(Param::from_tensor(self.tensor::<1>(&t[1])));
        }
        if let Some(t) = weights.get(LAYER_OUTPUT) {
            net.output.weight = Param::from_tensor(self.tensor::<2>(&t[0]));
            net.output.bias   = Some(Param::from_tensor(self.tensor::<1>(&t[1])));
        }

        self.net = net;
        // Parameter ids changed, so the old moment estimates no longer apply.
        self.step = adam_step::<B>();
        Ok(())
    }
}

// ─── BurnBackend ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BurnBackend<B: AutodiffBackend> {
    device:        B::Device,
    label:         String,
    learning_rate: f64,
}

impl<B: AutodiffBackend> BurnBackend<B> {
    pub fn new(device: B::Device, label: impl Into<String>) -> Self {
        Self { device, label: label.into(), learning_rate: DEFAULT_LEARNING_RATE }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

impl BurnBackend<CpuBackend> {
    pub fn cpu() -> Self {
        Self::new(NdArrayDevice::Cpu, "CPU (NdArray)")
    }
}

impl BurnBackend<GpuBackend> {
    pub fn gpu() -> Self {
        Self::new(WgpuDevice::default(), "GPU (WGPU)")
    }
}

impl<B: AutodiffBackend> ModelBackend for BurnBackend<B> {
    type Model = BurnModel<B>;

    fn device_label(&self) -> String {
        self.label.clone()
    }

    fn create_model(&self, vocab_size: usize, bits: BitWidth) -> Result<BurnModel<B>, BackendError> {
        if vocab_size == 0 {
            return Err(BackendError::Tensor("vocabulary size must be positive".into()));
        }

        let net: NextTokenModel<B> = NextTokenConfig::new(vocab_size).init(&self.device);
        tracing::info!(
            "Model ready on {}: vocab={}, params={}, bits={} (reported only)",
            self.label,
            vocab_size,
            net.num_params(),
            bits
        );

        Ok(BurnModel {
            net,
            step:          adam_step::<B>(),
            batcher:       NextTokenBatcher::new(self.device.clone()),
            device:        self.device.clone(),
            learning_rate: self.learning_rate,
            vocab_size,
        })
    }
}

// ─── Unavailable backend ──────────────────────────────────────────────────────
/// Used when the requested device cannot run tensors. The session
/// still works for everything that doesn't touch a model.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// No value of this type can exist.
#[derive(Debug)]
pub enum NoModel {}

impl LanguageModel for NoModel {
    fn train_on_batch(&mut self, _: &[u32], _: &[u32]) -> Result<BatchOutcome, BackendError> {
        match *self {}
    }
    fn predict(&self, _: u32) -> Result<Vec<f32>, BackendError> {
        match *self {}
    }
    fn num_params(&self) -> usize {
        match *self {}
    }
    fn vocab_size(&self) -> usize {
        match *self {}
    }
    fn export_weights(&self) -> Result<LayerWeights, BackendError> {
        match *self {}
    }
    fn import_weights(&mut self, _: &LayerWeights) -> Result<(), BackendError> {
        match *self {}
    }
}

impl ModelBackend for UnavailableBackend {
    type Model = NoModel;

    fn device_label(&self) -> String {
        "unavailable".to_string()
    }

    fn is_available(&self) -> bool {
        false
    }

    fn create_model(&self, _: usize, _: BitWidth) -> Result<NoModel, BackendError> {
        Err(BackendError::Unavailable(self.reason.clone()))
    }
}

/// Run one tiny tensor op on the default WGPU device. Adapter
/// failures surface as panics inside wgpu, so they are caught here.
pub fn probe_gpu() -> bool {
    let ok = catch_quietly(|| {
        let device = WgpuDevice::default();
        let t = Tensor::<Wgpu, 1>::ones([1], &device);
        t.into_data()
    })
    .is_some();

    if ok {
        tracing::info!("WGPU backend ready");
    } else {
        tracing::warn!("WGPU backend failed to initialise");
    }
    ok
}

/// `catch_unwind` with the panic hook silenced for the duration,
/// so a caught panic prints nothing to stderr.
fn catch_quietly<T>(f: impl FnOnce() -> T + std::panic::UnwindSafe) -> Option<T> {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(f);
    std::panic::set_hook(previous);
    result.ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::prepare_dataset;
    use crate::data::tokenizer::WordTokenizer;
    use crate::ml::trainer::{TrainingDriver, TrainingOptions};
    use rand::{rngs::StdRng, SeedableRng};

    fn model(vocab: usize) -> BurnModel<CpuBackend> {
        BurnBackend::cpu().create_model(vocab, BitWidth::Eight).unwrap()
    }

    #[test]
    fn test_predict_is_a_distribution() {
        let m     = model(12);
        let probs = m.predict(5).unwrap();
        assert_eq!(probs.len(), 12);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let m = model(12);
        assert_eq!(m.predict(3).unwrap(), m.predict(3).unwrap());
    }

    #[test]
    fn test_out_of_range_ids_rejected() {
        let mut m = model(6);
        assert!(matches!(m.predict(6), Err(BackendError::TokenOutOfRange { id: 6, .. })));
        assert!(m.train_on_batch(&[1, 9], &[2, 3]).is_err());
        assert!(matches!(
            m.train_on_batch(&[1, 2], &[3]),
            Err(BackendError::BatchMismatch { .. })
        ));
    }

    #[test]
    fn test_training_lowers_loss() {
        let mut m = BurnBackend::cpu()
            .with_learning_rate(1e-2)
            .create_model(8, BitWidth::ThirtyTwo)
            .unwrap();
        let inputs  = [4u32, 5, 6, 4, 5, 6];
        let targets = [5u32, 6, 7, 5, 6, 7];
        let first = m.train_on_batch(&inputs, &targets).unwrap();
        let mut last = first;
        for _ in 0..100 {
            last = m.train_on_batch(&inputs, &targets).unwrap();
        }
        assert!(last.loss < first.loss);
        assert!(last.accuracy.is_some());
    }

    #[test]
    fn test_export_shapes() {
        let w = model(9).export_weights().unwrap();
        assert_eq!(w[LAYER_EMBEDDING][0].shape, vec![9, 128]);
        assert_eq!(w[LAYER_HIDDEN][0].shape, vec![128, 256]);
        assert_eq!(w[LAYER_HIDDEN][1].shape, vec![256]);
        assert_eq!(w[LAYER_OUTPUT][0].shape, vec![256, 9]);
        assert_eq!(w[LAYER_OUTPUT][1].shape, vec![9]);
    }

    #[test]
    fn test_weight_round_trip_reproduces_predictions() {
        // 50-word vocabulary, trained briefly so weights are not just init
        let words: Vec<String> = (0..46).map(|i| format!("w{i}")).collect();
        let text  = words.join(" ");
        let mut tokenizer = WordTokenizer::new();
        tokenizer.fit(&[text.as_str()], 1);
        assert_eq!(tokenizer.vocab_size(), 50);

        let backend     = BurnBackend::cpu();
        let mut trained = backend.create_model(50, BitWidth::Sixteen).unwrap();
        let dataset     = prepare_dataset(&tokenizer, &[text.as_str()], 20);
        let mut rng     = StdRng::seed_from_u64(11);
        TrainingDriver::new()
            .run(&mut trained, &dataset, TrainingOptions { epochs: 2, batch_size: 8 }, &mut rng, &mut ())
            .unwrap();

        let mut restored = backend.create_model(50, BitWidth::Sixteen).unwrap();
        restored.import_weights(&trained.export_weights().unwrap()).unwrap();

        for id in [0u32, 4, 17, 49] {
            assert_eq!(trained.predict(id).unwrap(), restored.predict(id).unwrap());
        }
    }

    #[test]
    fn test_missing_layers_keep_fresh_values_and_unknown_are_ignored() {
        let source = model(7);
        let mut target = model(7);
        let before_output = target.export_weights().unwrap()[LAYER_OUTPUT].clone();

        let mut partial = LayerWeights::new();
        partial.insert(LAYER_EMBEDDING.into(), source.export_weights().unwrap()[LAYER_EMBEDDING].clone());
        partial.insert("dense_99".into(), vec![WeightTensor::new(vec![1], vec![0.0])]);
        target.import_weights(&partial).unwrap();

        let after = target.export_weights().unwrap();
        assert_eq!(after[LAYER_EMBEDDING], source.export_weights().unwrap()[LAYER_EMBEDDING]);
        assert_eq!(after[LAYER_OUTPUT], before_output);
    }

    #[test]
    fn test_shape_mismatch_leaves_model_untouched() {
        let mut target = model(7);
        let before     = target.export_weights().unwrap();
        let other      = model(8).export_weights().unwrap();

        let err = target.import_weights(&other).unwrap_err();
        assert!(matches!(err, BackendError::ShapeMismatch { .. }));
        assert_eq!(target.export_weights().unwrap(), before);
    }

    #[test]
    fn test_unavailable_backend_refuses_models() {
        let backend = UnavailableBackend::new("no adapter");
        assert!(!backend.is_available());
        assert_eq!(backend.device_label(), "unavailable");
        assert!(matches!(
            backend.create_model(10, BitWidth::Eight),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn test_catch_quietly_turns_panic_into_none() {
        assert_eq!(catch_quietly(|| 3), Some(3));
        assert_eq!(catch_quietly(|| -> u32 { panic!("no adapter") }), None);
        // a later caught panic still unwinds normally
        assert!(std::panic::catch_unwind(|| -> u32 { panic!("again") }).is_err());
    }
}
